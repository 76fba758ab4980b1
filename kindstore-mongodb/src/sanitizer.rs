//! Field name sanitization for MongoDB.
//!
//! MongoDB reserves dots and dollar signs in field names for path access and operators,
//! and rejects null bytes outright. Entity property names are free-form, so they are
//! escaped on the way in and restored on the way out. Values are stored untouched so that
//! equality predicates compare against exactly what was written.

use bson::{Bson, Document};


/// Escapes and restores field names and collection names.
pub(crate) struct FieldSanitizer;

impl FieldSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Escapes reserved characters in a single name.
    pub(crate) fn sanitize_name(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .fold(input.to_string(), |name, (target, replacement)| name.replace(target, replacement))
    }

    /// Reverts [`sanitize_name`](Self::sanitize_name).
    pub(crate) fn restore_name(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .rev()
            .fold(input.to_string(), |name, (target, replacement)| name.replace(replacement, target))
    }

    /// Escapes every field name in `document`, including nested documents and documents
    /// held in arrays.
    pub(crate) fn sanitize_document(document: &Document) -> Document {
        Self::map_document(document, Self::sanitize_name)
    }

    /// Restores every field name in `document`.
    pub(crate) fn restore_document(document: &Document) -> Document {
        Self::map_document(document, Self::restore_name)
    }

    fn map_document(document: &Document, rename: fn(&str) -> String) -> Document {
        document
            .iter()
            .map(|(k, v)| (rename(k), Self::map_value(v, rename)))
            .collect()
    }

    fn map_value(value: &Bson, rename: fn(&str) -> String) -> Bson {
        match value {
            Bson::Document(doc) => Bson::Document(Self::map_document(doc, rename)),
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(|v| Self::map_value(v, rename))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
