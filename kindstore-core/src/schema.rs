//! Model definitions, the schema registry, and payload projection.
//!
//! The connector never introspects models at runtime. Definitions are loaded once
//! (usually from [`ConnectorSettings`](crate::config::ConnectorSettings)) and handed to
//! the connector through a [`SchemaRegistry`].

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

fn default_id_property() -> String {
    "id".to_string()
}

/// The declared shape of a model: its name, identifier field and property set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// The model name, which is also the store kind.
    pub name: String,
    /// Name of the identifier field on ORM rows.
    #[serde(default = "default_id_property")]
    pub id_property: String,
    /// Declared property names.
    #[serde(default)]
    pub properties: BTreeSet<String>,
}

impl ModelDefinition {
    /// Creates a definition with the default `id` identifier field.
    pub fn new<I, S>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            id_property: default_id_property(),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Replaces the identifier field name.
    pub fn with_id_property(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = id_property.into();
        self
    }

    /// Whether `property` is declared on this model.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains(property)
    }
}

/// Read-only lookup of model definitions.
pub trait SchemaRegistry: Send + Sync + Debug {
    /// Returns the definition for `model`, if one is registered.
    fn model_definition(&self, model: &str) -> Option<&ModelDefinition>;
}

impl<R: SchemaRegistry> SchemaRegistry for &R {
    fn model_definition(&self, model: &str) -> Option<&ModelDefinition> {
        (*self).model_definition(model)
    }
}

impl<R: SchemaRegistry> SchemaRegistry for std::sync::Arc<R> {
    fn model_definition(&self, model: &str) -> Option<&ModelDefinition> {
        (**self).model_definition(model)
    }
}

/// A [`SchemaRegistry`] backed by a map of definitions keyed by model name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any previous one with the same name.
    pub fn register(mut self, definition: ModelDefinition) -> Self {
        self.models.insert(definition.name.clone(), definition);
        self
    }
}

impl FromIterator<ModelDefinition> for ModelRegistry {
    fn from_iter<T: IntoIterator<Item = ModelDefinition>>(iter: T) -> Self {
        Self {
            models: iter
                .into_iter()
                .map(|definition| (definition.name.clone(), definition))
                .collect(),
        }
    }
}

impl SchemaRegistry for ModelRegistry {
    fn model_definition(&self, model: &str) -> Option<&ModelDefinition> {
        self.models.get(model)
    }
}

/// Looks up `model`, failing with [`ConnectorError::ModelNotFound`].
pub fn require_model<'r, R: SchemaRegistry + ?Sized>(
    registry: &'r R,
    model: &str,
) -> ConnectorResult<&'r ModelDefinition> {
    registry
        .model_definition(model)
        .ok_or_else(|| ConnectorError::ModelNotFound(model.to_string()))
}

/// Restricts payloads to the properties a model declares.
pub struct SchemaProjector;

impl SchemaProjector {
    /// Returns the entries of `payload` whose keys are declared on `definition`,
    /// in payload order. Values are not type checked.
    pub fn project(definition: &ModelDefinition, payload: &Document) -> Document {
        payload
            .iter()
            .filter(|(field, _)| definition.has_property(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn project_drops_undeclared_fields() {
        let definition = ModelDefinition::new("Note", ["a", "b"]);
        let projected = SchemaProjector::project(&definition, &doc! { "a": 1, "unknownField": 99, "b": 2 });

        assert_eq!(projected, doc! { "a": 1, "b": 2 });
    }

    #[test]
    fn project_of_undeclared_only_payload_is_empty() {
        let definition = ModelDefinition::new("Note", ["a"]);

        assert!(SchemaProjector::project(&definition, &doc! { "z": true }).is_empty());
    }

    #[test]
    fn registry_lookup() {
        let registry = ModelRegistry::new()
            .register(ModelDefinition::new("Note", ["title"]).with_id_property("noteId"));

        assert_eq!(require_model(&registry, "Note").unwrap().id_property, "noteId");
        assert!(matches!(
            require_model(&registry, "Missing"),
            Err(ConnectorError::ModelNotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn definitions_deserialize_with_default_id_property() {
        let definition: ModelDefinition =
            serde_json::from_str(r#"{ "name": "Note", "properties": ["title"] }"#).unwrap();

        assert_eq!(definition.id_property, "id");
        assert!(definition.has_property("title"));
    }
}
