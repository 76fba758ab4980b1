use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::{debug, trace};

use kindstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    config::ConnectorSettings,
    error::{ConnectorError, ConnectorResult},
    key::{Identifier, KeyResolver, StoreKey},
    native::NativeQuery,
    record::Entity,
};

use crate::{
    query::{ID_FIELD, MongoQueryTranslator},
    sanitizer::FieldSanitizer,
};

fn store_error(e: mongodb::error::Error) -> ConnectorError {
    ConnectorError::Store(e.to_string())
}

/// Collection holding a kind, prefixed with the namespace when one is set.
pub(crate) fn collection_name(namespace: Option<&str>, kind: &str) -> String {
    FieldSanitizer::sanitize_name(&match namespace {
        Some(namespace) => format!("{namespace}_{kind}"),
        None => kind.to_string(),
    })
}


/// Paging and key ordering for a native query.
pub(crate) fn find_options(query: &NativeQuery) -> ConnectorResult<FindOptions> {
    let mut options = FindOptions::default();

    if let Some(limit) = query.limit {
        options.limit = Some(i64::try_from(limit).map_err(|_| {
            ConnectorError::Validation(format!("limit {limit} exceeds the supported range"))
        })?);
    }
    if let Some(skip) = query.offset {
        options.skip = Some(u64::try_from(skip).map_err(|_| {
            ConnectorError::Validation(format!("offset {skip} exceeds the supported range"))
        })?);
    }
    options.sort = Some(doc! { ID_FIELD: 1 });

    Ok(options)
}


/// MongoDB-backed store.
///
/// Each kind maps to one collection of the settings' project database. The entity
/// identifier is stored in `_id`: numeric identifiers as 64-bit integers, names as
/// strings. Unbound keys are assigned a random UUIDv4 name on save.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
    namespace: Option<String>,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String, namespace: Option<String>) -> Self {
        Self { client, database, namespace }
    }

    /// Creates a builder connecting to `dsn`, using the project id of `settings` as the
    /// database and its namespace as the collection prefix.
    pub fn builder(dsn: &str, settings: &ConnectorSettings) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, settings)
    }

    fn get_collection(&self, kind: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&collection_name(self.namespace.as_deref(), kind))
    }

    fn prepare_document(&self, id: &Identifier, properties: &Document) -> Document {
        Document::from_iter(
            vec![(ID_FIELD.to_string(), Bson::from(id))]
                .into_iter()
                .chain(
                    FieldSanitizer::sanitize_document(properties)
                        .into_iter()
                        .filter(|(k, _)| k != ID_FIELD),
                ),
        )
    }

    fn restore_entity(&self, kind: &str, mut document: Document) -> ConnectorResult<Entity> {
        let id = document
            .remove(ID_FIELD)
            .ok_or_else(|| ConnectorError::Store(format!("document in kind {kind} has no {ID_FIELD}")))
            .and_then(Identifier::try_from)?;

        Ok(Entity::new(
            KeyResolver::resolve(kind, Some(id)),
            FieldSanitizer::restore_document(&document),
        ))
    }

    fn require_id<'k>(key: &'k StoreKey, operation: &str) -> ConnectorResult<&'k Identifier> {
        key.id()
            .ok_or_else(|| ConnectorError::Store(format!("{operation} requires a complete key, got {key}")))
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
        let options = find_options(&query)?;
        let filter = MongoQueryTranslator.translate(&query)?;
        trace!(kind = %query.kind, %filter, "mongodb find");

        self.get_collection(&query.kind)
            .find(filter)
            .with_options(options)
            .await
            .map_err(store_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|doc| self.restore_entity(&query.kind, doc))
            .collect()
    }

    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
        let id = Self::require_id(key, "get")?;

        self.get_collection(key.kind())
            .find_one(doc! { ID_FIELD: Bson::from(id) })
            .await
            .map_err(store_error)?
            .map(|doc| self.restore_entity(key.kind(), doc))
            .transpose()
    }

    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
        let key = if key.is_bound() {
            key
        } else {
            key.bind(Identifier::Name(uuid::Uuid::new_v4().to_string()))
        };
        let id = Self::require_id(&key, "save")?;

        self.get_collection(key.kind())
            .replace_one(doc! { ID_FIELD: Bson::from(id) }, self.prepare_document(id, &properties))
            .upsert(true)
            .await
            .map_err(store_error)?;

        debug!(%key, "saved entity");

        Ok(key)
    }

    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
        let id = Self::require_id(&key, "update")?;

        let result = self
            .get_collection(key.kind())
            .replace_one(doc! { ID_FIELD: Bson::from(id) }, self.prepare_document(id, &properties))
            .await
            .map_err(store_error)?;

        if result.matched_count == 0 {
            return Err(ConnectorError::Store(format!("no entity to update for key {key}")));
        }

        Ok(())
    }

    async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
        let id = Self::require_id(&key, "delete")?;

        self.get_collection(key.kind())
            .delete_one(doc! { ID_FIELD: Bson::from(id) })
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn shutdown(self) -> ConnectorResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    namespace: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, settings: &ConnectorSettings) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: settings.project_id.clone(),
            namespace: settings.namespace.clone(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> ConnectorResult<Self::Backend> {
        debug!(database = %self.database, namespace = ?self.namespace, "connecting to mongodb");

        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| ConnectorError::Initialization(e.to_string()))?,
            )
            .map_err(|e| ConnectorError::Initialization(e.to_string()))?,
            self.database,
            self.namespace,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_are_prefixed_by_namespace() {
        assert_eq!(collection_name(None, "Note"), "Note");
        assert_eq!(collection_name(Some("staging"), "Note"), "staging_Note");
        assert_eq!(collection_name(Some("a.b"), "Note"), "a__dot__b_Note");
    }

    #[test]
    fn paging_converts_into_find_options() {
        let options = find_options(&NativeQuery::new("Note").limit(Some(5)).offset(Some(2))).unwrap();

        assert_eq!(options.limit, Some(5));
        assert_eq!(options.skip, Some(2));
        assert_eq!(options.sort, Some(doc! { "_id": 1 }));
    }

    #[test]
    fn out_of_range_limits_are_rejected() {
        assert!(matches!(
            find_options(&NativeQuery::new("Note").limit(Some(usize::MAX))),
            Err(ConnectorError::Validation(_))
        ));
    }
}
