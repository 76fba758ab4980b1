//! The ORM-facing CRUD surface.
//!
//! [`Connector`] is the capability set the host ORM consumes. [`DatastoreConnector`]
//! implements it on top of any [`StoreBackend`], translating each call into one
//! request pipeline:
//!
//! ```text
//! request -> KeyResolver / SchemaProjector / FilterCompiler -> backend -> ResultDecoder -> response
//! ```
//!
//! The connector keeps no state between calls other than the read-only schema registry,
//! so a single instance can serve concurrent requests.
//!
//! # Example
//!
//! ```ignore
//! use kindstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let registry = ModelRegistry::new().register(ModelDefinition::new("Note", ["title"]));
//! let connector = DatastoreConnector::new(InMemoryStore::new(), registry);
//!
//! let id = connector.create("Note", doc! { "title": "hello" }).await?;
//! let note = connector.find_by_id("Note", &id).await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use tracing::debug;

use crate::{
    backend::{StoreBackend, StoreBackendBuilder},
    compile::FilterCompiler,
    config::ConnectorSettings,
    error::{ConnectorError, ConnectorResult},
    key::{Identifier, KeyResolver},
    query::Filter,
    record::{MergePatcher, Record, ResultDecoder},
    schema::{ModelDefinition, ModelRegistry, SchemaProjector, SchemaRegistry, require_model},
};

/// Type tags reported to the host ORM.
pub const CONNECTOR_TYPES: &[&str] = &["db", "nosql", "datastore"];

/// CRUD operations consumed by the host ORM.
///
/// Implemented by [`DatastoreConnector`]; tests and alternative stores can provide
/// their own implementation of the same surface.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the records of `model` matching `filter`, in store order.
    ///
    /// No match is an empty vector, not an error.
    async fn find(&self, model: &str, filter: &Filter) -> ConnectorResult<Vec<Record>>;

    /// Returns the record of `model` with identifier `id`, or `None`.
    async fn find_by_id(&self, model: &str, id: &Identifier) -> ConnectorResult<Option<Record>>;

    /// Inserts a record and returns its identifier, assigned by the store when the
    /// payload does not carry one.
    async fn create(&self, model: &str, payload: Document) -> ConnectorResult<Identifier>;

    /// Merges `payload` into the existing record `id` and returns `id`.
    async fn update_attributes(
        &self,
        model: &str,
        id: &Identifier,
        payload: Document,
    ) -> ConnectorResult<Identifier>;

    /// Deletes the record identified by the identifier field of `where_clause`.
    async fn destroy_all(&self, model: &str, where_clause: &Document) -> ConnectorResult<()>;

    /// Counts the records of `model` matching `where_clause`.
    async fn count(&self, model: &str, where_clause: &Document) -> ConnectorResult<usize>;

    /// Alias of [`Connector::find`].
    async fn all(&self, model: &str, filter: &Filter) -> ConnectorResult<Vec<Record>> {
        self.find(model, filter).await
    }

    /// Type tags describing the connector.
    fn types(&self) -> &'static [&'static str] {
        CONNECTOR_TYPES
    }

    /// Whether the backing store is relational.
    fn is_relational(&self) -> bool {
        false
    }
}

/// Connector for key-addressed document stores with conjunctive equality queries.
///
/// # Type Parameters
///
/// * `B` - The store backend
/// * `R` - The schema registry providing model definitions
#[derive(Debug)]
pub struct DatastoreConnector<B: StoreBackend, R: SchemaRegistry = ModelRegistry> {
    backend: B,
    registry: R,
}

impl<B: StoreBackend, R: SchemaRegistry> DatastoreConnector<B, R> {
    /// Creates a connector over `backend`, serving the models in `registry`.
    pub fn new(backend: B, registry: R) -> Self {
        Self { backend, registry }
    }

    /// The underlying store backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The schema registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Shuts down the backend, consuming the connector.
    pub async fn shutdown(self) -> ConnectorResult<()> {
        self.backend.shutdown().await
    }

    fn model(&self, model: &str) -> ConnectorResult<&ModelDefinition> {
        require_model(&self.registry, model)
    }

    async fn find_with(
        &self,
        definition: &ModelDefinition,
        filter: &Filter,
    ) -> ConnectorResult<Vec<Record>> {
        let query = FilterCompiler::new(definition).compile(filter)?;
        let entities = self.backend.query(query).await?;

        debug!(model = %definition.name, results = entities.len(), "find: results");

        Ok(entities
            .into_iter()
            .map(|entity| ResultDecoder::decode(entity, &definition.id_property))
            .collect())
    }
}

impl<B: StoreBackend> DatastoreConnector<B, ModelRegistry> {
    /// Validates `settings`, builds the backend and registers the configured models.
    pub async fn connect<BB>(builder: BB, settings: &ConnectorSettings) -> ConnectorResult<Self>
    where
        BB: StoreBackendBuilder<Backend = B> + Send,
    {
        let registry = ModelRegistry::from_settings(settings)?;
        let backend = builder.build().await?;

        debug!(
            project_id = %settings.project_id,
            namespace = ?settings.namespace,
            models = settings.models.len(),
            "connector ready"
        );

        Ok(Self::new(backend, registry))
    }
}

#[async_trait]
impl<B: StoreBackend, R: SchemaRegistry> Connector for DatastoreConnector<B, R> {
    async fn find(&self, model: &str, filter: &Filter) -> ConnectorResult<Vec<Record>> {
        debug!(model, filter = ?filter, "find");

        self.find_with(self.model(model)?, filter).await
    }

    async fn find_by_id(&self, model: &str, id: &Identifier) -> ConnectorResult<Option<Record>> {
        debug!(model, %id, "findById");

        let definition = self.model(model)?;

        // No stored key carries an empty name.
        if matches!(id, Identifier::Name(name) if name.is_empty()) {
            return Ok(None);
        }

        let filter = Filter::builder()
            .where_clause(doc! { definition.id_property.as_str(): Bson::from(id) })
            .limit(1)
            .build();

        Ok(self.find_with(definition, &filter).await?.into_iter().next())
    }

    async fn create(&self, model: &str, payload: Document) -> ConnectorResult<Identifier> {
        debug!(model, payload = %payload, "create");

        if payload.is_empty() {
            return Err(ConnectorError::Validation(format!(
                "cannot save an empty {model} entity"
            )));
        }

        let definition = self.model(model)?;
        let id = match payload.get(&definition.id_property) {
            None | Some(Bson::Null) => None,
            Some(value) => Some(Identifier::try_from(value)?),
        };

        match &id {
            Some(id) => debug!(model, %id, "create: using preset {}", definition.id_property),
            None => debug!(
                model,
                "create: no {} on payload, will be assigned on insert", definition.id_property
            ),
        }

        let key = KeyResolver::resolve(model, id);
        let mut properties = SchemaProjector::project(definition, &payload);
        properties.remove(&definition.id_property);

        let saved = self.backend.save(key, properties).await?;

        debug!(model, key = %saved, "create: saved");

        saved.into_id().ok_or_else(|| {
            ConnectorError::Store(format!("save of {model} returned a key without an identifier"))
        })
    }

    /// Reads the record, merges `payload` over it and writes the result back.
    ///
    /// The read and the write are separate store calls. Two concurrent updates of the
    /// same record can interleave so that the later write discards the earlier one's
    /// changes.
    async fn update_attributes(
        &self,
        model: &str,
        id: &Identifier,
        payload: Document,
    ) -> ConnectorResult<Identifier> {
        debug!(model, %id, payload = %payload, "updateAttributes");

        let definition = self.model(model)?;
        let prior = self
            .find_by_id(model, id)
            .await?
            .ok_or_else(|| ConnectorError::NotFound {
                model: model.to_string(),
                id: id.to_string(),
            })?;

        let incoming = SchemaProjector::project(definition, &payload);
        let merged = MergePatcher::merge(prior, incoming, &definition.id_property);

        debug!(model, %id, record = %merged, "updateAttributes: execute");

        self.backend
            .update(KeyResolver::resolve(model, Some(id.clone())), merged)
            .await?;

        Ok(id.clone())
    }

    async fn destroy_all(&self, model: &str, where_clause: &Document) -> ConnectorResult<()> {
        debug!(model, where_clause = %where_clause, "destroyAll");

        let definition = self.model(model)?;
        let id = match where_clause.get(&definition.id_property) {
            None | Some(Bson::Null) => {
                return Err(ConnectorError::Validation(format!(
                    "destroyAll on {model} requires `{}` in the where clause",
                    definition.id_property
                )));
            }
            Some(value) => Identifier::try_from(value)?,
        };

        let key = KeyResolver::resolve(model, Some(id));

        debug!(model, key = %key, "destroyAll: execute");

        self.backend.delete(key).await
    }

    async fn count(&self, model: &str, where_clause: &Document) -> ConnectorResult<usize> {
        debug!(model, where_clause = %where_clause, "count: redirecting to find");

        let filter = Filter::builder()
            .where_clause(where_clause.clone())
            .build();

        Ok(self.find_with(self.model(model)?, &filter).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{key::StoreKey, native::NativeQuery, record::Entity};

    /// Backend that records calls and answers from canned data.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        entities: Vec<Entity>,
        queries: Mutex<Vec<NativeQuery>>,
        saves: Mutex<Vec<(StoreKey, Document)>>,
        updates: Mutex<Vec<(StoreKey, Document)>>,
        deletes: Mutex<Vec<StoreKey>>,
        assign: Option<Identifier>,
    }

    #[async_trait]
    impl StoreBackend for ScriptedBackend {
        async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
            let key = query.key_predicates().next().cloned();
            self.queries.lock().unwrap().push(query);

            Ok(self
                .entities
                .iter()
                .filter(|entity| key.as_ref().is_none_or(|key| &entity.key == key))
                .cloned()
                .collect())
        }

        async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
            Ok(self.entities.iter().find(|entity| &entity.key == key).cloned())
        }

        async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
            self.saves.lock().unwrap().push((key.clone(), properties));

            Ok(match (&self.assign, key.is_bound()) {
                (Some(id), false) => key.bind(id.clone()),
                _ => key,
            })
        }

        async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
            self.updates.lock().unwrap().push((key, properties));
            Ok(())
        }

        async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
            self.deletes.lock().unwrap().push(key);
            Ok(())
        }
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new().register(ModelDefinition::new("Note", ["a", "b"]))
    }

    fn note(id: i64, properties: Document) -> Entity {
        Entity::new(KeyResolver::resolve("Note", Some(Identifier::Id(id))), properties)
    }

    #[tokio::test]
    async fn create_projects_and_strips_the_identifier() {
        let backend = ScriptedBackend { assign: Some(Identifier::Id(11)), ..Default::default() };
        let connector = DatastoreConnector::new(&backend, registry());

        let id = connector
            .create("Note", doc! { "a": 1, "unknownField": 99, "id": Bson::Null })
            .await
            .unwrap();

        assert_eq!(id, Identifier::Id(11));
        let saves = backend.saves.lock().unwrap();
        assert_eq!(saves[0].0, KeyResolver::resolve("Note", None));
        assert_eq!(saves[0].1, doc! { "a": 1 });
    }

    #[tokio::test]
    async fn create_with_a_preset_identifier_uses_a_bound_key() {
        let backend = ScriptedBackend::default();
        let connector = DatastoreConnector::new(&backend, registry());

        let id = connector.create("Note", doc! { "id": "n-1", "b": 2 }).await.unwrap();

        assert_eq!(id, Identifier::from("n-1"));
        let saves = backend.saves.lock().unwrap();
        assert_eq!(saves[0].0, KeyResolver::resolve("Note", Some(Identifier::from("n-1"))));
        assert_eq!(saves[0].1, doc! { "b": 2 });
    }

    #[tokio::test]
    async fn create_rejects_empty_payloads_and_unusable_keys() {
        let backend = ScriptedBackend::default();
        let connector = DatastoreConnector::new(&backend, registry());

        assert!(matches!(
            connector.create("Note", doc! {}).await,
            Err(ConnectorError::Validation(_))
        ));
        assert!(matches!(
            connector.create("Note", doc! { "a": 1 }).await,
            Err(ConnectorError::Store(_))
        ));
        assert!(matches!(
            connector.create("Missing", doc! { "a": 1 }).await,
            Err(ConnectorError::ModelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_id_issues_a_limited_key_query() {
        let backend = ScriptedBackend { entities: vec![note(4, doc! { "a": 1 })], ..Default::default() };
        let connector = DatastoreConnector::new(&backend, registry());

        let found = connector.find_by_id("Note", &Identifier::Id(4)).await.unwrap();
        let missing = connector.find_by_id("Note", &Identifier::Id(5)).await.unwrap();

        assert_eq!(found, Some(doc! { "a": 1, "id": 4_i64 }));
        assert_eq!(missing, None);

        let queries = backend.queries.lock().unwrap();
        assert_eq!(queries[0].limit, Some(1));
        assert_eq!(
            queries[0].key_predicates().collect::<Vec<_>>(),
            vec![&KeyResolver::resolve("Note", Some(Identifier::Id(4)))]
        );
    }

    #[tokio::test]
    async fn update_merges_onto_the_prior_record() {
        let backend = ScriptedBackend {
            entities: vec![note(4, doc! { "a": 1, "b": 2 })],
            ..Default::default()
        };
        let connector = DatastoreConnector::new(&backend, registry());

        let id = connector
            .update_attributes("Note", &Identifier::Id(4), doc! { "id": 999, "b": 3, "zzz": 0 })
            .await
            .unwrap();

        assert_eq!(id, Identifier::Id(4));
        let updates = backend.updates.lock().unwrap();
        assert_eq!(updates[0].0, KeyResolver::resolve("Note", Some(Identifier::Id(4))));
        assert_eq!(updates[0].1, doc! { "a": 1, "b": 3 });
    }

    #[tokio::test]
    async fn update_of_a_missing_record_is_not_found() {
        let backend = ScriptedBackend::default();
        let connector = DatastoreConnector::new(&backend, registry());

        assert!(matches!(
            connector.update_attributes("Note", &Identifier::Id(1), doc! { "a": 1 }).await,
            Err(ConnectorError::NotFound { .. })
        ));
        assert!(backend.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn destroy_all_deletes_by_identifier_only() {
        let backend = ScriptedBackend::default();
        let connector = DatastoreConnector::new(&backend, registry());

        connector.destroy_all("Note", &doc! { "id": 8_i64, "a": 1 }).await.unwrap();

        assert_eq!(
            *backend.deletes.lock().unwrap(),
            vec![KeyResolver::resolve("Note", Some(Identifier::Id(8)))]
        );
        assert!(matches!(
            connector.destroy_all("Note", &doc! { "a": 1 }).await,
            Err(ConnectorError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn count_materialises_an_unlimited_find() {
        let backend = ScriptedBackend {
            entities: vec![note(1, doc! {}), note(2, doc! {})],
            ..Default::default()
        };
        let connector = DatastoreConnector::new(&backend, registry());

        assert_eq!(connector.count("Note", &doc! {}).await.unwrap(), 2);
        assert_eq!(backend.queries.lock().unwrap()[0].limit, None);
    }

    #[test]
    fn metadata() {
        let connector = DatastoreConnector::new(ScriptedBackend::default(), registry());

        assert_eq!(connector.types(), &["db", "nosql", "datastore"]);
        assert!(!connector.is_relational());
    }
}
