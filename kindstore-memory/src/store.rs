//! In-memory storage implementation of the store boundary.
//!
//! Entities live in per-kind ordered maps keyed by identifier, so kind scans come back in
//! key order: numeric ids ascending, then names.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Document;
use tracing::trace;

use kindstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{ConnectorError, ConnectorResult},
    key::{Identifier, KeyResolver, StoreKey},
    native::NativeQuery,
    record::Entity,
};

use crate::evaluator::EntityEvaluator;

type KindMap = BTreeMap<Identifier, Document>;

#[derive(Debug, Default)]
struct StoreState {
    kinds: HashMap<String, KindMap>,
    /// Last numeric id handed out; ids are unique across kinds.
    last_id: i64,
}

impl StoreState {
    fn allocate_id(&mut self, kind: &str) -> Identifier {
        loop {
            self.last_id += 1;
            let candidate = Identifier::Id(self.last_id);

            let taken = self
                .kinds
                .get(kind)
                .is_some_and(|entities| entities.contains_key(&candidate));

            if !taken {
                return candidate;
            }
        }
    }
}

fn require_id(key: &StoreKey, operation: &str) -> ConnectorResult<Identifier> {
    key.id()
        .cloned()
        .ok_or_else(|| ConnectorError::Store(format!("{operation} requires a complete key, got {key}")))
}


/// Thread-safe in-memory store backend.
///
/// `InMemoryStore` is cloneable; clones share the same underlying data. Queries scan the
/// kind unless a key predicate pins a single entity.
///
/// Writes follow the semantics of a key-addressed document store: `save` inserts or
/// replaces and assigns numeric ids to unbound keys, `update` fails for missing entities,
/// and `delete` of a missing entity is a no-op.
///
/// # Example
///
/// ```ignore
/// use kindstore_memory::InMemoryStore;
/// use kindstore::{backend::StoreBackend, key::KeyResolver};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let key = store.save(KeyResolver::resolve("Note", None), doc! { "title": "hi" }).await?;
/// assert!(store.get(&key).await?.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of entities stored under `kind`.
    pub async fn len(&self, kind: &str) -> usize {
        self.state
            .read()
            .await
            .kinds
            .get(kind)
            .map_or(0, BTreeMap::len)
    }

    /// Whether no entity is stored under `kind`.
    pub async fn is_empty(&self, kind: &str) -> bool {
        self.len(kind).await == 0
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
        let state = self.state.read().await;
        let entities = match state.kinds.get(&query.kind) {
            Some(entities) => entities,
            None => return Ok(vec![]),
        };

        let to_entity = |(id, properties): (&Identifier, &Document)| {
            Entity::new(KeyResolver::resolve(&query.kind, Some(id.clone())), properties.clone())
        };

        // A key predicate pins at most one entity; skip the scan.
        let candidates: Vec<Entity> = match query.key_predicates().next() {
            Some(key) => match key.id() {
                Some(id) if key.kind() == query.kind => entities
                    .get_key_value(id)
                    .map(to_entity)
                    .into_iter()
                    .collect(),
                _ => vec![],
            },
            None => entities.iter().map(to_entity).collect(),
        };

        let results = candidates
            .into_iter()
            .filter(|entity| EntityEvaluator::new(entity).matches_all(&query.predicates))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        trace!(kind = %query.kind, results = results.len(), "in-memory query");

        Ok(results)
    }

    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
        let id = require_id(key, "get")?;

        Ok(
            self.state
                .read()
                .await
                .kinds
                .get(key.kind())
                .and_then(|entities| entities.get(&id))
                .map(|properties| Entity::new(key.clone(), properties.clone()))
        )
    }

    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
        let mut state = self.state.write().await;

        let id = match key.id() {
            Some(id) => id.clone(),
            None => state.allocate_id(key.kind()),
        };

        state
            .kinds
            .entry(key.kind().to_string())
            .or_default()
            .insert(id.clone(), properties);

        Ok(key.bind(id))
    }

    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
        let id = require_id(&key, "update")?;
        let mut state = self.state.write().await;

        match state
            .kinds
            .get_mut(key.kind())
            .and_then(|entities| entities.get_mut(&id))
        {
            Some(existing) => {
                *existing = properties;
                Ok(())
            }
            None => Err(ConnectorError::Store(format!("no entity to update for key {key}"))),
        }
    }

    async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
        let id = require_id(&key, "delete")?;
        let mut state = self.state.write().await;

        if let Some(entities) = state.kinds.get_mut(key.kind()) {
            entities.remove(&id);
        }

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> ConnectorResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
