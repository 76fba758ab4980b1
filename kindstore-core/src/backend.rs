//! The store boundary.
//!
//! [`StoreBackend`] is the contract the connector needs from a key-addressed document
//! store: conjunctive equality queries, point reads, and whole-record writes. Client
//! sessions, credentials and project configuration live behind the implementation.
//!
//! # Traits
//!
//! - [`StoreBackend`]: the core trait for storage backends
//! - [`DynStoreBackend`]: an object-safe mirror for dynamic dispatch
//! - [`StoreBackendBuilder`]: factory trait for creating backend instances
//!
//! # Example
//!
//! ```ignore
//! use kindstore::{backend::StoreBackend, key::KeyResolver};
//! use bson::doc;
//!
//! let key = backend.save(KeyResolver::resolve("Note", None), doc! { "title": "hi" }).await?;
//! assert!(key.is_bound());
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{error::ConnectorResult, key::StoreKey, native::NativeQuery, record::Entity};

/// Abstract interface for key-addressed document stores.
///
/// Implementations must be thread-safe; the connector shares one backend across
/// concurrent requests. Store failures are reported as
/// [`ConnectorError::Store`](crate::error::ConnectorError::Store).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Runs a native query and returns the matching entities in the store's order.
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>>;

    /// Fetches a single entity by key. A missing entity is `Ok(None)`.
    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>>;

    /// Inserts or replaces an entity.
    ///
    /// An unbound key gets an identifier assigned by the store. Returns the bound key.
    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey>;

    /// Replaces an existing entity's properties. Fails if the entity does not exist.
    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()>;

    /// Deletes an entity. Deleting a missing entity succeeds.
    async fn delete(&self, key: StoreKey) -> ConnectorResult<()>;

    /// Releases backend resources. The default implementation is a no-op.
    async fn shutdown(self) -> ConnectorResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
        StoreBackend::query(*self, query).await
    }

    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
        StoreBackend::get(*self, key).await
    }

    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
        StoreBackend::save(*self, key, properties).await
    }

    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
        StoreBackend::update(*self, key, properties).await
    }

    async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
        StoreBackend::delete(*self, key).await
    }
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>>;
    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>>;
    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey>;
    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()>;
    async fn delete(&self, key: StoreKey) -> ConnectorResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> ConnectorResult<()>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
        StoreBackend::query(self, query).await
    }

    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
        StoreBackend::get(self, key).await
    }

    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
        StoreBackend::save(self, key, properties).await
    }

    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
        StoreBackend::update(self, key, properties).await
    }

    async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
        StoreBackend::delete(self, key).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> ConnectorResult<()> {
        StoreBackend::shutdown(*self).await
    }
}

#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn query(&self, query: NativeQuery) -> ConnectorResult<Vec<Entity>> {
        DynStoreBackend::query(&**self, query).await
    }

    async fn get(&self, key: &StoreKey) -> ConnectorResult<Option<Entity>> {
        DynStoreBackend::get(&**self, key).await
    }

    async fn save(&self, key: StoreKey, properties: Document) -> ConnectorResult<StoreKey> {
        DynStoreBackend::save(&**self, key, properties).await
    }

    async fn update(&self, key: StoreKey, properties: Document) -> ConnectorResult<()> {
        DynStoreBackend::update(&**self, key, properties).await
    }

    async fn delete(&self, key: StoreKey) -> ConnectorResult<()> {
        DynStoreBackend::delete(&**self, key).await
    }

    async fn shutdown(self) -> ConnectorResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> ConnectorResult<Self::Backend>;
}
