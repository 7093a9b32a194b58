//! # Object Store
//!
//! Versioned object store the synchronizer converges resources against.
//!
//! - `cluster`: Kubernetes API server backed store (dynamic client per GVK)
//! - `memory`: in-process store with resource versions and conflict detection,
//!   used in tests and local tooling

pub mod cluster;
pub mod memory;

use crate::error::StoreError;
use crate::resource::ObjectKey;
use async_trait::async_trait;
use kube::core::DynamicObject;

#[cfg(test)]
use mockall::automock;

pub use cluster::KubeStore;
pub use memory::MemoryStore;

/// Remote, versioned object store
///
/// Every call is one round trip. Implementations classify failures into
/// [`StoreError`] variants and must reject an update or status update whose
/// `metadata.resourceVersion` is stale with [`StoreError::Conflict`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the stored object
    async fn get(&self, key: &ObjectKey) -> Result<DynamicObject, StoreError>;

    /// Create a new object; `AlreadyExists` if the identity is taken
    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Full-object overwrite of an existing object (status is left untouched)
    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Delete the object; `NotFound` if it does not exist
    async fn delete(&self, obj: &DynamicObject) -> Result<(), StoreError>;

    /// Write only the status subresource of an existing object
    async fn update_status(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError>;
}
