//! # Kubernetes Store
//!
//! [`ObjectStore`] backed by the Kubernetes API server through dynamic `Api`s.
//! The API resource for a GVK is resolved through API discovery when the store was
//! built with it, otherwise it is derived from the kind.

use super::ObjectStore;
use crate::discovery::{api_for_resource, resolve_api_resource};
use crate::error::StoreError;
use crate::resource::ObjectKey;
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, PostParams};
use kube::core::DynamicObject;
use kube::discovery::Discovery;
use kube::Client;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    discovery: Option<Arc<Discovery>>,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("discovery", &self.discovery.is_some())
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    /// Store resolving API resources from the kind alone
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            discovery: None,
        }
    }

    /// Store resolving API resources and their scope through one discovery run
    pub async fn with_discovery(client: Client) -> Result<Self, StoreError> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .map_err(StoreError::Api)?;
        Ok(Self {
            client,
            discovery: Some(Arc::new(discovery)),
        })
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api(&self, key: &ObjectKey) -> Api<DynamicObject> {
        let (resource, namespaced) =
            resolve_api_resource(self.discovery.as_deref(), &key.gvk, key.namespace.is_some());
        debug!(
            "Resolved {} to resource {} (namespaced: {})",
            key, resource.plural, namespaced
        );
        api_for_resource(
            self.client.clone(),
            &resource,
            namespaced,
            key.namespace.as_deref(),
        )
    }
}

fn key_of(obj: &DynamicObject) -> Result<ObjectKey, StoreError> {
    ObjectKey::of(obj).map_err(|e| StoreError::Invalid(e.to_string()))
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get(&self, key: &ObjectKey) -> Result<DynamicObject, StoreError> {
        self.api(key)
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.gvk.kind, &key.name))
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        self.api(&key)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.gvk.kind, &key.name))
    }

    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        self.api(&key)
            .replace(&key.name, &PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.gvk.kind, &key.name))
    }

    async fn delete(&self, obj: &DynamicObject) -> Result<(), StoreError> {
        let key = key_of(obj)?;
        self.api(&key)
            .delete(&key.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &key.gvk.kind, &key.name))
    }

    async fn update_status(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        let body = serde_json::to_vec(obj)?;
        self.api(&key)
            .replace_status(&key.name, &PostParams::default(), body)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.gvk.kind, &key.name))
    }
}
