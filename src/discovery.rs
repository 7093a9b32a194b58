//! # Discovery
//!
//! Discovery and dynamic client helpers. Resolves the API resource (plural name and
//! scope) serving a group/version/kind so resources of any type can be handled through
//! `Api<DynamicObject>`.

use crate::error::ReconcileError;
use kube::api::{Api, ApiResource};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::{pinned_kind, Discovery, Scope};
use kube::Client;
use tracing::{debug, error};

/// Run API discovery against the cluster
pub async fn run_discovery(client: Client) -> Result<Discovery, ReconcileError> {
    Discovery::new(client).run().await.map_err(|e| {
        error!("Unable to run API discovery: {}", e);
        ReconcileError::Discovery(e)
    })
}

/// Resolve the API resource for `gvk`
///
/// Uses `discovery` when available. Without it the plural is derived from the kind and
/// the resource is assumed namespaced when the object carries a namespace.
#[must_use]
pub fn resolve_api_resource(
    discovery: Option<&Discovery>,
    gvk: &GroupVersionKind,
    has_namespace: bool,
) -> (ApiResource, bool) {
    match discovery.and_then(|d| d.resolve_gvk(gvk)) {
        Some((resource, capabilities)) => {
            let namespaced = matches!(capabilities.scope, Scope::Namespaced);
            (resource, namespaced)
        }
        None => {
            debug!(
                "No discovery entry for {}/{} {}, deriving resource from kind",
                gvk.group, gvk.version, gvk.kind
            );
            (ApiResource::from_gvk(gvk), has_namespace)
        }
    }
}

/// Dynamic `Api` for a resolved resource
///
/// Namespaced resources without an explicit namespace use the client's default namespace.
#[must_use]
pub fn api_for_resource(
    client: Client,
    resource: &ApiResource,
    namespaced: bool,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    match (namespaced, namespace) {
        (true, Some(ns)) => Api::namespaced_with(client, ns, resource),
        (true, None) => Api::default_namespaced_with(client, resource),
        (false, _) => Api::all_with(client, resource),
    }
}

/// Dynamic `Api` for `gvk`, resolved with a targeted discovery call
pub async fn dynamic_api_for_gvk(
    client: &Client,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
) -> Result<Api<DynamicObject>, ReconcileError> {
    let (resource, capabilities) = pinned_kind(client, gvk).await.map_err(|e| {
        error!("Unable to resolve {}/{} {}: {}", gvk.group, gvk.version, gvk.kind, e);
        ReconcileError::Discovery(e)
    })?;
    let namespaced = matches!(capabilities.scope, Scope::Namespaced);
    Ok(api_for_resource(
        client.clone(),
        &resource,
        namespaced,
        namespace,
    ))
}
