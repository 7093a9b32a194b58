//! Shared fixtures for reconciler tests

use super::ReconcilerBase;
use crate::clock::ManualClock;
use crate::crd::{ReconcileStatus, ReconcileStatusAware};
use crate::events::NoopNotifier;
use crate::store::MemoryStore;
use chrono::{DateTime, TimeZone, Utc};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "quay.redhat.com",
    version = "v1",
    kind = "QuayRegistry",
    namespaced,
    status = "QuayRegistryStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct QuayRegistrySpec {
    pub replicas: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuayRegistryStatus {
    #[serde(default)]
    pub reconcile_status: ReconcileStatus,
}

impl ReconcileStatusAware for QuayRegistry {
    fn reconcile_status(&self) -> ReconcileStatus {
        self.status
            .as_ref()
            .map(|s| s.reconcile_status.clone())
            .unwrap_or_default()
    }

    fn set_reconcile_status(&mut self, status: ReconcileStatus) {
        self.status.get_or_insert_with(Default::default).reconcile_status = status;
    }
}

crate::managed_object!(QuayRegistry, status_aware);

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn registry(name: &str) -> QuayRegistry {
    let mut registry = QuayRegistry::new(name, QuayRegistrySpec { replicas: 1 });
    registry.metadata.namespace = Some("quay".to_string());
    registry
}

pub fn config_map(name: &str, value: &str) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("quay".to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([("key".to_string(), value.to_string())])),
        ..Default::default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub base: ReconcilerBase,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let base = ReconcilerBase::new(store.clone(), Arc::new(NoopNotifier)).with_clock(clock.clone());
    Harness { store, clock, base }
}
