//! # In-Memory Store
//!
//! [`ObjectStore`] kept in process. Behaves like the API server for the parts the
//! reconciler relies on:
//!
//! - every write assigns a new `resourceVersion`
//! - updates and status updates carrying a stale `resourceVersion` fail with `Conflict`
//! - the main write path never touches `status`; only `update_status` does
//! - creating an existing identity fails with `AlreadyExists`, deleting a missing one
//!   with `NotFound`
//!
//! The most recent calls are recorded so tests can assert which operations reached the
//! store. The log keeps at most [`MAX_RECORDED_OPERATIONS`] entries.

use super::ObjectStore;
use crate::error::StoreError;
use crate::resource::ObjectKey;
use async_trait::async_trait;
use kube::core::DynamicObject;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Length of the operation log; older entries are dropped first
pub const MAX_RECORDED_OPERATIONS: usize = 1024;

/// Operation that reached the store, with the object's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Get(String),
    Create(String),
    Update(String),
    Delete(String),
    UpdateStatus(String),
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, DynamicObject>,
    next_version: u64,
    operations: VecDeque<StoreOperation>,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn record(&mut self, operation: StoreOperation) {
        if self.operations.len() == MAX_RECORDED_OPERATIONS {
            self.operations.pop_front();
        }
        self.operations.push_back(operation);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_status_updates: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `update_status` call fail with `Unavailable`
    pub fn fail_status_updates(&self, fail: bool) {
        self.fail_status_updates.store(fail, Ordering::SeqCst);
    }

    /// Stored copy of the object at `key`
    #[must_use]
    pub fn stored(&self, key: &ObjectKey) -> Option<DynamicObject> {
        self.lock().ok()?.objects.get(&storage_key(key)).cloned()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.objects.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operations recorded so far, oldest first
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock()
            .map(|state| state.operations.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget the recorded operations
    pub fn clear_operations(&self) {
        if let Ok(mut state) = self.lock() {
            state.operations.clear();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {e}")))
    }
}

fn storage_key(key: &ObjectKey) -> String {
    format!(
        "{}/{}/{}/{}",
        key.gvk.api_version(),
        key.gvk.kind,
        key.namespace.as_deref().unwrap_or_default(),
        key.name
    )
}

fn key_of(obj: &DynamicObject) -> Result<ObjectKey, StoreError> {
    ObjectKey::of(obj).map_err(|e| StoreError::Invalid(e.to_string()))
}

fn not_found(key: &ObjectKey) -> StoreError {
    StoreError::NotFound {
        kind: key.gvk.kind.clone(),
        name: key.name.clone(),
    }
}

/// Reject writes whose version token does not match the stored one
///
/// A write without a token is unconditional, as with the API server for most types.
fn check_version(
    key: &ObjectKey,
    stored: &DynamicObject,
    incoming: &DynamicObject,
) -> Result<(), StoreError> {
    match incoming.metadata.resource_version.as_deref() {
        Some(version) if Some(version) != stored.metadata.resource_version.as_deref() => {
            Err(StoreError::Conflict {
                kind: key.gvk.kind.clone(),
                name: key.name.clone(),
                message: format!(
                    "the object has been modified; resourceVersion {version} is stale"
                ),
            })
        }
        _ => Ok(()),
    }
}

fn status_of(obj: &DynamicObject) -> Option<serde_json::Value> {
    obj.data.get("status").cloned()
}

fn set_status(obj: &mut DynamicObject, status: Option<serde_json::Value>) {
    if let Some(map) = obj.data.as_object_mut() {
        match status {
            Some(status) => {
                map.insert("status".to_string(), status);
            }
            None => {
                map.remove("status");
            }
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &ObjectKey) -> Result<DynamicObject, StoreError> {
        let storage = storage_key(key);
        let mut state = self.lock()?;
        state.record(StoreOperation::Get(storage.clone()));
        state.objects.get(&storage).cloned().ok_or_else(|| not_found(key))
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        let storage = storage_key(&key);
        let mut state = self.lock()?;
        state.record(StoreOperation::Create(storage.clone()));
        if state.objects.contains_key(&storage) {
            return Err(StoreError::AlreadyExists {
                kind: key.gvk.kind.clone(),
                name: key.name.clone(),
            });
        }

        let mut created = obj.clone();
        let version = state.bump_version();
        created.metadata.resource_version = Some(version.clone());
        if created.metadata.uid.is_none() {
            created.metadata.uid = Some(format!("memory-{version}"));
        }
        set_status(&mut created, None);
        state.objects.insert(storage, created.clone());
        Ok(created)
    }

    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        let storage = storage_key(&key);
        let mut state = self.lock()?;
        state.record(StoreOperation::Update(storage.clone()));
        let stored = state.objects.get(&storage).ok_or_else(|| not_found(&key))?;
        check_version(&key, stored, obj)?;

        let mut updated = obj.clone();
        set_status(&mut updated, status_of(stored));
        updated.metadata.uid.clone_from(&stored.metadata.uid);
        updated.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(storage, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, obj: &DynamicObject) -> Result<(), StoreError> {
        let key = key_of(obj)?;
        let storage = storage_key(&key);
        let mut state = self.lock()?;
        state.record(StoreOperation::Delete(storage.clone()));
        state
            .objects
            .remove(&storage)
            .map(|_| ())
            .ok_or_else(|| not_found(&key))
    }

    async fn update_status(&self, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = key_of(obj)?;
        let storage = storage_key(&key);
        let mut state = self.lock()?;
        state.record(StoreOperation::UpdateStatus(storage.clone()));
        if self.fail_status_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "status subresource rejected the write".to_string(),
            ));
        }
        let stored = state.objects.get(&storage).ok_or_else(|| not_found(&key))?;
        check_version(&key, stored, obj)?;

        let mut updated = stored.clone();
        set_status(&mut updated, status_of(obj));
        updated.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(storage, updated.clone());
        Ok(updated)
    }
}
