//! # Resource Synchronization
//!
//! Idempotent create-or-update, create-if-absent and delete of managed objects.
//!
//! - The owner reference is stamped first and the namespace override applied after it,
//!   before the object reaches the store; a stamping error is logged and ignored.
//! - Create-or-update reads the stored object first and sends a full-object update
//!   carrying the stored `resourceVersion`. There is no merge and no retry on `Conflict`.
//! - `NotFound` is benign for delete, `AlreadyExists` for create-if-absent.
//! - Batches run in order and stop at the first failure. Nothing is rolled back.
//!
//! After a successful create or update the stored `resourceVersion` and `uid` are
//! copied back onto the caller's object.

use super::ReconcilerBase;
use crate::error::ReconcileError;
use crate::observability::metrics;
use crate::resource::{adopt_stored_identity, to_dynamic, ManagedObject, ObjectKey};
use tracing::{debug, error, field, info, instrument, Span};

impl ReconcilerBase {
    /// Stamp the owner, then apply the namespace override
    ///
    /// The owner is checked against the namespace the object was built with.
    fn prepare<M: ManagedObject + ?Sized>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        obj: &mut M,
    ) {
        if let Some(owner) = owner {
            if let Err(e) = self.stamper.set_controller_reference(owner, obj.meta_mut()) {
                debug!("Ignoring owner reference error: {}", e);
            }
        }
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            obj.meta_mut().namespace = Some(ns.to_string());
        }
    }

    /// Create `obj`, or overwrite the stored object with it
    #[instrument(parent = &self.span, skip_all, fields(resource = field::Empty))]
    pub async fn create_or_update_resource<M: ManagedObject + ?Sized>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        obj: &mut M,
    ) -> Result<(), ReconcileError> {
        self.prepare(owner, namespace, obj);
        let key = identify(&*obj, "create_or_update")?;
        let mut desired = to_dynamic(&*obj)?;

        match self.store.get(&key).await {
            Ok(stored) => {
                desired
                    .metadata
                    .resource_version
                    .clone_from(&stored.metadata.resource_version);
                obj.meta_mut()
                    .resource_version
                    .clone_from(&stored.metadata.resource_version);
                let updated = self.store.update(&desired).await.map_err(|e| {
                    error!("Unable to update {}: {}", key, e);
                    metrics::record_resource_operation("create_or_update", "error");
                    e
                })?;
                adopt_stored_identity(obj, &updated.metadata);
                metrics::record_resource_operation("create_or_update", "updated");
                debug!("Updated {}", key);
            }
            Err(e) if e.is_not_found() => {
                let created = self.store.create(&desired).await.map_err(|e| {
                    error!("Unable to create {}: {}", key, e);
                    metrics::record_resource_operation("create_or_update", "error");
                    e
                })?;
                adopt_stored_identity(obj, &created.metadata);
                metrics::record_resource_operation("create_or_update", "created");
                info!("Created {}", key);
            }
            Err(e) => {
                error!("Unable to look up {}: {}", key, e);
                metrics::record_resource_operation("create_or_update", "error");
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Create `obj` unless an object with its identity already exists
    #[instrument(parent = &self.span, skip_all, fields(resource = field::Empty))]
    pub async fn create_resource_if_not_exists<M: ManagedObject + ?Sized>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        obj: &mut M,
    ) -> Result<(), ReconcileError> {
        self.prepare(owner, namespace, obj);
        let key = identify(&*obj, "create_if_not_exists")?;
        let desired = to_dynamic(&*obj)?;

        match self.store.create(&desired).await {
            Ok(created) => {
                adopt_stored_identity(obj, &created.metadata);
                metrics::record_resource_operation("create_if_not_exists", "created");
                info!("Created {}", key);
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                metrics::record_resource_operation("create_if_not_exists", "exists");
                debug!("{} already exists, leaving it untouched", key);
                Ok(())
            }
            Err(e) => {
                error!("Unable to create {}: {}", key, e);
                metrics::record_resource_operation("create_if_not_exists", "error");
                Err(e.into())
            }
        }
    }

    /// Delete `obj`; a missing object counts as deleted
    #[instrument(parent = &self.span, skip_all, fields(resource = field::Empty))]
    pub async fn delete_resource<M: ManagedObject + ?Sized>(
        &self,
        obj: &M,
    ) -> Result<(), ReconcileError> {
        let key = identify(obj, "delete")?;
        let target = to_dynamic(obj)?;

        match self.store.delete(&target).await {
            Ok(()) => {
                metrics::record_resource_operation("delete", "deleted");
                info!("Deleted {}", key);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                metrics::record_resource_operation("delete", "absent");
                debug!("{} already gone", key);
                Ok(())
            }
            Err(e) => {
                error!("Unable to delete {}: {}", key, e);
                metrics::record_resource_operation("delete", "error");
                Err(e.into())
            }
        }
    }

    /// [`create_or_update_resource`](Self::create_or_update_resource) over `objs`, in
    /// order, stopping at the first failure
    pub async fn create_or_update_resources<'a, M, I>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        objs: I,
    ) -> Result<(), ReconcileError>
    where
        M: ManagedObject + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut M>,
    {
        for obj in objs {
            self.create_or_update_resource(owner, namespace, obj).await?;
        }
        Ok(())
    }

    /// [`create_resource_if_not_exists`](Self::create_resource_if_not_exists) over
    /// `objs`, in order, stopping at the first failure
    pub async fn create_resources_if_not_exist<'a, M, I>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        objs: I,
    ) -> Result<(), ReconcileError>
    where
        M: ManagedObject + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut M>,
    {
        for obj in objs {
            self.create_resource_if_not_exists(owner, namespace, obj)
                .await?;
        }
        Ok(())
    }

    /// [`delete_resource`](Self::delete_resource) over `objs`, in order, stopping at
    /// the first failure
    pub async fn delete_resources<'a, M, I>(&self, objs: I) -> Result<(), ReconcileError>
    where
        M: ManagedObject + ?Sized + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        for obj in objs {
            self.delete_resource(obj).await?;
        }
        Ok(())
    }
}

/// Store identity of `obj`, recorded on the current span
fn identify<M: ManagedObject + ?Sized>(
    obj: &M,
    operation: &str,
) -> Result<ObjectKey, ReconcileError> {
    let key = ObjectKey::of(obj).map_err(|e| {
        error!("Refusing {} of unidentified object: {}", operation, e);
        e
    })?;
    Span::current().record("resource", field::display(&key));
    Ok(key)
}
