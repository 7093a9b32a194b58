//! # Owner References
//!
//! Stamps a controller owner reference onto a resource before it is sent to the store,
//! so garbage collection removes owned resources together with their owner.
//!
//! The synchronizer treats stamping as best effort: it calls the stamper only when an
//! owner is supplied and ignores the returned error. Store errors, in contrast, always
//! propagate.

use super::ManagedObject;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerReferenceError {
    #[error("owner has no apiVersion/kind")]
    MissingTypeMeta,

    #[error("owner {0} has no name or uid yet")]
    MissingIdentity(String),

    #[error("cross-namespace owner references are disallowed: owner {owner} in {owner_namespace}, object in {object_namespace}")]
    CrossNamespace {
        owner: String,
        owner_namespace: String,
        object_namespace: String,
    },

    /// Another controller already owns the object
    #[error("object is already owned by another {kind} controller {name}")]
    AlreadyOwned { kind: String, name: String },
}

/// Sets the controlling owner of a resource
pub trait OwnerStamper: Send + Sync {
    fn set_controller_reference(
        &self,
        owner: &dyn ManagedObject,
        object: &mut ObjectMeta,
    ) -> Result<(), OwnerReferenceError>;
}

/// Default stamper with controller-runtime `SetControllerReference` semantics
///
/// - the owner must carry type information, a name and a uid
/// - a namespaced owner may only own objects in its own namespace
/// - an existing reference to the same owner is replaced, any other controller
///   reference is an `AlreadyOwned` error
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerReferenceStamper;

impl OwnerStamper for ControllerReferenceStamper {
    fn set_controller_reference(
        &self,
        owner: &dyn ManagedObject,
        object: &mut ObjectMeta,
    ) -> Result<(), OwnerReferenceError> {
        let types = owner
            .type_meta()
            .filter(|t| !t.api_version.is_empty() && !t.kind.is_empty())
            .ok_or(OwnerReferenceError::MissingTypeMeta)?;
        let owner_meta = owner.meta();
        let (Some(name), Some(uid)) = (owner_meta.name.clone(), owner_meta.uid.clone()) else {
            return Err(OwnerReferenceError::MissingIdentity(types.kind));
        };

        if let Some(owner_namespace) = owner_meta.namespace.as_deref().filter(|ns| !ns.is_empty())
        {
            let object_namespace = object.namespace.as_deref().unwrap_or_default();
            if object_namespace != owner_namespace {
                return Err(OwnerReferenceError::CrossNamespace {
                    owner: name,
                    owner_namespace: owner_namespace.to_string(),
                    object_namespace: object_namespace.to_string(),
                });
            }
        }

        let reference = OwnerReference {
            api_version: types.api_version,
            kind: types.kind,
            name,
            uid,
            controller: Some(true),
            block_owner_deletion: Some(true),
        };

        let references = object.owner_references.get_or_insert_with(Vec::new);
        if let Some(existing) = references
            .iter()
            .find(|r| r.controller == Some(true) && !same_owner(r, &reference))
        {
            return Err(OwnerReferenceError::AlreadyOwned {
                kind: existing.kind.clone(),
                name: existing.name.clone(),
            });
        }

        match references.iter_mut().find(|r| same_owner(r, &reference)) {
            Some(existing) => *existing = reference,
            None => references.push(reference),
        }
        Ok(())
    }
}

/// Same group, kind and name; the version part of apiVersion is ignored
fn same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    let group = |api_version: &str| {
        api_version
            .split_once('/')
            .map(|(g, _)| g.to_string())
            .unwrap_or_default()
    };
    group(&a.api_version) == group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::ConfigMap;

    fn owner(namespace: Option<&str>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("quay-app".to_string()),
                namespace: namespace.map(str::to_string),
                uid: Some("owner-uid".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn object_meta(namespace: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some("quay-config".to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_stamps_controller_reference() {
        let mut meta = object_meta("quay");
        ControllerReferenceStamper
            .set_controller_reference(&owner(Some("quay")), &mut meta)
            .unwrap();

        let refs = meta.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, "Deployment");
        assert_eq!(refs[0].api_version, "apps/v1");
        assert_eq!(refs[0].uid, "owner-uid");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));
    }

    #[test]
    fn test_restamping_same_owner_is_idempotent() {
        let mut meta = object_meta("quay");
        let owner = owner(Some("quay"));
        ControllerReferenceStamper
            .set_controller_reference(&owner, &mut meta)
            .unwrap();
        ControllerReferenceStamper
            .set_controller_reference(&owner, &mut meta)
            .unwrap();

        assert_eq!(meta.owner_references.unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_cross_namespace_owner() {
        let mut meta = object_meta("other");
        let err = ControllerReferenceStamper
            .set_controller_reference(&owner(Some("quay")), &mut meta)
            .unwrap_err();

        assert!(matches!(err, OwnerReferenceError::CrossNamespace { .. }));
        assert!(meta.owner_references.is_none());
    }

    #[test]
    fn test_cluster_scoped_owner_may_own_any_namespace() {
        let mut meta = object_meta("other");
        ControllerReferenceStamper
            .set_controller_reference(&owner(None), &mut meta)
            .unwrap();
        assert_eq!(meta.owner_references.unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_second_controller() {
        let mut meta = object_meta("quay");
        meta.owner_references = Some(vec![OwnerReference {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            name: "someone-else".to_string(),
            uid: "other-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);

        let err = ControllerReferenceStamper
            .set_controller_reference(&owner(Some("quay")), &mut meta)
            .unwrap_err();
        assert_eq!(
            err,
            OwnerReferenceError::AlreadyOwned {
                kind: "ConfigMap".to_string(),
                name: "someone-else".to_string(),
            }
        );
    }

    #[test]
    fn test_owner_without_uid_is_rejected() {
        let mut unsaved = ConfigMap::default();
        unsaved.metadata.name = Some("not-created-yet".to_string());
        let mut meta = object_meta("quay");

        let err = ControllerReferenceStamper
            .set_controller_reference(&unsaved, &mut meta)
            .unwrap_err();
        assert_eq!(
            err,
            OwnerReferenceError::MissingIdentity("ConfigMap".to_string())
        );
    }
}
