//! # Managed Resources
//!
//! The minimal contract a resource must satisfy to be synchronized with the store:
//! type information, object metadata (identity, version token, owner references) and a
//! JSON representation. The reconcile status capability is an optional add-on queried
//! per call through [`ManagedObject::reconcile_status_aware`].
//!
//! - `builtin`: `ManagedObject` for the built-in Kubernetes types controllers usually own
//! - `owner`: controller owner-reference stamping

mod builtin;
pub mod owner;

use crate::crd::ReconcileStatusAware;
use crate::error::ReconcileError;
use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::{DynamicObject, GroupVersionKind, TypeMeta};

pub use owner::{ControllerReferenceStamper, OwnerReferenceError, OwnerStamper};

/// A resource that can be synchronized with an [`ObjectStore`](crate::store::ObjectStore)
pub trait ManagedObject: Send + Sync {
    /// apiVersion and kind; `None` when the resource does not carry type information
    fn type_meta(&self) -> Option<TypeMeta>;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Full JSON representation as sent to the store
    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Status capability query; `None` unless the resource tracks a reconcile status
    fn reconcile_status_aware(&self) -> Option<&dyn ReconcileStatusAware> {
        None
    }

    fn reconcile_status_aware_mut(&mut self) -> Option<&mut dyn ReconcileStatusAware> {
        None
    }
}

impl ManagedObject for DynamicObject {
    fn type_meta(&self) -> Option<TypeMeta> {
        self.types.clone()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<T: ManagedObject + ?Sized> ManagedObject for Box<T> {
    fn type_meta(&self) -> Option<TypeMeta> {
        (**self).type_meta()
    }

    fn meta(&self) -> &ObjectMeta {
        (**self).meta()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        (**self).meta_mut()
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        (**self).to_value()
    }

    fn reconcile_status_aware(&self) -> Option<&dyn ReconcileStatusAware> {
        (**self).reconcile_status_aware()
    }

    fn reconcile_status_aware_mut(&mut self) -> Option<&mut dyn ReconcileStatusAware> {
        (**self).reconcile_status_aware_mut()
    }
}

/// Implement [`ManagedObject`] for typed `kube::Resource`s with static type information
///
/// ```ignore
/// managed_object!(ConfigMap);
/// // opt into status-driven backoff (the type must implement ReconcileStatusAware)
/// managed_object!(QuayRegistry, status_aware);
/// ```
#[macro_export]
macro_rules! managed_object {
    (@impl $ty:ty, { $($extra:tt)* }) => {
        impl $crate::resource::ManagedObject for $ty {
            fn type_meta(&self) -> ::std::option::Option<::kube::core::TypeMeta> {
                ::std::option::Option::Some(::kube::core::TypeMeta {
                    api_version: <$ty as ::kube::Resource>::api_version(&()).into_owned(),
                    kind: <$ty as ::kube::Resource>::kind(&()).into_owned(),
                })
            }

            fn meta(&self) -> &::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                ::kube::Resource::meta(self)
            }

            fn meta_mut(
                &mut self,
            ) -> &mut ::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                ::kube::Resource::meta_mut(self)
            }

            fn to_value(&self) -> ::std::result::Result<::serde_json::Value, ::serde_json::Error> {
                let mut value = ::serde_json::to_value(self)?;
                if let ::std::option::Option::Some(map) = value.as_object_mut() {
                    map.insert(
                        "apiVersion".to_string(),
                        <$ty as ::kube::Resource>::api_version(&()).into_owned().into(),
                    );
                    map.insert(
                        "kind".to_string(),
                        <$ty as ::kube::Resource>::kind(&()).into_owned().into(),
                    );
                }
                ::std::result::Result::Ok(value)
            }

            $($extra)*
        }
    };
    ($ty:ty, status_aware) => {
        $crate::managed_object!(@impl $ty, {
            fn reconcile_status_aware(
                &self,
            ) -> ::std::option::Option<&dyn $crate::crd::ReconcileStatusAware> {
                ::std::option::Option::Some(self)
            }

            fn reconcile_status_aware_mut(
                &mut self,
            ) -> ::std::option::Option<&mut dyn $crate::crd::ReconcileStatusAware> {
                ::std::option::Option::Some(self)
            }
        });
    };
    ($ty:ty) => {
        $crate::managed_object!(@impl $ty, {});
    };
}

/// Store identity of a resource: group/version/kind plus namespace and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub gvk: GroupVersionKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Identity of `obj`, or `TypeMismatch` when it lacks type information or a name
    pub fn of<M: ManagedObject + ?Sized>(obj: &M) -> Result<Self, ReconcileError> {
        let types = obj.type_meta().ok_or_else(|| {
            ReconcileError::TypeMismatch("object has no apiVersion/kind".to_string())
        })?;
        let gvk = gvk_from_type_meta(&types)?;
        let name = obj
            .meta()
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ReconcileError::TypeMismatch(format!("{} has no metadata.name", gvk.kind))
            })?;
        Ok(Self {
            gvk,
            namespace: obj.meta().namespace.clone().filter(|ns| !ns.is_empty()),
            name,
        })
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.gvk.kind, ns, self.name),
            None => write!(f, "{} {}", self.gvk.kind, self.name),
        }
    }
}

/// Parse `apiVersion` (`group/version` or core `version`) and kind
pub fn gvk_from_type_meta(types: &TypeMeta) -> Result<GroupVersionKind, ReconcileError> {
    if types.kind.is_empty() || types.api_version.is_empty() {
        return Err(ReconcileError::TypeMismatch(format!(
            "incomplete type information: apiVersion={:?}, kind={:?}",
            types.api_version, types.kind
        )));
    }
    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };
    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// Convert a managed object into the dynamic representation the store works with
pub fn to_dynamic<M: ManagedObject + ?Sized>(obj: &M) -> Result<DynamicObject, ReconcileError> {
    let types = obj.type_meta().ok_or_else(|| {
        ReconcileError::TypeMismatch("object has no apiVersion/kind".to_string())
    })?;
    let value = obj
        .to_value()
        .map_err(|e| ReconcileError::TypeMismatch(format!("cannot serialize object: {e}")))?;
    let mut dynamic: DynamicObject = serde_json::from_value(value)
        .map_err(|e| ReconcileError::TypeMismatch(format!("not a Kubernetes object: {e}")))?;
    dynamic.types = Some(types);
    dynamic.metadata = obj.meta().clone();
    Ok(dynamic)
}

/// Reference used when publishing events about `obj`
pub fn object_reference<M: ManagedObject + ?Sized>(
    obj: &M,
) -> Result<ObjectReference, ReconcileError> {
    let key = ObjectKey::of(obj)?;
    let meta = obj.meta();
    Ok(ObjectReference {
        api_version: Some(key.gvk.api_version()),
        kind: Some(key.gvk.kind),
        name: Some(key.name),
        namespace: key.namespace,
        uid: meta.uid.clone(),
        resource_version: meta.resource_version.clone(),
        field_path: None,
    })
}

/// Copy the store-assigned identity fields from `stored` onto `obj`
pub(crate) fn adopt_stored_identity<M: ManagedObject + ?Sized>(obj: &mut M, stored: &ObjectMeta) {
    let meta = obj.meta_mut();
    meta.resource_version.clone_from(&stored.resource_version);
    if stored.uid.is_some() {
        meta.uid.clone_from(&stored.uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use std::collections::BTreeMap;

    fn config_map(name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("quay".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([("key".to_string(), "value".to_string())])),
            ..Default::default()
        }
    }

    #[test]
    fn test_gvk_from_core_api_version() {
        let gvk = gvk_from_type_meta(&TypeMeta {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
        })
        .unwrap();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "ConfigMap");
    }

    #[test]
    fn test_gvk_from_grouped_api_version() {
        let gvk = gvk_from_type_meta(&TypeMeta {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
        })
        .unwrap();
        assert_eq!(gvk.group, "apps");
        assert_eq!(gvk.version, "v1");
    }

    #[test]
    fn test_typed_resource_converts_to_dynamic() {
        let cm = config_map("settings");
        let dynamic = to_dynamic(&cm).unwrap();

        assert_eq!(dynamic.types.as_ref().unwrap().kind, "ConfigMap");
        assert_eq!(dynamic.metadata.name.as_deref(), Some("settings"));
        assert_eq!(dynamic.data["data"]["key"], "value");
    }

    #[test]
    fn test_dynamic_object_without_types_is_type_mismatch() {
        let obj = DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some("anonymous".to_string()),
                ..Default::default()
            },
            data: serde_json::json!({}),
        };
        assert!(matches!(
            ObjectKey::of(&obj),
            Err(ReconcileError::TypeMismatch(_))
        ));
        assert!(matches!(to_dynamic(&obj), Err(ReconcileError::TypeMismatch(_))));
    }

    #[test]
    fn test_missing_name_is_type_mismatch() {
        let mut cm = config_map("settings");
        cm.metadata.name = None;
        let err = ObjectKey::of(&cm).unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }

    #[test]
    fn test_object_reference_carries_identity() {
        let mut cm = config_map("settings");
        cm.metadata.uid = Some("uid-1".to_string());
        let reference = object_reference(&cm).unwrap();

        assert_eq!(reference.kind.as_deref(), Some("ConfigMap"));
        assert_eq!(reference.api_version.as_deref(), Some("v1"));
        assert_eq!(reference.namespace.as_deref(), Some("quay"));
        assert_eq!(reference.uid.as_deref(), Some("uid-1"));
    }

    #[test]
    fn test_typed_resource_is_not_status_aware_by_default() {
        let cm = config_map("settings");
        assert!(cm.reconcile_status_aware().is_none());
    }
}
