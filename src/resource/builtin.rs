//! Built-in Kubernetes types managed through the synchronizer.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, PersistentVolumeClaim, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};

crate::managed_object!(ConfigMap);
crate::managed_object!(Secret);
crate::managed_object!(Service);
crate::managed_object!(ServiceAccount);
crate::managed_object!(PersistentVolumeClaim);
crate::managed_object!(Namespace);
crate::managed_object!(Deployment);
crate::managed_object!(StatefulSet);
crate::managed_object!(DaemonSet);
crate::managed_object!(Job);
crate::managed_object!(CronJob);
crate::managed_object!(Ingress);
crate::managed_object!(Role);
crate::managed_object!(RoleBinding);
crate::managed_object!(ClusterRole);
crate::managed_object!(ClusterRoleBinding);
