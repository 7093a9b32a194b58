//! # Templated Resources
//!
//! Batch synchronization of the resources rendered from a [`ManifestTemplate`].

use super::ReconcilerBase;
use crate::controller::templates::{process_template_array, ManifestTemplate};
use crate::error::ReconcileError;
use crate::resource::ManagedObject;
use kube::core::DynamicObject;
use serde::Serialize;
use tracing::error;

impl ReconcilerBase {
    fn render<T: Serialize>(
        &self,
        template: &ManifestTemplate,
        data: &T,
    ) -> Result<Vec<DynamicObject>, ReconcileError> {
        process_template_array(template, data).map_err(|e| {
            let _entered = self.span.enter();
            error!("Unable to process template {}: {}", template.name(), e);
            ReconcileError::Template(e)
        })
    }

    /// Render `template` and create or update every resource in order
    pub async fn create_or_update_templated_resources<T: Serialize>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        template: &ManifestTemplate,
        data: &T,
    ) -> Result<(), ReconcileError> {
        let mut objects = self.render(template, data)?;
        self.create_or_update_resources(owner, namespace, objects.iter_mut())
            .await
    }

    /// Render `template` and create every resource that does not exist yet
    pub async fn create_if_not_exist_templated_resources<T: Serialize>(
        &self,
        owner: Option<&dyn ManagedObject>,
        namespace: Option<&str>,
        template: &ManifestTemplate,
        data: &T,
    ) -> Result<(), ReconcileError> {
        let mut objects = self.render(template, data)?;
        self.create_resources_if_not_exist(owner, namespace, objects.iter_mut())
            .await
    }

    /// Render `template` and delete every resource
    ///
    /// Resources are deleted from their rendered namespace; `namespace`, when given,
    /// overrides it.
    pub async fn delete_templated_resources<T: Serialize>(
        &self,
        namespace: Option<&str>,
        template: &ManifestTemplate,
        data: &T,
    ) -> Result<(), ReconcileError> {
        let mut objects = self.render(template, data)?;
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            for obj in &mut objects {
                obj.metadata.namespace = Some(ns.to_string());
            }
        }
        self.delete_resources(objects.iter()).await
    }
}
