//! # Manifest Templates
//!
//! Renders Handlebars templates into Kubernetes resources.
//!
//! A template renders to a YAML stream. Every document in the stream may be a single
//! resource, a sequence of resources or a `kind: List` with `items`; empty documents
//! are skipped. Rendering runs in strict mode, so a reference to a missing field is an
//! error instead of an empty string.
//!
//! ```rust
//! use reconcile_utils::controller::templates::{process_template_array, ManifestTemplate};
//! use serde_json::json;
//!
//! let template = ManifestTemplate::new(
//!     "config",
//!     "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {{name}}-config\n",
//! )
//! .unwrap();
//! let objects = process_template_array(&template, &json!({"name": "registry"})).unwrap();
//! assert_eq!(objects[0].metadata.name.as_deref(), Some("registry-config"));
//! ```

use crate::error::TemplateError;
use handlebars::Handlebars;
use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A compiled manifest template
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    name: String,
    registry: Handlebars<'static>,
}

impl ManifestTemplate {
    /// Compile `source` under `name`
    pub fn new(name: &str, source: &str) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Output is YAML, not HTML
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(name, source)
            .map_err(|e| TemplateError::Compile {
                name: name.to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            name: name.to_string(),
            registry,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with `data`
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        Ok(self.registry.render(&self.name, data)?)
    }
}

/// Render `template` with `data` and parse the result into resources
pub fn process_template_array<T: Serialize>(
    template: &ManifestTemplate,
    data: &T,
) -> Result<Vec<DynamicObject>, TemplateError> {
    let rendered = template.render(data)?;
    let objects = parse_manifests(&rendered)?;
    debug!(
        "Template {} rendered {} resources",
        template.name(),
        objects.len()
    );
    Ok(objects)
}

/// Parse a multi-document YAML stream into resources
pub fn parse_manifests(yaml: &str) -> Result<Vec<DynamicObject>, TemplateError> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)?;
        collect_resources(value, &mut objects)?;
    }
    Ok(objects)
}

fn collect_resources(
    value: serde_yaml::Value,
    objects: &mut Vec<DynamicObject>,
) -> Result<(), TemplateError> {
    match value {
        serde_yaml::Value::Null => Ok(()),
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                collect_resources(item, objects)?;
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(mut map) if is_list(&map) => {
            match map.remove("items") {
                Some(items) => collect_resources(items, objects),
                None => Ok(()),
            }
        }
        other => {
            let json: serde_json::Value = serde_yaml::from_value(other)?;
            objects.push(serde_json::from_value(json)?);
            Ok(())
        }
    }
}

fn is_list(map: &serde_yaml::Mapping) -> bool {
    map.get("kind").and_then(serde_yaml::Value::as_str) == Some("List")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEPLOYMENT: &str = r"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{name}}
  namespace: {{namespace}}
spec:
  replicas: {{replicas}}
---
apiVersion: v1
kind: Service
metadata:
  name: {{name}}
  namespace: {{namespace}}
";

    #[test]
    fn test_renders_multi_document_stream() {
        let template = ManifestTemplate::new("quay", DEPLOYMENT).unwrap();
        let objects = process_template_array(
            &template,
            &json!({"name": "quay-app", "namespace": "quay", "replicas": 3}),
        )
        .unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].types.as_ref().unwrap().kind, "Deployment");
        assert_eq!(objects[0].data["spec"]["replicas"], 3);
        assert_eq!(objects[1].types.as_ref().unwrap().kind, "Service");
        assert_eq!(objects[1].metadata.namespace.as_deref(), Some("quay"));
    }

    #[test]
    fn test_sequence_and_list_documents() {
        let yaml = r"
- apiVersion: v1
  kind: ConfigMap
  metadata:
    name: one
- apiVersion: v1
  kind: ConfigMap
  metadata:
    name: two
---
---
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Secret
    metadata:
      name: three
";
        let objects = parse_manifests(yaml).unwrap();
        let names: Vec<_> = objects
            .iter()
            .filter_map(|o| o.metadata.name.as_deref())
            .collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    #[test]
    fn test_missing_field_fails_in_strict_mode() {
        let template = ManifestTemplate::new("quay", DEPLOYMENT).unwrap();
        let err = process_template_array(&template, &json!({"name": "quay-app"})).unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)));
    }

    #[test]
    fn test_invalid_template_fails_to_compile() {
        let err = ManifestTemplate::new("broken", "name: {{#if}}").unwrap_err();
        assert!(matches!(err, TemplateError::Compile { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let template =
            ManifestTemplate::new("cm", "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\ndata:\n  url: \"{{url}}\"\n")
                .unwrap();
        let objects =
            process_template_array(&template, &json!({"url": "https://quay.io/?a=1&b=2"})).unwrap();
        assert_eq!(objects[0].data["data"]["url"], "https://quay.io/?a=1&b=2");
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = parse_manifests("kind: [unterminated").unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)));
    }

    #[test]
    fn test_scalar_document_is_not_a_resource() {
        let err = parse_manifests("just a string").unwrap_err();
        assert!(matches!(err, TemplateError::Resource(_)));
    }
}
