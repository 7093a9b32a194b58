//! # Errors
//!
//! Error taxonomy for store operations and reconciler helpers.
//!
//! Store errors are classified so the synchronizer can treat `NotFound` and
//! `AlreadyExists` as benign where the operation is idempotent. `Conflict` is always
//! surfaced and never retried here.

use thiserror::Error;

/// Error returned by an [`ObjectStore`](crate::store::ObjectStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: String, name: String },

    /// Stale optimistic-concurrency token
    #[error("conflict writing {kind} {name}: {message}")]
    Conflict {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),

    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The object handed to the store has no usable identity
    #[error("invalid object: {0}")]
    Invalid(String),

    /// The store could not be reached or refused to serve the request
    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Classify a kube client error for the object `kind`/`name`
    ///
    /// 404 maps to `NotFound`; 409 maps to `AlreadyExists` when the API server reports
    /// that reason and to `Conflict` otherwise.
    #[must_use]
    pub fn from_kube(err: kube::Error, kind: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
                StoreError::AlreadyExists {
                    kind: kind.to_string(),
                    name: name.to_string(),
                }
            }
            kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
                kind: kind.to_string(),
                name: name.to_string(),
                message: api_err.message,
            },
            other => StoreError::Api(other),
        }
    }
}

/// Error returned by the reconciler helpers
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The object does not satisfy the identified, storable contract
    #[error("object is not a storable resource: {0}")]
    TypeMismatch(String),

    /// The status subresource could not be written
    #[error("failed to persist reconcile status: {0}")]
    StatusPersist(#[source] StoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Discovery or dynamic clients need a Kubernetes client
    #[error("no Kubernetes client configured")]
    NoClient,

    #[error("discovery failed: {0}")]
    Discovery(#[source] kube::Error),
}

/// Error raised while expanding a manifest template into resources
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template {name}: {source}")]
    Compile {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("rendered manifest is not a list of resources: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("rendered manifest entry is not a resource: {0}")]
    Resource(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} test"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_classifies_not_found() {
        let err = StoreError::from_kube(api_error(404, "NotFound"), "ConfigMap", "cm");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ConfigMap cm not found");
    }

    #[test]
    fn test_classifies_already_exists() {
        let err = StoreError::from_kube(api_error(409, "AlreadyExists"), "ConfigMap", "cm");
        assert!(err.is_already_exists());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_classifies_conflict() {
        let err = StoreError::from_kube(api_error(409, "Conflict"), "ConfigMap", "cm");
        assert!(err.is_conflict());
        assert!(err.to_string().contains("Conflict test"));
    }

    #[test]
    fn test_other_api_errors_pass_through() {
        let err = StoreError::from_kube(api_error(403, "Forbidden"), "ConfigMap", "cm");
        assert!(matches!(err, StoreError::Api(_)));
    }

    #[test]
    fn test_store_error_is_transparent_in_reconcile_error() {
        let err = ReconcileError::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.to_string(), "object store unavailable: connection refused");
    }
}
