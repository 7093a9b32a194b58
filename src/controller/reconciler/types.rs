//! # Reconciler Types
//!
//! [`ReconcilerBase`] bundles the collaborators a concrete controller needs for one
//! reconciliation pass: the object store, event notifier, owner stamper, clock,
//! backoff policy and the tracing span every operation is logged under.

use crate::clock::{Clock, SystemClock};
use crate::config::ReconcilerConfig;
use crate::controller::backoff::StatusBackoff;
use crate::discovery::{api_for_resource, dynamic_api_for_gvk, run_discovery};
use crate::error::ReconcileError;
use crate::events::{EventNotifier, KubeEventNotifier};
use crate::resource::{gvk_from_type_meta, ControllerReferenceStamper, ManagedObject, OwnerStamper};
use crate::store::{KubeStore, ObjectStore};
use kube::api::{Api, ApiResource};
use kube::core::DynamicObject;
use kube::discovery::Discovery;
use kube::Client;
use std::sync::Arc;
use tracing::{info_span, Span};

/// Shared state and collaborators of a reconciler
///
/// Cheap to clone; every collaborator is reference counted.
#[derive(Clone)]
pub struct ReconcilerBase {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) notifier: Arc<dyn EventNotifier>,
    pub(crate) stamper: Arc<dyn OwnerStamper>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) backoff: StatusBackoff,
    pub(crate) config: ReconcilerConfig,
    pub(crate) client: Option<Client>,
    pub(crate) span: Span,
}

impl std::fmt::Debug for ReconcilerBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcilerBase")
            .field("backoff", &self.backoff)
            .field("config", &self.config)
            .field("client", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl ReconcilerBase {
    /// Reconciler over `store` publishing events through `notifier`
    ///
    /// Uses the wall clock, the default backoff policy and controller-reference
    /// semantics for owner stamping. There is no Kubernetes client, so discovery
    /// and dynamic clients are unavailable until one is attached with
    /// [`with_client`](Self::with_client).
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, notifier: Arc<dyn EventNotifier>) -> Self {
        Self {
            store,
            notifier,
            stamper: Arc::new(ControllerReferenceStamper),
            clock: Arc::new(SystemClock),
            backoff: StatusBackoff::default(),
            config: ReconcilerConfig::default(),
            client: None,
            span: info_span!("reconciler"),
        }
    }

    /// Reconciler talking to the cluster behind `client`
    #[must_use]
    pub fn for_cluster(client: Client, config: ReconcilerConfig) -> Self {
        let store = Arc::new(KubeStore::new(client.clone()));
        let notifier = Arc::new(KubeEventNotifier::new(
            client.clone(),
            &config.event_reporter,
            config.event_reporter_instance.clone(),
        ));
        let span = info_span!("reconciler", controller = %config.event_reporter);
        Self::new(store, notifier)
            .with_config(config)
            .with_client(client)
            .with_span(span)
    }

    /// Like [`for_cluster`](Self::for_cluster), resolving API resources through discovery
    pub async fn for_cluster_with_discovery(
        client: Client,
        config: ReconcilerConfig,
    ) -> Result<Self, ReconcileError> {
        let store = Arc::new(KubeStore::with_discovery(client.clone()).await?);
        Ok(Self {
            store,
            ..Self::for_cluster(client, config)
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_owner_stamper(mut self, stamper: Arc<dyn OwnerStamper>) -> Self {
        self.stamper = stamper;
        self
    }

    /// Replace the configuration; the backoff policy follows it
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.backoff = StatusBackoff::from_config(&config);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Parent span for every operation of this reconciler
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn EventNotifier> {
        &self.notifier
    }

    #[must_use]
    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    #[must_use]
    pub fn backoff(&self) -> &StatusBackoff {
        &self.backoff
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    fn require_client(&self) -> Result<&Client, ReconcileError> {
        self.client.as_ref().ok_or(ReconcileError::NoClient)
    }

    /// Run API discovery against the cluster
    pub async fn discovery_client(&self) -> Result<Discovery, ReconcileError> {
        let client = self.require_client()?;
        run_discovery(client.clone()).await
    }

    /// Dynamic client for `resource`
    ///
    /// Namespaced when `namespace` is given, cluster-wide otherwise.
    pub fn dynamic_api_for_resource(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>, ReconcileError> {
        let client = self.require_client()?;
        let namespace = namespace.filter(|ns| !ns.is_empty());
        Ok(api_for_resource(
            client.clone(),
            resource,
            namespace.is_some(),
            namespace,
        ))
    }

    /// Dynamic client for the type of `obj`, in its namespace
    pub async fn dynamic_api_for_object(
        &self,
        obj: &DynamicObject,
    ) -> Result<Api<DynamicObject>, ReconcileError> {
        let client = self.require_client()?;
        let types = obj.types.as_ref().ok_or_else(|| {
            ReconcileError::TypeMismatch("object has no apiVersion/kind".to_string())
        })?;
        let gvk = gvk_from_type_meta(types)?;
        dynamic_api_for_gvk(client, &gvk, obj.metadata.namespace.as_deref()).await
    }
}

/// Validation hooks a concrete controller can override
///
/// The defaults accept every object.
pub trait ReconcileHooks {
    /// Whether `obj` is semantically valid; an error aborts the pass
    fn is_valid(&self, _obj: &dyn ManagedObject) -> Result<bool, ReconcileError> {
        Ok(true)
    }

    /// Whether `obj` already carries its defaulted fields
    fn is_initialized(&self, _obj: &dyn ManagedObject) -> bool {
        true
    }
}

impl ReconcileHooks for ReconcilerBase {}
