//! # Events
//!
//! Best-effort notifications about reconciled resources. Publishing never fails or
//! blocks the caller: events are queued and delivery errors are logged and dropped.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Client;
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use std::fmt::Display;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Severity of a published event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Normal,
    Warning,
}

impl From<EventSeverity> for EventType {
    fn from(severity: EventSeverity) -> Self {
        match severity {
            EventSeverity::Normal => EventType::Normal,
            EventSeverity::Warning => EventType::Warning,
        }
    }
}

/// Fire-and-forget event sink
///
/// `notify` is awaited on the reconcile path before the status is recorded, so
/// implementations must return promptly and hand slow delivery off to a background task.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(
        &self,
        reference: &ObjectReference,
        severity: EventSeverity,
        reason: &str,
        action: &str,
        message: &str,
    );
}

/// Publishes Kubernetes events through the runtime event recorder
///
/// Each event is published on a spawned task; `notify` returns without waiting for
/// the API server. Must be used from within a Tokio runtime.
#[derive(Clone)]
pub struct KubeEventNotifier {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventNotifier").finish_non_exhaustive()
    }
}

impl KubeEventNotifier {
    #[must_use]
    pub fn new(client: Client, controller: &str, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventNotifier for KubeEventNotifier {
    async fn notify(
        &self,
        reference: &ObjectReference,
        severity: EventSeverity,
        reason: &str,
        action: &str,
        message: &str,
    ) {
        let event = Event {
            type_: severity.into(),
            reason: reason.to_string(),
            note: Some(message.to_string()),
            action: action.to_string(),
            secondary: None,
        };
        let recorder = self.recorder.clone();
        let reference = reference.clone();
        let object = reference.name.clone().unwrap_or_else(|| "unknown".to_string());
        spawn_publish(reason.to_string(), object, async move {
            recorder.publish(&event, &reference).await
        });
    }
}

/// Run `publish` in the background, logging a delivery failure
fn spawn_publish<F, E>(reason: String, object: String, publish: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = publish.await {
            warn!("Failed to publish {} event for {}: {}", reason, object, e);
        }
    })
}

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn notify(
        &self,
        _reference: &ObjectReference,
        _severity: EventSeverity,
        _reason: &str,
        _action: &str,
        _message: &str,
    ) {
    }
}
