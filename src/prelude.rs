//! Common imports for controllers built on this crate

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::ReconcilerConfig;
pub use crate::controller::backoff::StatusBackoff;
pub use crate::controller::reconciler::{ReconcileHooks, ReconcileResult, ReconcilerBase};
pub use crate::controller::templates::{process_template_array, ManifestTemplate};
pub use crate::crd::{ReconcileOutcome, ReconcileStatus, ReconcileStatusAware};
pub use crate::error::{ReconcileError, StoreError, TemplateError};
pub use crate::events::{EventNotifier, EventSeverity, KubeEventNotifier, NoopNotifier};
pub use crate::managed_object;
pub use crate::resource::{ControllerReferenceStamper, ManagedObject, ObjectKey, OwnerStamper};
pub use crate::store::{KubeStore, MemoryStore, ObjectStore};
