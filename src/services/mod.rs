pub mod reconciler;
#[cfg(feature = "api")]
pub mod web_service;

pub use reconciler::{reconcile_shared, snapshot_on_read_failure, Reconciler, SharedReconciler};
#[cfg(feature = "api")]
pub use web_service::{serve, WebState};
