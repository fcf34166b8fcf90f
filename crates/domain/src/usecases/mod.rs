//! Application use cases / business logic

pub mod compare;
pub mod liveness;
pub mod maintenance;
pub mod reconcile;

pub use compare::images_equal;
pub use liveness::{LivenessClassifier, LivenessConfig, PlaceholderSignature, RateLimiter};
pub use maintenance::{MaintenanceConfig, MaintenanceError, MaintenanceScanner, MaintenanceSummary};
pub use reconcile::{ReconcileConfig, ReconcileError, ReconciliationEngine};
