//! Bulk reconciliation of a submitted list into write operations

pub mod apply;
pub mod engine;
pub mod model;

pub use apply::{apply_operations, reconcile_and_apply, reconcile_store};
pub use engine::{reconcile, reconcile_with};
pub use model::{
    AppliedSummary, AuditStamp, ReconcileOptions, ReconcileReport, ReconciliationOperation,
    SubmissionKey,
};
