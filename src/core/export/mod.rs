//! Export orchestration
//!
//! This module provides the request-level export logic:
//! - [`ExportSession`]: one driver bound to one request
//! - reconciliation of local grades against external records
//! - sequential grade submission and its outcome
//! - [`ExportCoordinator`]: the full request flow

pub mod batch;
pub mod coordinator;
pub mod reconcile;
pub mod session;
pub mod summary;

pub use batch::{BatchProcessor, SubmissionItem};
pub use coordinator::{ExportCoordinator, ExportRequest, ExportResponse, Submission};
pub use reconcile::StudentReconciliation;
pub use session::{ExportSession, SubmittedFields};
pub use summary::{StudentSubmission, SubmissionOutcome};
