//! Sequential grade submission
//!
//! Sends one student at a time, in selection order. A failure for one
//! student becomes that student's error message and the batch carries on;
//! there is no retry and nothing is rolled back.

use super::summary::{StudentSubmission, SubmissionOutcome};
use crate::adapters::drivers::ExportDriver;
use crate::domain::ids::{ExternalId, UserId};
use crate::domain::strings::{self, codes};
use crate::domain::{FieldValue, LocalGrade, ReconciliationMessage, RequestContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Everything sent for one selected student
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionItem {
    pub user_id: UserId,
    pub external_id: ExternalId,
    pub grade: LocalGrade,

    /// Cleaned values of the editable fields
    pub fields: BTreeMap<String, FieldValue>,
}

/// Batch processor for grade submissions
pub struct BatchProcessor {
    driver: Arc<dyn ExportDriver>,
}

impl BatchProcessor {
    pub fn new(driver: Arc<dyn ExportDriver>) -> Self {
        Self { driver }
    }

    /// Submit every item through the driver
    ///
    /// Never fails as a whole: the outcome holds one entry per item, in the
    /// order given.
    pub async fn process_batch(
        &self,
        ctx: &RequestContext,
        items: Vec<SubmissionItem>,
    ) -> SubmissionOutcome {
        let started = Instant::now();
        let mut outcome = SubmissionOutcome::new();

        crate::log_submission_start!(self.driver.id(), ctx.course.id, items.len());

        for item in items {
            let messages = match self
                .driver
                .send_user_data(ctx, item.user_id, &item.external_id, &item.grade, &item.fields)
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    crate::log_student_send_failure!(item.user_id, item.external_id, e);
                    vec![ReconciliationMessage::error(codes::SEND_FAILED)
                        .with_text(format!("{}: {}", strings::text(codes::SEND_FAILED), e))]
                }
            };

            outcome.push(StudentSubmission {
                user_id: item.user_id,
                external_id: item.external_id,
                messages,
            });
        }

        let outcome = outcome.with_duration(started.elapsed());
        outcome.log_summary();
        outcome
    }
}
