//! Leave applications: validation, attachment handling, and the secondary
//! pending/approved/rejected lifecycle. An accepted application materializes
//! one zero-hour attendance row per day of the range, so the month's summary
//! picks the leave up without any extra bookkeeping.

use chrono::{NaiveDate, Utc};
use derive_more::Display;
use strum_macros::{Display as StrumDisplay, EnumString};
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::attendance::NewAttendance;
use crate::model::leave::{LeaveRequest, LeaveType};
use crate::model::status::{EntryType, RecordStatus, ReviewStatus};
use crate::store::{
    AttendanceFilter, AttendanceStore, DocumentStore, LeaveFilter, LeaveStore, NewLeaveRequest,
    ReviewPatch, StoreError,
};
use crate::workflow::Reviewer;

const MIN_REASON_CHARS: usize = 5;

#[derive(Debug, Display)]
pub enum LeaveError {
    #[display(fmt = "end date must not be before start date")]
    InvalidDateRange,
    #[display(fmt = "a reason of at least {} characters is required", MIN_REASON_CHARS)]
    ReasonTooShort,
    #[display(fmt = "a comment is required to reject a leave request")]
    CommentRequired,
    #[display(fmt = "reviewers cannot review their own leave request")]
    SelfReview,
    #[display(fmt = "leave request not found")]
    NotFound,
    #[display(fmt = "this leave request has already been reviewed")]
    AlreadyReviewed,
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for LeaveError {}

impl From<StoreError> for LeaveError {
    fn from(e: StoreError) -> Self {
        LeaveError::Store(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Supporting document submitted with the application.
pub struct LeaveAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct LeaveSubmission {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub reason: String,
    pub attachment: Option<LeaveAttachment>,
}

pub struct LeaveService<L, A, D> {
    leaves: L,
    attendance: A,
    documents: D,
}

impl<L, A, D> LeaveService<L, A, D>
where
    L: LeaveStore,
    A: AttendanceStore,
    D: DocumentStore,
{
    pub fn new(leaves: L, attendance: A, documents: D) -> Self {
        Self {
            leaves,
            attendance,
            documents,
        }
    }

    /// Validate and persist a leave application. The attachment (if any) is
    /// uploaded first; when the request row itself cannot be written, the
    /// uploaded document is deleted again so no orphaned proof survives a
    /// half-committed application.
    pub async fn submit(&self, submission: LeaveSubmission) -> Result<u64, LeaveError> {
        if submission.end_date < submission.start_date {
            return Err(LeaveError::InvalidDateRange);
        }
        let reason = submission.reason.trim();
        if reason.chars().count() < MIN_REASON_CHARS {
            return Err(LeaveError::ReasonTooShort);
        }

        let attachment_path = match &submission.attachment {
            Some(attachment) => {
                let path = document_path(submission.employee_id, &attachment.file_name);
                Some(self.documents.upload(&path, &attachment.bytes).await?)
            }
            None => None,
        };

        let request = NewLeaveRequest {
            employee_id: submission.employee_id,
            start_date: submission.start_date,
            end_date: submission.end_date,
            leave_type: submission.leave_type,
            reason: reason.to_string(),
            attachment_path: attachment_path.clone(),
        };

        let id = match self.leaves.insert(&request).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(path) = &attachment_path {
                    if let Err(cleanup) = self.documents.delete(path).await {
                        warn!(path, error = %cleanup, "failed to clean up orphaned attachment");
                    }
                }
                return Err(e.into());
            }
        };

        // Zero-hour pending rows for each requested day.
        let mut date = submission.start_date;
        while date <= submission.end_date {
            self.attendance
                .upsert_day(&NewAttendance {
                    employee_id: submission.employee_id,
                    date,
                    hours_worked: 0.0,
                    entry_type: EntryType::Leave,
                    note: Some(reason.to_string()),
                    status: RecordStatus::Pending,
                })
                .await?;
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        info!(
            leave_id = id,
            employee_id = submission.employee_id,
            leave_type = %submission.leave_type,
            "leave request submitted"
        );
        Ok(id)
    }

    /// Apply a reviewer decision to a pending request and propagate it to the
    /// materialized leave-day rows.
    pub async fn review(
        &self,
        id: u64,
        decision: ReviewDecision,
        reviewer: Reviewer,
        comment: Option<&str>,
    ) -> Result<(), LeaveError> {
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if decision == ReviewDecision::Reject && comment.is_none() {
            return Err(LeaveError::CommentRequired);
        }

        let request = self.leaves.get(id).await?.ok_or(LeaveError::NotFound)?;
        // Same employee-id-space comparison as the timesheet engine.
        if reviewer.employee_id == Some(request.employee_id) {
            return Err(LeaveError::SelfReview);
        }
        if request.status != ReviewStatus::Pending {
            return Err(LeaveError::AlreadyReviewed);
        }

        let (leave_status, record_status) = match decision {
            ReviewDecision::Approve => (ReviewStatus::Approved, RecordStatus::Approved),
            ReviewDecision::Reject => (ReviewStatus::Rejected, RecordStatus::Rejected),
        };
        let now = Utc::now();

        let affected = self
            .leaves
            .apply_review(id, leave_status, reviewer.user_id, now, comment)
            .await?;
        if affected == 0 {
            // Lost the race with another reviewer; the request is terminal now.
            return Err(LeaveError::AlreadyReviewed);
        }

        let days = AttendanceFilter {
            employee_id: Some(request.employee_id),
            from: Some(request.start_date),
            to: Some(request.end_date),
            statuses: Some(vec![RecordStatus::Draft, RecordStatus::Pending]),
        };
        self.attendance
            .apply_review(
                &days,
                &ReviewPatch {
                    status: record_status,
                    note: comment.map(str::to_string),
                    reviewer_id: Some(reviewer.user_id),
                    reviewed_at: Some(now),
                },
            )
            .await?;

        info!(
            leave_id = id,
            reviewer_id = reviewer.user_id,
            decision = %decision,
            "leave request reviewed"
        );
        Ok(())
    }

    pub async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        Ok(self.leaves.get(id).await?)
    }

    pub async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self.leaves.list(filter).await?)
    }
}

fn document_path(employee_id: u64, file_name: &str) -> String {
    let extension = file_name.rsplit('.').next().unwrap_or("bin");
    format!("leave/{}-{}.{}", employee_id, Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reviewer(user_id: u64) -> Reviewer {
        Reviewer {
            user_id,
            employee_id: None,
        }
    }

    fn service_with_store() -> (
        LeaveService<Arc<MemoryStore>, Arc<MemoryStore>, Arc<MemoryStore>>,
        Arc<MemoryStore>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let service = LeaveService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
        );
        (service, store)
    }

    fn submission(start: &str, end: &str, reason: &str) -> LeaveSubmission {
        LeaveSubmission {
            employee_id: 3,
            start_date: date(start),
            end_date: date(end),
            leave_type: LeaveType::Annual,
            reason: reason.to_string(),
            attachment: None,
        }
    }

    #[actix_web::test]
    async fn round_trip_submit_then_approve() {
        let (service, store) = service_with_store();

        let id = service
            .submit(submission("2024-06-10", "2024-06-12", "Family trip"))
            .await
            .unwrap();

        let request = store.leave_snapshot().pop().unwrap();
        assert_eq!(request.status, ReviewStatus::Pending);
        assert!(request.review_fields_consistent());

        // Three zero-hour pending leave days were materialized.
        let days = store.attendance_snapshot();
        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| {
            d.hours_worked == 0.0
                && d.entry_type == EntryType::Leave
                && d.status == RecordStatus::Pending
        }));

        service
            .review(id, ReviewDecision::Approve, reviewer(99), None)
            .await
            .unwrap();

        let request = store.leave_snapshot().pop().unwrap();
        assert_eq!(request.status, ReviewStatus::Approved);
        assert_eq!(request.reviewer_id, Some(99));
        assert!(request.reviewed_at.is_some());
        assert!(request.review_fields_consistent());

        assert!(store
            .attendance_snapshot()
            .iter()
            .all(|d| d.status == RecordStatus::Approved));
    }

    #[actix_web::test]
    async fn backwards_date_range_fails_before_any_write() {
        let (service, store) = service_with_store();

        let result = service
            .submit(submission("2024-06-12", "2024-06-10", "Family trip"))
            .await;
        assert!(matches!(result, Err(LeaveError::InvalidDateRange)));
        assert_eq!(store.leave_write_count(), 0);
        assert_eq!(store.attendance_write_count(), 0);
    }

    #[actix_web::test]
    async fn short_reason_fails_validation() {
        let (service, store) = service_with_store();

        let result = service
            .submit(submission("2024-06-10", "2024-06-12", "trip"))
            .await;
        assert!(matches!(result, Err(LeaveError::ReasonTooShort)));
        assert_eq!(store.leave_write_count(), 0);
    }

    #[actix_web::test]
    async fn reject_requires_a_comment() {
        let (service, store) = service_with_store();
        let id = service
            .submit(submission("2024-06-10", "2024-06-10", "Medical appointment"))
            .await
            .unwrap();
        let writes_before = store.leave_write_count();

        let result = service
            .review(id, ReviewDecision::Reject, reviewer(99), Some("  "))
            .await;
        assert!(matches!(result, Err(LeaveError::CommentRequired)));
        assert_eq!(store.leave_write_count(), writes_before);

        service
            .review(id, ReviewDecision::Reject, reviewer(99), Some("No cover available"))
            .await
            .unwrap();
        let request = store.leave_snapshot().pop().unwrap();
        assert_eq!(request.status, ReviewStatus::Rejected);
        assert_eq!(request.notes.as_deref(), Some("No cover available"));
    }

    #[actix_web::test]
    async fn terminal_requests_cannot_be_re_reviewed() {
        let (service, _store) = service_with_store();
        let id = service
            .submit(submission("2024-06-10", "2024-06-10", "Moving house"))
            .await
            .unwrap();

        service
            .review(id, ReviewDecision::Approve, reviewer(99), None)
            .await
            .unwrap();

        let again = service
            .review(id, ReviewDecision::Approve, reviewer(42), None)
            .await;
        assert!(matches!(again, Err(LeaveError::AlreadyReviewed)));
    }

    #[actix_web::test]
    async fn reviewing_an_unknown_id_is_not_found() {
        let (service, _store) = service_with_store();
        let result = service
            .review(404, ReviewDecision::Approve, reviewer(99), None)
            .await;
        assert!(matches!(result, Err(LeaveError::NotFound)));
    }

    #[actix_web::test]
    async fn own_leave_cannot_be_reviewed() {
        let (service, store) = service_with_store();
        let id = service
            .submit(submission("2024-06-10", "2024-06-10", "Medical appointment"))
            .await
            .unwrap();
        let writes_before = store.leave_write_count();

        // Reviewer whose employee record is the request's employee (id 3).
        let own_request = Reviewer {
            user_id: 50,
            employee_id: Some(3),
        };
        let result = service
            .review(id, ReviewDecision::Approve, own_request, None)
            .await;
        assert!(matches!(result, Err(LeaveError::SelfReview)));
        assert_eq!(store.leave_write_count(), writes_before);

        let request = store.leave_snapshot().pop().unwrap();
        assert_eq!(request.status, ReviewStatus::Pending);
    }

    #[actix_web::test]
    async fn attachment_is_stored_and_referenced() {
        let (service, store) = service_with_store();
        let mut sub = submission("2024-06-10", "2024-06-10", "Medical appointment");
        sub.attachment = Some(LeaveAttachment {
            file_name: "certificate.pdf".into(),
            bytes: vec![1, 2, 3],
        });

        service.submit(sub).await.unwrap();

        let request = store.leave_snapshot().pop().unwrap();
        let path = request.attachment_path.unwrap();
        assert!(path.ends_with(".pdf"));
        assert_eq!(store.stored_documents(), vec![path]);
    }

    #[actix_web::test]
    async fn failed_insert_cleans_up_the_uploaded_attachment() {
        let (service, store) = service_with_store();
        store.fail_next_leave_insert.store(true, Ordering::SeqCst);

        let mut sub = submission("2024-06-10", "2024-06-10", "Medical appointment");
        sub.attachment = Some(LeaveAttachment {
            file_name: "certificate.pdf".into(),
            bytes: vec![1, 2, 3],
        });

        let result = service.submit(sub).await;
        assert!(matches!(result, Err(LeaveError::Store(_))));
        assert!(store.stored_documents().is_empty());
        assert!(store.leave_snapshot().is_empty());
        assert!(store.attendance_snapshot().is_empty());
    }
}
