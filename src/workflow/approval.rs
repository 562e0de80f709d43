//! Reviewer decisions over one employee-month of attendance rows.
//!
//! The month is treated as one atomic batch: validation runs before any
//! store write, and the mutation itself is a single bulk update scoped by
//! employee and inclusive date range so rows of other employees or other
//! months are never touched.

use chrono::Utc;
use derive_more::Display;
use tracing::info;

use crate::model::status::RecordStatus;
use crate::model::timesheet::MonthlySummary;
use crate::store::{AttendanceFilter, AttendanceStore, ReviewPatch, StoreError};
use crate::workflow::aggregate::aggregate_by_employee_month;
use crate::workflow::Reviewer;

#[derive(Debug, Display)]
pub enum ApprovalError {
    #[display(fmt = "a reason is required to reject a timesheet")]
    ReasonRequired,
    #[display(fmt = "{} is not a valid month", _0)]
    InvalidPeriod(u32),
    #[display(fmt = "reviewers cannot review their own timesheet")]
    SelfReview,
    #[display(fmt = "no timesheet entries found for that employee and month")]
    NotFound,
    #[display(fmt = "this timesheet has already been reviewed")]
    AlreadyReviewed,
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for ApprovalError {}

impl From<StoreError> for ApprovalError {
    fn from(e: StoreError) -> Self {
        ApprovalError::Store(e)
    }
}

pub struct ApprovalEngine<S> {
    store: S,
}

impl<S: AttendanceStore> ApprovalEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Approve every entry of the employee's month. An optional comment
    /// overwrites each row's note.
    pub async fn approve(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        reviewer: Reviewer,
        comment: Option<&str>,
    ) -> Result<(), ApprovalError> {
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        self.review(
            employee_id,
            year,
            month,
            reviewer,
            RecordStatus::Approved,
            comment,
        )
        .await
    }

    /// Reject the employee's month. The reason is mandatory and is validated
    /// before anything is read or written.
    pub async fn reject(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        reviewer: Reviewer,
        reason: &str,
    ) -> Result<(), ApprovalError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApprovalError::ReasonRequired);
        }
        self.review(
            employee_id,
            year,
            month,
            reviewer,
            RecordStatus::Rejected,
            Some(reason),
        )
        .await
    }

    /// Move a month's Draft rows to Pending (employee submitting their own
    /// timesheet for review). No reviewer identity is recorded.
    pub async fn submit(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> Result<u64, ApprovalError> {
        let filter = AttendanceFilter::employee_month(employee_id, year, month)
            .ok_or(ApprovalError::InvalidPeriod(month))?
            .with_statuses(vec![RecordStatus::Draft]);
        let patch = ReviewPatch {
            status: RecordStatus::Pending,
            note: None,
            reviewer_id: None,
            reviewed_at: None,
        };
        let affected = self.store.apply_review(&filter, &patch).await?;
        if affected == 0 {
            return Err(ApprovalError::NotFound);
        }
        info!(employee_id, year, month, affected, "timesheet submitted");
        Ok(affected)
    }

    /// All summaries currently awaiting review.
    pub async fn pending_summaries(&self) -> Result<Vec<MonthlySummary>, ApprovalError> {
        self.summaries(vec![RecordStatus::Pending]).await
    }

    /// Reviewed summaries (approved or rejected).
    pub async fn history_summaries(&self) -> Result<Vec<MonthlySummary>, ApprovalError> {
        self.summaries(vec![RecordStatus::Approved, RecordStatus::Rejected])
            .await
    }

    async fn summaries(
        &self,
        statuses: Vec<RecordStatus>,
    ) -> Result<Vec<MonthlySummary>, ApprovalError> {
        let filter = AttendanceFilter::default().with_statuses(statuses);
        let rows = self.store.select(&filter).await?;
        Ok(aggregate_by_employee_month(rows).into_values().collect())
    }

    async fn review(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        reviewer: Reviewer,
        status: RecordStatus,
        note: Option<&str>,
    ) -> Result<(), ApprovalError> {
        // Compared within the employee id space; the reviewer's account id
        // says nothing about who they are as an employee.
        if reviewer.employee_id == Some(employee_id) {
            return Err(ApprovalError::SelfReview);
        }
        let filter = AttendanceFilter::employee_month(employee_id, year, month)
            .ok_or(ApprovalError::InvalidPeriod(month))?;

        let rows = self.store.select(&filter).await?;
        if rows.is_empty() {
            return Err(ApprovalError::NotFound);
        }
        // Terminal states are final for this submission; partial re-review of
        // a month is never a legitimate steady state.
        if rows.iter().any(|r| r.status.is_terminal()) {
            return Err(ApprovalError::AlreadyReviewed);
        }

        let scoped = filter.with_statuses(vec![RecordStatus::Draft, RecordStatus::Pending]);
        let patch = ReviewPatch {
            status,
            note: note.map(str::to_string),
            reviewer_id: Some(reviewer.user_id),
            reviewed_at: Some(Utc::now()),
        };
        let affected = self.store.apply_review(&scoped, &patch).await?;
        if affected == 0 {
            return Err(ApprovalError::NotFound);
        }

        info!(
            employee_id,
            year,
            month,
            reviewer_id = reviewer.user_id,
            status = %patch.status,
            affected,
            "timesheet reviewed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::NewAttendance;
    use crate::model::status::EntryType;
    use crate::store::memory::MemoryStore;
    use crate::store::AttendanceStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn reviewer(user_id: u64) -> Reviewer {
        Reviewer {
            user_id,
            employee_id: None,
        }
    }

    fn entry(employee_id: u64, date: &str, status: RecordStatus) -> NewAttendance {
        NewAttendance {
            employee_id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            hours_worked: 8.0,
            entry_type: EntryType::Work,
            note: None,
            status,
        }
    }

    fn engine_with_store() -> (ApprovalEngine<Arc<MemoryStore>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ApprovalEngine::new(Arc::clone(&store)), store)
    }

    #[actix_web::test]
    async fn approve_transitions_every_row_in_the_month() {
        let (engine, store) = engine_with_store();
        for d in ["2024-03-01", "2024-03-04", "2024-03-05"] {
            store.seed_attendance(entry(1, d, RecordStatus::Pending));
        }

        engine.approve(1, 2024, 3, reviewer(99), None).await.unwrap();

        for row in store.attendance_snapshot() {
            assert_eq!(row.status, RecordStatus::Approved);
            assert_eq!(row.reviewer_id, Some(99));
            assert!(row.reviewed_at.is_some());
        }
    }

    #[actix_web::test]
    async fn approve_is_scoped_to_employee_and_month() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-01-10", RecordStatus::Pending));
        store.seed_attendance(entry(1, "2024-02-10", RecordStatus::Pending));
        store.seed_attendance(entry(2, "2024-01-10", RecordStatus::Pending));

        engine.approve(1, 2024, 1, reviewer(99), None).await.unwrap();

        for row in store.attendance_snapshot() {
            let touched = row.employee_id == 1 && row.date.to_string().starts_with("2024-01");
            if touched {
                assert_eq!(row.status, RecordStatus::Approved);
            } else {
                assert_eq!(row.status, RecordStatus::Pending, "row {:?} leaked", row);
            }
        }
    }

    #[actix_web::test]
    async fn second_approve_fails_without_changing_state() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-03-01", RecordStatus::Pending));

        engine.approve(1, 2024, 3, reviewer(99), None).await.unwrap();
        let after_first = store.attendance_snapshot();

        let second = engine.approve(1, 2024, 3, reviewer(99), None).await;
        assert!(matches!(second, Err(ApprovalError::AlreadyReviewed)));

        let after_second = store.attendance_snapshot();
        assert_eq!(after_first.len(), after_second.len());
        for (a, b) in after_first.iter().zip(after_second.iter()) {
            assert_eq!(a.status, b.status);
            assert_eq!(a.reviewed_at, b.reviewed_at);
        }
    }

    #[actix_web::test]
    async fn reject_without_reason_issues_no_store_calls() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-03-01", RecordStatus::Pending));

        let result = engine.reject(1, 2024, 3, reviewer(99), "   ").await;
        assert!(matches!(result, Err(ApprovalError::ReasonRequired)));
        assert_eq!(store.attendance_write_count(), 0);
    }

    #[actix_web::test]
    async fn reject_overwrites_notes_with_the_reason() {
        let (engine, store) = engine_with_store();
        let mut row = entry(2, "2024-03-15", RecordStatus::Pending);
        row.hours_worked = 0.0;
        row.note = Some("unexplained absence".into());
        store.seed_attendance(row);

        engine
            .reject(2, 2024, 3, reviewer(99), "Missing documentation")
            .await
            .unwrap();

        let rows = store.attendance_snapshot();
        assert_eq!(rows[0].status, RecordStatus::Rejected);
        assert_eq!(rows[0].note.as_deref(), Some("Missing documentation"));
    }

    #[actix_web::test]
    async fn review_of_missing_month_is_not_found() {
        let (engine, _store) = engine_with_store();
        let result = engine.approve(1, 2024, 3, reviewer(99), None).await;
        assert!(matches!(result, Err(ApprovalError::NotFound)));
    }

    #[actix_web::test]
    async fn invalid_month_is_rejected_before_store_access() {
        let (engine, store) = engine_with_store();
        let result = engine.approve(1, 2024, 13, reviewer(99), None).await;
        assert!(matches!(result, Err(ApprovalError::InvalidPeriod(13))));
        assert_eq!(store.attendance_write_count(), 0);
    }

    #[actix_web::test]
    async fn reviewers_cannot_approve_their_own_month() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(7, "2024-03-01", RecordStatus::Pending));

        let own_month = Reviewer {
            user_id: 3,
            employee_id: Some(7),
        };
        let result = engine.approve(7, 2024, 3, own_month, None).await;
        assert!(matches!(result, Err(ApprovalError::SelfReview)));
        assert_eq!(store.attendance_write_count(), 0);
    }

    #[actix_web::test]
    async fn matching_account_id_alone_is_not_self_review() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(7, "2024-03-01", RecordStatus::Pending));

        // The reviewer's account id happens to equal the target employee id,
        // but they are a different person (their own employee record is 42).
        let colliding = Reviewer {
            user_id: 7,
            employee_id: Some(42),
        };
        engine.approve(7, 2024, 3, colliding, None).await.unwrap();

        let rows = store.attendance_snapshot();
        assert_eq!(rows[0].status, RecordStatus::Approved);
        assert_eq!(rows[0].reviewer_id, Some(7));
    }

    #[actix_web::test]
    async fn rejected_days_can_be_overwritten_and_resubmitted() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-03-01", RecordStatus::Pending));
        store.seed_attendance(entry(1, "2024-03-04", RecordStatus::Pending));

        engine
            .reject(1, 2024, 3, reviewer(99), "missing docs")
            .await
            .unwrap();

        // Correcting a rejected day is a fresh Draft write over the same row.
        for d in ["2024-03-01", "2024-03-04"] {
            store
                .upsert_day(&entry(1, d, RecordStatus::Draft))
                .await
                .unwrap();
        }

        let affected = engine.submit(1, 2024, 3).await.unwrap();
        assert_eq!(affected, 2);

        engine.approve(1, 2024, 3, reviewer(99), None).await.unwrap();
        assert!(store
            .attendance_snapshot()
            .iter()
            .all(|r| r.status == RecordStatus::Approved));
    }

    #[actix_web::test]
    async fn month_with_a_terminal_row_is_conflicted_as_a_whole() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-03-01", RecordStatus::Pending));
        store.seed_attendance(entry(1, "2024-03-04", RecordStatus::Approved));

        let result = engine.approve(1, 2024, 3, reviewer(99), None).await;
        assert!(matches!(result, Err(ApprovalError::AlreadyReviewed)));

        // The pending row stayed pending; no partial transition happened.
        let pending: Vec<_> = store
            .attendance_snapshot()
            .into_iter()
            .filter(|r| r.status == RecordStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 1);
    }

    #[actix_web::test]
    async fn submit_moves_draft_rows_to_pending() {
        let (engine, store) = engine_with_store();
        store.seed_attendance(entry(1, "2024-03-01", RecordStatus::Draft));
        store.seed_attendance(entry(1, "2024-03-04", RecordStatus::Draft));

        let affected = engine.submit(1, 2024, 3).await.unwrap();
        assert_eq!(affected, 2);
        for row in store.attendance_snapshot() {
            assert_eq!(row.status, RecordStatus::Pending);
            assert_eq!(row.reviewer_id, None);
            assert_eq!(row.reviewed_at, None);
        }
    }

    #[actix_web::test]
    async fn approving_then_reaggregating_shows_an_approved_summary() {
        let (engine, store) = engine_with_store();
        for d in 1..=5 {
            store.seed_attendance(entry(
                1,
                &format!("2024-03-{:02}", d),
                RecordStatus::Pending,
            ));
        }

        engine
            .approve(1, 2024, 3, reviewer(99), Some("Looks good"))
            .await
            .unwrap();

        let history = engine.history_summaries().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RecordStatus::Approved);
        assert_eq!(history[0].entries.len(), 5);
        assert_eq!(history[0].reviewer_id, Some(99));

        let pending = engine.pending_summaries().await.unwrap();
        assert!(pending.is_empty());
    }
}
