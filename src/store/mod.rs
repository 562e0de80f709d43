use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave::LeaveRequest;
use crate::model::status::{RecordStatus, ReviewStatus};
use crate::model::timesheet::month_bounds;

pub mod fs_docs;
pub mod mysql;

#[cfg(test)]
pub mod memory;

/// Failure talking to a backing store. Reads and writes surface this to the
/// caller; nothing is retried automatically.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
    #[display(fmt = "document store: {}", _0)]
    Io(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Predicate over attendance rows: employee equality, inclusive date range,
/// status membership. All parts optional and ANDed together.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub statuses: Option<Vec<RecordStatus>>,
}

impl AttendanceFilter {
    /// Everything one employee logged inside one calendar month. `None` when
    /// the month number is invalid.
    pub fn employee_month(employee_id: u64, year: i32, month: u32) -> Option<Self> {
        let (first, last) = month_bounds(year, month)?;
        Some(Self {
            employee_id: Some(employee_id),
            from: Some(first),
            to: Some(last),
            statuses: None,
        })
    }

    pub fn with_statuses(mut self, statuses: Vec<RecordStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// In-memory evaluation of the predicate, shared by the test store.
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        if let Some(id) = self.employee_id {
            if record.employee_id != id {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.date > to {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&record.status) {
                return false;
            }
        }
        true
    }
}

/// Fields written onto every row matched by a review (or submit) action.
#[derive(Debug, Clone)]
pub struct ReviewPatch {
    pub status: RecordStatus,
    /// When set, overwrites the row's note (reviewer comment / reject reason).
    pub note: Option<String>,
    pub reviewer_id: Option<u64>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn select(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Insert the day's entry, overwriting in place if one already exists for
    /// (employee_id, date).
    async fn upsert_day(&self, row: &NewAttendance) -> Result<(), StoreError>;

    /// Bulk status transition over every row matched by `filter`, as a single
    /// atomic statement. Returns the number of rows touched.
    async fn apply_review(
        &self,
        filter: &AttendanceFilter,
        patch: &ReviewPatch,
    ) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: crate::model::leave::LeaveType,
    pub reason: String,
    pub attachment_path: Option<String>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, request: &NewLeaveRequest) -> Result<u64, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Transition one request out of Pending. The pending guard is part of the
    /// update predicate, so a request that was already reviewed reports zero
    /// affected rows instead of being re-applied.
    async fn apply_review(
        &self,
        id: u64,
        status: ReviewStatus,
        reviewer_id: u64,
        reviewed_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store the bytes and return the path reference to persist alongside the
    /// owning record.
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError>;

    /// Compensating cleanup for a failed two-step write.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

// Shared handles delegate, so services can hold an Arc to the same store the
// caller keeps for inspection.
#[async_trait]
impl<T: AttendanceStore + ?Sized> AttendanceStore for std::sync::Arc<T> {
    async fn select(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        (**self).select(filter).await
    }

    async fn upsert_day(&self, row: &NewAttendance) -> Result<(), StoreError> {
        (**self).upsert_day(row).await
    }

    async fn apply_review(
        &self,
        filter: &AttendanceFilter,
        patch: &ReviewPatch,
    ) -> Result<u64, StoreError> {
        (**self).apply_review(filter, patch).await
    }
}

#[async_trait]
impl<T: LeaveStore + ?Sized> LeaveStore for std::sync::Arc<T> {
    async fn insert(&self, request: &NewLeaveRequest) -> Result<u64, StoreError> {
        (**self).insert(request).await
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        (**self).list(filter).await
    }

    async fn apply_review(
        &self,
        id: u64,
        status: ReviewStatus,
        reviewer_id: u64,
        reviewed_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<u64, StoreError> {
        (**self)
            .apply_review(id, status, reviewer_id, reviewed_at, notes)
            .await
    }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        (**self).upload(path, bytes).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        (**self).delete(path).await
    }
}
