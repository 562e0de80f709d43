use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::status::{EntryType, RecordStatus};

/// One employee's entry for a single calendar day. Exactly one row exists per
/// (employee_id, date); edits overwrite in place.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Non-negative; 0 means a non-work day (leave or holiday).
    #[schema(example = 8.0)]
    pub hours_worked: f64,
    #[schema(example = "work", value_type = String)]
    pub entry_type: EntryType,
    /// Free text: leave reason, or the reviewer's comment after review.
    pub note: Option<String>,
    #[schema(example = "pending", value_type = String)]
    pub status: RecordStatus,
    pub reviewer_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for inserting or overwriting a day's entry.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub entry_type: EntryType,
    pub note: Option<String>,
    pub status: RecordStatus,
}
