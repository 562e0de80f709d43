use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::status::ReviewStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

/// A leave application. Created Pending by the employee, mutated only by a
/// reviewer; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual", value_type = String)]
    pub leave_type: LeaveType,
    pub reason: String,
    /// Reference into the document store, set when a supporting file was
    /// uploaded with the request.
    pub attachment_path: Option<String>,
    #[schema(example = "pending", value_type = String)]
    pub status: ReviewStatus,
    /// Reviewer's comment, set on rejection (and optionally on approval).
    pub notes: Option<String>,
    pub reviewer_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// reviewer_id/reviewed_at are set if and only if the request left Pending.
    pub fn review_fields_consistent(&self) -> bool {
        let reviewed = self.reviewer_id.is_some() && self.reviewed_at.is_some();
        match self.status {
            ReviewStatus::Pending => self.reviewer_id.is_none() && self.reviewed_at.is_none(),
            ReviewStatus::Approved | ReviewStatus::Rejected => reviewed,
        }
    }
}
