use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave::LeaveRequest;
use crate::model::status::{RecordStatus, ReviewStatus};
use crate::model::timesheet::MonthlySummary;

/// Type-specific payload of a reviewable item. Each variant carries only the
/// fields that are meaningful for its kind.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApprovalKind {
    Leave {
        #[schema(format = "date", value_type = String)]
        start_date: NaiveDate,
        #[schema(format = "date", value_type = String)]
        end_date: NaiveDate,
    },
    Expenses {
        amount: f64,
    },
    Timesheet {
        year: i32,
        month: u32,
    },
}

/// Generalized reviewable item, shaped for the approvals feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRequest {
    /// Stable identifier within its source ("leave-17", "timesheet-42-2024-3").
    pub id: String,
    pub employee_id: u64,
    pub employee_name: String,
    #[serde(flatten)]
    pub kind: ApprovalKind,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[schema(example = "pending", value_type = String)]
    pub status: ReviewStatus,
    pub notes: Option<String>,
    pub document_url: Option<String>,
    pub reviewer_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    pub fn from_leave(request: &LeaveRequest, employee_name: String) -> Self {
        Self {
            id: format!("leave-{}", request.id),
            employee_id: request.employee_id,
            employee_name,
            kind: ApprovalKind::Leave {
                start_date: request.start_date,
                end_date: request.end_date,
            },
            submitted_at: request.created_at,
            status: request.status,
            notes: request.notes.clone(),
            document_url: request.attachment_path.clone(),
            reviewer_id: request.reviewer_id,
            reviewed_at: request.reviewed_at,
        }
    }

    pub fn from_timesheet(summary: &MonthlySummary, employee_name: String) -> Self {
        let status = match summary.status {
            RecordStatus::Approved => ReviewStatus::Approved,
            RecordStatus::Rejected => ReviewStatus::Rejected,
            RecordStatus::Draft | RecordStatus::Pending => ReviewStatus::Pending,
        };
        Self {
            id: format!(
                "timesheet-{}-{}-{}",
                summary.employee_id, summary.year, summary.month
            ),
            employee_id: summary.employee_id,
            employee_name,
            kind: ApprovalKind::Timesheet {
                year: summary.year,
                month: summary.month,
            },
            submitted_at: summary.submitted_at,
            status,
            notes: None,
            document_url: None,
            reviewer_id: summary.reviewer_id,
            reviewed_at: summary.reviewed_at,
        }
    }

    /// reviewed_at/reviewer_id accompany every non-pending status.
    pub fn review_fields_consistent(&self) -> bool {
        match self.status {
            ReviewStatus::Pending => self.reviewer_id.is_none() && self.reviewed_at.is_none(),
            _ => self.reviewer_id.is_some() && self.reviewed_at.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timesheet::SummaryKey;
    use chrono::TimeZone;

    fn summary(status: RecordStatus) -> MonthlySummary {
        let mut summary = MonthlySummary::empty(SummaryKey {
            employee_id: 1,
            year: 2024,
            month: 3,
        });
        summary.status = status;
        if status.is_terminal() {
            summary.reviewer_id = Some(99);
            summary.reviewed_at = Some(Utc.with_ymd_and_hms(2024, 4, 3, 16, 30, 0).unwrap());
        }
        summary
    }

    #[test]
    fn reviewed_timesheet_feed_items_carry_the_reviewer() {
        let item = ApprovalRequest::from_timesheet(
            &summary(RecordStatus::Approved),
            "John Smith".into(),
        );

        assert_eq!(item.status, ReviewStatus::Approved);
        assert_eq!(item.reviewer_id, Some(99));
        assert!(item.reviewed_at.is_some());
        assert!(item.review_fields_consistent());
    }

    #[test]
    fn pending_timesheet_feed_items_have_no_review_fields() {
        let item = ApprovalRequest::from_timesheet(
            &summary(RecordStatus::Pending),
            "John Smith".into(),
        );

        assert_eq!(item.status, ReviewStatus::Pending);
        assert_eq!(item.reviewer_id, None);
        assert_eq!(item.reviewed_at, None);
        assert!(item.review_fields_consistent());
    }
}
