use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::status::RecordStatus;

/// Grouping key for one employee's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SummaryKey {
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
}

impl SummaryKey {
    pub fn of(record: &AttendanceRecord) -> Self {
        Self {
            employee_id: record.employee_id,
            year: record.date.year(),
            month: record.date.month(),
        }
    }
}

/// Derived aggregate of one employee's attendance rows for one month.
/// Never persisted; recomputed from live rows on every read.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub employee_id: u64,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    pub entries: Vec<AttendanceRecord>,
    #[schema(example = 176.0)]
    pub total_hours: f64,
    #[schema(example = 22)]
    pub work_days: u32,
    #[schema(example = 0)]
    pub leave_days: u32,
    #[schema(example = "pending", value_type = String)]
    pub status: RecordStatus,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Reviewer of the latest terminal entry, if the month was reviewed.
    pub reviewer_id: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl MonthlySummary {
    pub fn empty(key: SummaryKey) -> Self {
        Self {
            employee_id: key.employee_id,
            year: key.year,
            month: key.month,
            entries: Vec::new(),
            total_hours: 0.0,
            work_days: 0,
            leave_days: 0,
            status: RecordStatus::Draft,
            submitted_at: None,
            reviewer_id: None,
            reviewed_at: None,
        }
    }
}

/// Inclusive first and last day of a calendar month. `None` when the month
/// number is out of range.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first
        .checked_add_months(Months::new(1))?
        .pred_opt()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_whole_month() {
        let (first, last) = month_bounds(2024, 3).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn month_bounds_handle_leap_february() {
        let (_, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2023, 2).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn month_bounds_reject_invalid_month() {
        assert!(month_bounds(2024, 0).is_none());
        assert!(month_bounds(2024, 13).is_none());
    }
}
