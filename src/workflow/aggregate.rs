//! Pure projection from flat attendance rows to per-employee monthly
//! summaries. No store access; callers fetch rows first and re-run this on
//! every read so the aggregate can never drift from its source records.

use std::collections::BTreeMap;

use crate::model::attendance::AttendanceRecord;
use crate::model::status::{EntryType, RecordStatus};
use crate::model::timesheet::{MonthlySummary, SummaryKey};

/// Group attendance rows into one summary per (employee, year, month).
///
/// Entries end up in chronological order, `total_hours` sums the raw hours
/// (fractional half-days included), and the summary status follows the
/// dominance policy on [`RecordStatus`]. An empty input yields an empty map.
pub fn aggregate_by_employee_month(
    records: impl IntoIterator<Item = AttendanceRecord>,
) -> BTreeMap<SummaryKey, MonthlySummary> {
    let mut summaries: BTreeMap<SummaryKey, MonthlySummary> = BTreeMap::new();

    for record in records {
        let key = SummaryKey::of(&record);
        let summary = summaries
            .entry(key)
            .or_insert_with(|| MonthlySummary::empty(key));

        summary.total_hours += record.hours_worked;
        if record.hours_worked > 0.0 {
            summary.work_days += 1;
        }
        if record.entry_type == EntryType::Leave {
            summary.leave_days += 1;
        }

        // Earliest creation stamps the submission; the latest update of a
        // terminal row stamps the review.
        match (summary.submitted_at, record.created_at) {
            (Some(current), Some(created)) if created < current => {
                summary.submitted_at = Some(created)
            }
            (None, Some(created)) => summary.submitted_at = Some(created),
            _ => {}
        }
        if record.status.is_terminal() {
            let newer = match (summary.reviewed_at, record.updated_at) {
                (Some(current), Some(updated)) => updated > current,
                (None, Some(_)) => true,
                _ => false,
            };
            if newer {
                summary.reviewed_at = record.updated_at;
                summary.reviewer_id = record.reviewer_id;
            }
        }

        summary.entries.push(record);
    }

    for summary in summaries.values_mut() {
        summary.entries.sort_by_key(|e| e.date);
        summary.status = RecordStatus::dominant(summary.entries.iter().map(|e| e.status))
            .unwrap_or(RecordStatus::Draft);
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeZone, Utc};

    fn day(
        employee_id: u64,
        date: &str,
        hours: f64,
        entry_type: EntryType,
        status: RecordStatus,
    ) -> AttendanceRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        AttendanceRecord {
            id: 0,
            employee_id,
            date,
            hours_worked: hours,
            entry_type,
            note: None,
            status,
            reviewer_id: None,
            reviewed_at: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(aggregate_by_employee_month([]).is_empty());
    }

    #[test]
    fn one_summary_per_employee_month_regardless_of_order() {
        // Interleave two employees and two months of one of them.
        let rows = vec![
            day(2, "2024-01-10", 8.0, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-02-01", 8.0, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-01-05", 8.0, EntryType::Work, RecordStatus::Pending),
            day(2, "2024-01-11", 8.0, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-01-06", 8.0, EntryType::Work, RecordStatus::Pending),
        ];
        let summaries = aggregate_by_employee_month(rows);

        assert_eq!(summaries.len(), 3);
        let jan_e1 = &summaries[&SummaryKey {
            employee_id: 1,
            year: 2024,
            month: 1,
        }];
        assert_eq!(jan_e1.entries.len(), 2);
        let jan_e2 = &summaries[&SummaryKey {
            employee_id: 2,
            year: 2024,
            month: 1,
        }];
        assert_eq!(jan_e2.entries.len(), 2);
    }

    #[test]
    fn entries_are_sorted_chronologically() {
        let rows = vec![
            day(1, "2024-03-20", 8.0, EntryType::Work, RecordStatus::Draft),
            day(1, "2024-03-01", 8.0, EntryType::Work, RecordStatus::Draft),
            day(1, "2024-03-10", 8.0, EntryType::Work, RecordStatus::Draft),
        ];
        let summaries = aggregate_by_employee_month(rows);
        let summary = summaries.values().next().unwrap();
        let days: Vec<u32> = summary.entries.iter().map(|e| e.date.day()).collect();
        assert_eq!(days, vec![1, 10, 20]);
    }

    #[test]
    fn fractional_hours_sum_exactly() {
        let rows = vec![
            day(1, "2024-03-01", 4.0, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-03-04", 7.5, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-03-05", 0.25, EntryType::Work, RecordStatus::Pending),
        ];
        let summaries = aggregate_by_employee_month(rows);
        let summary = summaries.values().next().unwrap();
        assert_eq!(summary.total_hours, 11.75);
        assert_eq!(summary.work_days, 3);
    }

    #[test]
    fn total_hours_equals_sum_of_entries() {
        let rows: Vec<_> = (1..=15)
            .map(|d| {
                day(
                    1,
                    &format!("2024-03-{:02}", d),
                    if d % 3 == 0 { 4.5 } else { 8.0 },
                    EntryType::Work,
                    RecordStatus::Pending,
                )
            })
            .collect();
        let summaries = aggregate_by_employee_month(rows);
        let summary = summaries.values().next().unwrap();
        let expected: f64 = summary.entries.iter().map(|e| e.hours_worked).sum();
        assert_eq!(summary.total_hours, expected);
    }

    #[test]
    fn leave_days_counted_separately_from_holidays() {
        let rows = vec![
            day(1, "2024-03-01", 8.0, EntryType::Work, RecordStatus::Pending),
            day(1, "2024-03-02", 0.0, EntryType::Holiday, RecordStatus::Pending),
            day(1, "2024-03-04", 0.0, EntryType::Leave, RecordStatus::Pending),
            day(1, "2024-03-05", 0.0, EntryType::Leave, RecordStatus::Pending),
        ];
        let summaries = aggregate_by_employee_month(rows);
        let summary = summaries.values().next().unwrap();
        assert_eq!(summary.leave_days, 2);
        assert_eq!(summary.work_days, 1);
        assert_eq!(summary.total_hours, 8.0);
    }

    #[test]
    fn pending_dominates_draft_in_mixed_month() {
        let rows = vec![
            day(1, "2024-03-01", 8.0, EntryType::Work, RecordStatus::Draft),
            day(1, "2024-03-04", 8.0, EntryType::Work, RecordStatus::Pending),
        ];
        let summaries = aggregate_by_employee_month(rows);
        assert_eq!(
            summaries.values().next().unwrap().status,
            RecordStatus::Pending
        );
    }

    #[test]
    fn clean_pending_march_aggregates_to_one_summary() {
        // 22 weekdays at 8 hours, a full working month with no absences.
        let weekdays: Vec<_> = (1..=31)
            .filter_map(|d| NaiveDate::from_ymd_opt(2024, 3, d))
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .take(22)
            .map(|d| {
                day(
                    1,
                    &d.format("%Y-%m-%d").to_string(),
                    8.0,
                    EntryType::Work,
                    RecordStatus::Pending,
                )
            })
            .collect();
        assert_eq!(weekdays.len(), 22);

        let summaries = aggregate_by_employee_month(weekdays);
        assert_eq!(summaries.len(), 1);
        let summary = summaries.values().next().unwrap();
        assert_eq!(summary.total_hours, 176.0);
        assert_eq!(summary.work_days, 22);
        assert_eq!(summary.leave_days, 0);
        assert_eq!(summary.status, RecordStatus::Pending);
    }

    #[test]
    fn review_timestamp_and_reviewer_come_from_latest_terminal_update() {
        let mut early = day(1, "2024-03-01", 8.0, EntryType::Work, RecordStatus::Approved);
        early.reviewer_id = Some(98);
        early.updated_at = Some(Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap());
        let mut late = day(1, "2024-03-04", 8.0, EntryType::Work, RecordStatus::Approved);
        late.reviewer_id = Some(99);
        late.updated_at = Some(Utc.with_ymd_and_hms(2024, 4, 3, 16, 30, 0).unwrap());

        let summaries = aggregate_by_employee_month(vec![late.clone(), early]);
        let summary = summaries.values().next().unwrap();
        assert_eq!(summary.reviewed_at, late.updated_at);
        assert_eq!(summary.reviewer_id, Some(99));
        assert_eq!(summary.status, RecordStatus::Approved);
    }
}
