use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave::LeaveRequest;
use crate::model::status::ReviewStatus;
use crate::store::{
    AttendanceFilter, AttendanceStore, LeaveFilter, LeaveStore, NewLeaveRequest, ReviewPatch,
    StoreError,
};

const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, hours_worked, entry_type, note, status, \
     reviewer_id, reviewed_at, created_at, updated_at";

const LEAVE_COLUMNS: &str = "id, employee_id, start_date, end_date, leave_type, reason, \
     attachment_path, status, notes, reviewer_id, reviewed_at, created_at";

/// MySQL-backed implementation of the attendance and leave stores.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// id -> "First Last" for every employee, used to label summaries.
    pub async fn employee_names(&self) -> Result<HashMap<u64, String>, StoreError> {
        let rows = sqlx::query_as::<_, (u64, String, String)>(
            "SELECT id, first_name, last_name FROM employees",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, first, last)| (id, format!("{} {}", first, last)))
            .collect())
    }
}

// Appends the filter conditions to `sql`; bindings are applied by the caller
// in the same order.
fn push_attendance_conditions(sql: &mut String, filter: &AttendanceFilter) {
    if filter.employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    if filter.from.is_some() {
        sql.push_str(" AND date >= ?");
    }
    if filter.to.is_some() {
        sql.push_str(" AND date <= ?");
    }
    if let Some(statuses) = &filter.statuses {
        if !statuses.is_empty() {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({})", placeholders));
        }
    }
}

macro_rules! bind_attendance_filter {
    ($query:ident, $filter:expr) => {{
        let mut q = $query;
        if let Some(id) = $filter.employee_id {
            q = q.bind(id);
        }
        if let Some(from) = $filter.from {
            q = q.bind(from);
        }
        if let Some(to) = $filter.to {
            q = q.bind(to);
        }
        if let Some(statuses) = &$filter.statuses {
            for status in statuses {
                q = q.bind(status.to_string());
            }
        }
        q
    }};
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn select(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut sql = format!(
            "SELECT {} FROM attendance WHERE 1=1",
            ATTENDANCE_COLUMNS
        );
        push_attendance_conditions(&mut sql, filter);
        sql.push_str(" ORDER BY date ASC");

        let query = sqlx::query_as::<_, AttendanceRecord>(&sql);
        let query = bind_attendance_filter!(query, filter);

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn upsert_day(&self, row: &NewAttendance) -> Result<(), StoreError> {
        // One row per (employee_id, date); a second write overwrites in place.
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, hours_worked, entry_type, note, status)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                hours_worked = VALUES(hours_worked),
                entry_type = VALUES(entry_type),
                note = VALUES(note),
                status = VALUES(status),
                reviewer_id = NULL,
                reviewed_at = NULL,
                updated_at = NOW()
            "#,
        )
        .bind(row.employee_id)
        .bind(row.date)
        .bind(row.hours_worked)
        .bind(row.entry_type.to_string())
        .bind(&row.note)
        .bind(row.status.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_review(
        &self,
        filter: &AttendanceFilter,
        patch: &ReviewPatch,
    ) -> Result<u64, StoreError> {
        let mut sql = String::from(
            "UPDATE attendance SET status = ?, note = COALESCE(?, note), \
             reviewer_id = ?, reviewed_at = ?, updated_at = NOW() WHERE 1=1",
        );
        push_attendance_conditions(&mut sql, filter);

        let query = sqlx::query(&sql)
            .bind(patch.status.to_string())
            .bind(&patch.note)
            .bind(patch.reviewer_id)
            .bind(patch.reviewed_at);
        let query = bind_attendance_filter!(query, filter);

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert(&self, request: &NewLeaveRequest) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, reason, attachment_path, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(request.employee_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.leave_type.to_string())
        .bind(&request.reason)
        .bind(&request.attachment_path)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut sql = format!("SELECT {} FROM leave_requests WHERE 1=1", LEAVE_COLUMNS);
        if filter.employee_id.is_some() {
            sql.push_str(" AND employee_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, LeaveRequest>(&sql);
        if let Some(id) = filter.employee_id {
            query = query.bind(id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn apply_review(
        &self,
        id: u64,
        status: ReviewStatus,
        reviewer_id: u64,
        reviewed_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<u64, StoreError> {
        // The pending guard lives in the predicate: a request that already
        // reached a terminal state matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, reviewer_id = ?, reviewed_at = ?, notes = COALESCE(?, notes)
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status.to_string())
        .bind(reviewer_id)
        .bind(reviewed_at)
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
