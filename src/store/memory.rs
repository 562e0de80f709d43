//! In-memory store used by the workflow unit tests. Counts write calls so
//! tests can assert that failed validation never reaches the store.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave::LeaveRequest;
use crate::model::status::ReviewStatus;
use crate::store::{
    AttendanceFilter, AttendanceStore, DocumentStore, LeaveFilter, LeaveStore, NewLeaveRequest,
    ReviewPatch, StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    attendance: Mutex<Vec<AttendanceRecord>>,
    leaves: Mutex<Vec<LeaveRequest>>,
    documents: Mutex<Vec<String>>,
    next_attendance_id: AtomicU64,
    next_leave_id: AtomicU64,
    /// Write-call spies, incremented per call (matched rows or not).
    pub attendance_writes: AtomicUsize,
    pub leave_writes: AtomicUsize,
    /// When set, the next leave insert fails, for exercising the
    /// upload-then-insert compensation path.
    pub fail_next_leave_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_attendance(&self, row: NewAttendance) -> u64 {
        let id = self.next_attendance_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.attendance.lock().unwrap().push(AttendanceRecord {
            id,
            employee_id: row.employee_id,
            date: row.date,
            hours_worked: row.hours_worked,
            entry_type: row.entry_type,
            note: row.note,
            status: row.status,
            reviewer_id: None,
            reviewed_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        });
        id
    }

    pub fn attendance_snapshot(&self) -> Vec<AttendanceRecord> {
        self.attendance.lock().unwrap().clone()
    }

    pub fn leave_snapshot(&self) -> Vec<LeaveRequest> {
        self.leaves.lock().unwrap().clone()
    }

    pub fn stored_documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }

    pub fn attendance_write_count(&self) -> usize {
        self.attendance_writes.load(Ordering::SeqCst)
    }

    pub fn leave_write_count(&self) -> usize {
        self.leave_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn select(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut rows: Vec<AttendanceRecord> = self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }

    async fn upsert_day(&self, row: &NewAttendance) -> Result<(), StoreError> {
        self.attendance_writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.attendance.lock().unwrap();
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| r.employee_id == row.employee_id && r.date == row.date)
        {
            existing.hours_worked = row.hours_worked;
            existing.entry_type = row.entry_type;
            existing.note = row.note.clone();
            existing.status = row.status;
            existing.reviewer_id = None;
            existing.reviewed_at = None;
            existing.updated_at = Some(Utc::now());
            return Ok(());
        }
        let id = self.next_attendance_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.push(AttendanceRecord {
            id,
            employee_id: row.employee_id,
            date: row.date,
            hours_worked: row.hours_worked,
            entry_type: row.entry_type,
            note: row.note.clone(),
            status: row.status,
            reviewer_id: None,
            reviewed_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn apply_review(
        &self,
        filter: &AttendanceFilter,
        patch: &ReviewPatch,
    ) -> Result<u64, StoreError> {
        self.attendance_writes.fetch_add(1, Ordering::SeqCst);
        let mut affected = 0;
        for row in self
            .attendance
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|r| filter.matches(r))
        {
            row.status = patch.status;
            if let Some(note) = &patch.note {
                row.note = Some(note.clone());
            }
            row.reviewer_id = patch.reviewer_id;
            row.reviewed_at = patch.reviewed_at;
            row.updated_at = Some(Utc::now());
            affected += 1;
        }
        Ok(affected)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(&self, request: &NewLeaveRequest) -> Result<u64, StoreError> {
        if self.fail_next_leave_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected insert failure".into()));
        }
        self.leave_writes.fetch_add(1, Ordering::SeqCst);
        let id = self.next_leave_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.leaves.lock().unwrap().push(LeaveRequest {
            id,
            employee_id: request.employee_id,
            start_date: request.start_date,
            end_date: request.end_date,
            leave_type: request.leave_type,
            reason: request.reason.clone(),
            attachment_path: request.attachment_path.clone(),
            status: ReviewStatus::Pending,
            notes: None,
            reviewer_id: None,
            reviewed_at: None,
            created_at: Some(Utc::now()),
        });
        Ok(id)
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self
            .leaves
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .leaves
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                filter.employee_id.map_or(true, |id| l.employee_id == id)
                    && filter.status.map_or(true, |s| l.status == s)
            })
            .cloned()
            .collect())
    }

    async fn apply_review(
        &self,
        id: u64,
        status: ReviewStatus,
        reviewer_id: u64,
        reviewed_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<u64, StoreError> {
        self.leave_writes.fetch_add(1, Ordering::SeqCst);
        let mut leaves = self.leaves.lock().unwrap();
        match leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == ReviewStatus::Pending)
        {
            Some(leave) => {
                leave.status = status;
                leave.reviewer_id = Some(reviewer_id);
                leave.reviewed_at = Some(reviewed_at);
                if let Some(notes) = notes {
                    leave.notes = Some(notes.to_string());
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let _ = bytes;
        self.documents.lock().unwrap().push(path.to_string());
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.documents.lock().unwrap().retain(|p| p != path);
        Ok(())
    }
}
