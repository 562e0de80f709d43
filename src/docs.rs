use crate::api::approvals::{ApproveBody, RejectBody, ReviewableSummary, SearchQuery};
use crate::api::attendance::{MonthQuery, SubmitMonth, UpsertEntry};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::leave::{AttachmentPayload, CreateLeave, LeaveQuery, ReviewLeave};
use crate::model::approval::ApprovalRequest;
use crate::model::employee::Employee;
use crate::model::leave::{LeaveRequest, LeaveType};
use crate::model::status::{EntryType, RecordStatus, ReviewStatus};
use crate::model::timesheet::MonthlySummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timetrack API",
        version = "1.0.0",
        description = r#"
## Timesheet & Approval System

This API powers a timesheet tracking and approval workflow for an organization.

### 🔹 Key Features
- **Timesheets**
  - Record daily entries, submit a month for review, view monthly summaries
- **Approvals**
  - Managers review pending months, approve or reject with comments
- **Leave Management**
  - Apply for leave with attachments, approve/reject requests
- **Employee Management**
  - Create, update, list, and view employee profiles

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Reviewing operations are limited to **Manager** and **Admin** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::upsert_entry,
        crate::api::attendance::submit_month,
        crate::api::attendance::my_month,

        crate::api::approvals::pending,
        crate::api::approvals::history,
        crate::api::approvals::approve,
        crate::api::approvals::reject,
        crate::api::approvals::requests,

        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            UpsertEntry,
            SubmitMonth,
            MonthQuery,
            SearchQuery,
            ApproveBody,
            RejectBody,
            ReviewableSummary,
            MonthlySummary,
            ApprovalRequest,
            RecordStatus,
            ReviewStatus,
            EntryType,
            LeaveType,
            LeaveRequest,
            CreateLeave,
            AttachmentPayload,
            ReviewLeave,
            LeaveQuery,
            CreateEmployee,
            UpdateEmployee,
            Employee,
            EmployeeListResponse
        )
    ),
    tags(
        (name = "Timesheets", description = "Timesheet entry and submission APIs"),
        (name = "Approvals", description = "Timesheet review APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Employees", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;
