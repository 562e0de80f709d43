use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::api::approval_failure;
use crate::auth::auth::AuthUser;
use crate::model::attendance::NewAttendance;
use crate::model::status::{EntryType, RecordStatus};
use crate::model::timesheet::SummaryKey;
use crate::store::mysql::MySqlStore;
use crate::store::{AttendanceFilter, AttendanceStore};
use crate::workflow::aggregate::aggregate_by_employee_month;
use crate::workflow::approval::ApprovalEngine;

#[derive(Deserialize, ToSchema)]
pub struct UpsertEntry {
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 8.0)]
    pub hours_worked: f64,
    #[schema(example = "work", value_type = String)]
    pub entry_type: EntryType,
    #[schema(example = "Half day")]
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitMonth {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
}

/// Record or overwrite one day's entry on the caller's own timesheet.
#[utoipa::path(
    post,
    path = "/api/v1/timesheets",
    request_body = UpsertEntry,
    responses(
        (status = 200, description = "Entry saved", body = Object, example = json!({
            "message": "Entry saved"
        })),
        (status = 400, description = "Invalid hours"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Day already approved"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Timesheets"
)]
pub async fn upsert_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertEntry>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if !(0.0..=24.0).contains(&payload.hours_worked) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "hours_worked must be between 0 and 24"
        })));
    }

    let store = MySqlStore::new(pool.get_ref().clone());

    // Approved days stay locked. Rejected days are the one terminal state an
    // employee may write over: correcting them resets the row to Draft so the
    // month can be resubmitted.
    let existing = store
        .select(&AttendanceFilter {
            employee_id: Some(employee_id),
            from: Some(payload.date),
            to: Some(payload.date),
            statuses: None,
        })
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to read existing entry");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    if existing.iter().any(|r| r.status == RecordStatus::Approved) {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "This day has already been approved"
        })));
    }

    store
        .upsert_day(&NewAttendance {
            employee_id,
            date: payload.date,
            hours_worked: payload.hours_worked,
            entry_type: payload.entry_type,
            note: payload.note.clone(),
            status: RecordStatus::Draft,
        })
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to save entry");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Entry saved"
    })))
}

/// Submit the caller's month for review (Draft entries become Pending).
#[utoipa::path(
    post,
    path = "/api/v1/timesheets/submit",
    request_body = SubmitMonth,
    responses(
        (status = 200, description = "Timesheet submitted", body = Object, example = json!({
            "message": "Timesheet submitted",
            "entries": 22
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No draft entries for that month")
    ),
    security(("bearer_auth" = [])),
    tag = "Timesheets"
)]
pub async fn submit_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitMonth>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let engine = ApprovalEngine::new(MySqlStore::new(pool.get_ref().clone()));
    match engine.submit(employee_id, payload.year, payload.month).await {
        Ok(entries) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Timesheet submitted",
            "entries": entries
        }))),
        Err(e) => Ok(approval_failure("Timesheet submission", e)),
    }
}

/// The caller's own monthly summary.
#[utoipa::path(
    get,
    path = "/api/v1/timesheets/my",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly summary", body = crate::model::timesheet::MonthlySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No entries for that month")
    ),
    security(("bearer_auth" = [])),
    tag = "Timesheets"
)]
pub async fn my_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let filter = match AttendanceFilter::employee_month(employee_id, query.year, query.month) {
        Some(f) => f,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": format!("{} is not a valid month", query.month)
            })))
        }
    };

    let store = MySqlStore::new(pool.get_ref().clone());
    let rows = store.select(&filter).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch timesheet");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let key = SummaryKey {
        employee_id,
        year: query.year,
        month: query.month,
    };
    match aggregate_by_employee_month(rows).remove(&key) {
        Some(summary) => Ok(HttpResponse::Ok().json(summary)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No entries for that month"
        }))),
    }
}
