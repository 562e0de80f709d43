use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::api::approval_failure;
use crate::auth::auth::AuthUser;
use crate::model::approval::ApprovalRequest;
use crate::model::timesheet::MonthlySummary;
use crate::store::mysql::MySqlStore;
use crate::store::LeaveFilter;
use crate::workflow::approval::{ApprovalEngine, ApprovalError};
use crate::workflow::Reviewer;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    /// Filter by employee name or id substring
    #[schema(example = "smith")]
    pub search: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApproveBody {
    #[schema(example = "Looks good")]
    pub comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectBody {
    #[schema(example = "Hours don't match the project allocation")]
    pub reason: String,
}

/// Summary plus the display name the approvals screen shows.
#[derive(Serialize, ToSchema)]
pub struct ReviewableSummary {
    #[schema(example = "John Smith")]
    pub employee_name: String,
    #[serde(flatten)]
    pub summary: MonthlySummary,
}

async fn labelled_summaries(
    store: &MySqlStore,
    summaries: Vec<MonthlySummary>,
    search: Option<&str>,
) -> Result<Vec<ReviewableSummary>, ApprovalError> {
    let names = store
        .employee_names()
        .await
        .map_err(ApprovalError::Store)?;
    let needle = search.map(str::to_lowercase);

    Ok(summaries
        .into_iter()
        .map(|summary| {
            let employee_name = names
                .get(&summary.employee_id)
                .cloned()
                .unwrap_or_else(|| format!("Employee #{}", summary.employee_id));
            ReviewableSummary {
                employee_name,
                summary,
            }
        })
        .filter(|s| match &needle {
            Some(n) => {
                s.employee_name.to_lowercase().contains(n)
                    || s.summary.employee_id.to_string().contains(n)
            }
            None => true,
        })
        .collect())
}

/// Timesheets awaiting review.
#[utoipa::path(
    get,
    path = "/api/v1/approvals/pending",
    params(SearchQuery),
    responses(
        (status = 200, description = "Pending summaries", body = [ReviewableSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Approvals"
)]
pub async fn pending(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let store = MySqlStore::new(pool.get_ref().clone());
    let engine = ApprovalEngine::new(store.clone());

    let result = match engine.pending_summaries().await {
        Ok(s) => labelled_summaries(&store, s, query.search.as_deref()).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(summaries) => Ok(HttpResponse::Ok().json(summaries)),
        Err(e) => Ok(approval_failure("Loading pending approvals", e)),
    }
}

/// Reviewed timesheets (approved or rejected).
#[utoipa::path(
    get,
    path = "/api/v1/approvals/history",
    params(SearchQuery),
    responses(
        (status = 200, description = "Reviewed summaries", body = [ReviewableSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Approvals"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let store = MySqlStore::new(pool.get_ref().clone());
    let engine = ApprovalEngine::new(store.clone());

    let result = match engine.history_summaries().await {
        Ok(s) => labelled_summaries(&store, s, query.search.as_deref()).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(summaries) => Ok(HttpResponse::Ok().json(summaries)),
        Err(e) => Ok(approval_failure("Loading approval history", e)),
    }
}

/// Approve an employee's month.
#[utoipa::path(
    put,
    path = "/api/v1/approvals/{employee_id}/{year}/{month}/approve",
    params(
        ("employee_id" = u64, Path, description = "Employee whose month is reviewed"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month (1-12)")
    ),
    request_body = ApproveBody,
    responses(
        (status = 200, description = "Timesheet approved", body = Object, example = json!({
            "message": "Timesheet approved"
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No entries for that employee and month"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Approvals"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, i32, u32)>,
    body: web::Json<ApproveBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;
    let (employee_id, year, month) = path.into_inner();

    if auth.employee_id == Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden(
            "Reviewers cannot approve their own timesheet",
        ));
    }

    let reviewer = Reviewer {
        user_id: auth.user_id,
        employee_id: auth.employee_id,
    };
    let engine = ApprovalEngine::new(MySqlStore::new(pool.get_ref().clone()));
    match engine
        .approve(employee_id, year, month, reviewer, body.comment.as_deref())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Timesheet approved"
        }))),
        Err(e) => Ok(approval_failure("Timesheet approval", e)),
    }
}

/// Reject an employee's month. A reason is mandatory.
#[utoipa::path(
    put,
    path = "/api/v1/approvals/{employee_id}/{year}/{month}/reject",
    params(
        ("employee_id" = u64, Path, description = "Employee whose month is reviewed"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month (1-12)")
    ),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Timesheet rejected", body = Object, example = json!({
            "message": "Timesheet rejected"
        })),
        (status = 400, description = "Reason missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No entries for that employee and month"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Approvals"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, i32, u32)>,
    body: web::Json<RejectBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;
    let (employee_id, year, month) = path.into_inner();

    if auth.employee_id == Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden(
            "Reviewers cannot reject their own timesheet",
        ));
    }

    let reviewer = Reviewer {
        user_id: auth.user_id,
        employee_id: auth.employee_id,
    };
    let engine = ApprovalEngine::new(MySqlStore::new(pool.get_ref().clone()));
    match engine
        .reject(employee_id, year, month, reviewer, &body.reason)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Timesheet rejected"
        }))),
        Err(e) => Ok(approval_failure("Timesheet rejection", e)),
    }
}

/// Combined feed of reviewable items (leave requests and timesheets).
#[utoipa::path(
    get,
    path = "/api/v1/approvals/requests",
    responses(
        (status = 200, description = "All reviewable items", body = [ApprovalRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Approvals"
)]
pub async fn requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let store = MySqlStore::new(pool.get_ref().clone());
    let engine = ApprovalEngine::new(store.clone());

    let names = store.employee_names().await.map_err(|e| {
        error!(error = %e, "Failed to load employee names");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let name_of = |employee_id: u64| {
        names
            .get(&employee_id)
            .cloned()
            .unwrap_or_else(|| format!("Employee #{}", employee_id))
    };

    let mut feed: Vec<ApprovalRequest> = Vec::new();

    match crate::store::LeaveStore::list(&store, &LeaveFilter::default()).await {
        Ok(leaves) => {
            feed.extend(
                leaves
                    .iter()
                    .map(|l| ApprovalRequest::from_leave(l, name_of(l.employee_id))),
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to load leave requests");
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Loading approvals failed. Please try again."
            })));
        }
    }

    let summaries = match engine.pending_summaries().await {
        Ok(mut pending) => match engine.history_summaries().await {
            Ok(history) => {
                pending.extend(history);
                pending
            }
            Err(e) => return Ok(approval_failure("Loading approvals", e)),
        },
        Err(e) => return Ok(approval_failure("Loading approvals", e)),
    };
    feed.extend(
        summaries
            .iter()
            .map(|s| ApprovalRequest::from_timesheet(s, name_of(s.employee_id))),
    );

    Ok(HttpResponse::Ok().json(feed))
}
