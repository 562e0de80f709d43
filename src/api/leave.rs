use actix_web::{web, HttpResponse, Responder};
use base64::Engine;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::api::leave_failure;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::leave::LeaveType;
use crate::model::status::ReviewStatus;
use crate::store::fs_docs::FsDocumentStore;
use crate::store::mysql::MySqlStore;
use crate::store::LeaveFilter;
use crate::workflow::leave::{
    LeaveAttachment, LeaveService, LeaveSubmission, ReviewDecision,
};
use crate::workflow::Reviewer;

#[derive(Deserialize, ToSchema)]
pub struct AttachmentPayload {
    #[schema(example = "certificate.pdf")]
    pub file_name: String,
    /// File bytes, base64-encoded.
    pub content_base64: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub attachment: Option<AttachmentPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy your trip")]
    pub comment: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<ReviewStatus>,
}

fn service(pool: &MySqlPool, config: &Config) -> LeaveService<MySqlStore, MySqlStore, FsDocumentStore> {
    let store = MySqlStore::new(pool.clone());
    LeaveService::new(
        store.clone(),
        store,
        FsDocumentStore::new(&config.documents_root),
    )
}

/// Submit a leave request for approval.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "id": 17,
            "status": "pending"
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let attachment = match payload.attachment {
        Some(att) => {
            let bytes = match base64::engine::general_purpose::STANDARD.decode(&att.content_base64)
            {
                Ok(b) => b,
                Err(_) => {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "attachment content is not valid base64"
                    })))
                }
            };
            Some(LeaveAttachment {
                file_name: att.file_name,
                bytes,
            })
        }
        None => None,
    };

    let submission = LeaveSubmission {
        employee_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        leave_type: payload.leave_type,
        reason: payload.reason,
        attachment,
    };

    match service(pool.get_ref(), config.get_ref()).submit(submission).await {
        Ok(id) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Leave request submitted",
            "id": id,
            "status": "pending"
        }))),
        Err(e) => Ok(leave_failure("Leave request submission", e)),
    }
}

/// Approve a leave request (Manager/Admin).
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;
    let leave_id = path.into_inner();
    let reviewer = Reviewer {
        user_id: auth.user_id,
        employee_id: auth.employee_id,
    };

    match service(pool.get_ref(), config.get_ref())
        .review(
            leave_id,
            ReviewDecision::Approve,
            reviewer,
            body.comment.as_deref(),
        )
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Leave approved"
        }))),
        Err(e) => Ok(leave_failure("Leave approval", e)),
    }
}

/// Reject a leave request with a comment (Manager/Admin).
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Comment missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;
    let leave_id = path.into_inner();
    let reviewer = Reviewer {
        user_id: auth.user_id,
        employee_id: auth.employee_id,
    };

    match service(pool.get_ref(), config.get_ref())
        .review(
            leave_id,
            ReviewDecision::Reject,
            reviewer,
            body.comment.as_deref(),
        )
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Leave rejected"
        }))),
        Err(e) => Ok(leave_failure("Leave rejection", e)),
    }
}

/// Fetch one leave request.
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = crate::model::leave::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = match service(pool.get_ref(), config.get_ref()).get(leave_id).await {
        Ok(l) => l,
        Err(e) => return Ok(leave_failure("Loading leave request", e)),
    };

    match leave {
        // Employees may read their own requests; reviewers may read any.
        Some(data) => {
            let own = auth.employee_id == Some(data.employee_id);
            if !own && !auth.role.can_review() {
                return Err(actix_web::error::ErrorForbidden("Manager/Admin only"));
            }
            Ok(HttpResponse::Ok().json(data))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// List leave requests, optionally filtered.
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Leave request list", body = [crate::model::leave::LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<impl Responder> {
    // Non-reviewers see their own requests only.
    let employee_id = if auth.role.can_review() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let filter = LeaveFilter {
        employee_id,
        status: query.status,
    };

    match service(pool.get_ref(), config.get_ref()).list(&filter).await {
        Ok(leaves) => Ok(HttpResponse::Ok().json(leaves)),
        Err(e) => {
            error!(action = "leave list", "leave list failed");
            Ok(leave_failure("Loading leave requests", e))
        }
    }
}
