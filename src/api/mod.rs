use actix_web::HttpResponse;
use serde_json::json;
use tracing::error;

use crate::workflow::approval::ApprovalError;
use crate::workflow::leave::LeaveError;

pub mod approvals;
pub mod attendance;
pub mod employee;
pub mod leave;

// Every failed workflow action tells the user which action failed and that a
// resubmit is safe; store failures are not retried automatically.
pub(crate) fn approval_failure(action: &str, e: ApprovalError) -> HttpResponse {
    let body = json!({
        "message": format!("{} failed: {}. Please try again.", action, e)
    });
    match e {
        ApprovalError::ReasonRequired | ApprovalError::InvalidPeriod(_) => {
            HttpResponse::BadRequest().json(body)
        }
        ApprovalError::SelfReview => HttpResponse::Forbidden().json(body),
        ApprovalError::NotFound => HttpResponse::NotFound().json(body),
        ApprovalError::AlreadyReviewed => HttpResponse::Conflict().json(body),
        ApprovalError::Store(store) => {
            error!(error = %store, action, "store failure during review");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

pub(crate) fn leave_failure(action: &str, e: LeaveError) -> HttpResponse {
    let body = json!({
        "message": format!("{} failed: {}. Please try again.", action, e)
    });
    match e {
        LeaveError::InvalidDateRange
        | LeaveError::ReasonTooShort
        | LeaveError::CommentRequired => HttpResponse::BadRequest().json(body),
        LeaveError::SelfReview => HttpResponse::Forbidden().json(body),
        LeaveError::NotFound => HttpResponse::NotFound().json(body),
        LeaveError::AlreadyReviewed => HttpResponse::Conflict().json(body),
        LeaveError::Store(store) => {
            error!(error = %store, action, "store failure during leave workflow");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
