use crate::api::error::ErrorBody;
use crate::auth::auth::AuthUser;
use crate::leave::LeaveWorkflow;
use crate::leave::query::{LeaveFilter, LeavePage};
use crate::model::leave_request::{Decision, LeaveEdit, LeaveRequest, LeaveStatus, NewLeave};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Free text, at most 50 characters.
    #[schema(example = "annual")]
    pub leave_type: String,
}

impl From<CreateLeave> for NewLeave {
    fn from(payload: CreateLeave) -> Self {
        NewLeave {
            start_date: payload.start_date,
            end_date: payload.end_date,
            leave_type: payload.leave_type,
        }
    }
}

/// Partial update. Only HR admins may send `status`.
#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2024-06-11", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-06-14", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
    pub status: Option<LeaveStatus>,
}

impl From<UpdateLeave> for LeaveEdit {
    fn from(payload: UpdateLeave) -> Self {
        LeaveEdit {
            start_date: payload.start_date,
            end_date: payload.end_date,
            leave_type: payload.leave_type,
            status: payload.status,
        }
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates or leave type", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let request = workflow
        .create(&auth.user_id, payload.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 403, description = "Not a reviewer of this request", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody),
        (status = 409, description = "Already decided or modified concurrently", body = ErrorBody),
        (status = 422, description = "Insufficient balance", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = workflow
        .decide(&auth.user_id, path.into_inner(), Decision::Approve)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 403, description = "Not a reviewer of this request", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody),
        (status = 409, description = "Already decided or modified concurrently", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = workflow
        .decide(&auth.user_id, path.into_inner(), Decision::Reject)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Read
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Leave request not found or not visible", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = workflow
        .get_visible(&auth.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Lists the leave requests visible to the caller: their own, their
/// direct reports' for managers, everything for HR admins.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeavePage),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let page = workflow.list_visible(&auth.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(page))
}

/* =========================
Update / delete
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to update")
    ),
    request_body(content = UpdateLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Invalid dates or leave type", body = ErrorBody),
        (status = 403, description = "Not allowed to edit this request", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody),
        (status = 409, description = "Illegal status change or concurrent modification", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let request = workflow
        .edit(&auth.user_id, path.into_inner(), payload.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 204, description = "Leave request deleted"),
        (status = 403, description = "Not allowed to delete this request", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody),
        (status = 409, description = "Modified concurrently", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    workflow.delete(&auth.user_id, path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
