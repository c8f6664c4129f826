use crate::api::error::ErrorBody;
use crate::auth::auth::AuthUser;
use crate::leave::LeaveError;
use crate::model::notification::Notification;
use crate::store::NotificationFeed;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Only return notifications not yet marked read
    #[param(example = true)]
    pub unread_only: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct UnreadCount {
    #[schema(example = 3)]
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MarkedRead {
    #[schema(example = 3)]
    pub updated: u64,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(FeedQuery),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    feed: web::Data<dyn NotificationFeed>,
    query: web::Query<FeedQuery>,
) -> actix_web::Result<impl Responder> {
    let rows = feed
        .list(&auth.user_id, query.unread_only.unwrap_or(false))
        .await
        .map_err(LeaveError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Number of unread notifications", body = UnreadCount),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn unread_count(
    auth: AuthUser,
    feed: web::Data<dyn NotificationFeed>,
) -> actix_web::Result<impl Responder> {
    let count = feed
        .unread_count(&auth.user_id)
        .await
        .map_err(LeaveError::from)?;

    Ok(HttpResponse::Ok().json(UnreadCount { count }))
}

/// Marking someone else's notification is a silent no-op.
#[utoipa::path(
    put,
    path = "/api/notifications/{notification_id}/read",
    params(
        ("notification_id" = u64, Path, description = "ID of the notification to mark read")
    ),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    feed: web::Data<dyn NotificationFeed>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    feed.mark_read(&auth.user_id, path.into_inner())
        .await
        .map_err(LeaveError::from)?;

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = MarkedRead),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn mark_all_read(
    auth: AuthUser,
    feed: web::Data<dyn NotificationFeed>,
) -> actix_web::Result<impl Responder> {
    let updated = feed
        .mark_all_read(&auth.user_id)
        .await
        .map_err(LeaveError::from)?;

    Ok(HttpResponse::Ok().json(MarkedRead { updated }))
}
