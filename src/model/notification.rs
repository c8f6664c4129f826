use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::UserId;

/// One entry of a user's in-app notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(value_type = String, example = "mgr-1")]
    pub user_id: UserId,
    #[schema(example = "New leave request")]
    pub title: String,
    pub message: String,
    /// Feature area the notification belongs to, e.g. `leave`.
    #[schema(example = "leave")]
    pub category: String,
    pub is_read: bool,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "/leave/1", nullable = true)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub category: String,
    pub link: Option<String>,
}
