use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::user::UserId;

/// Leave request lifecycle.
///
/// `Pending -> ManagerApproved -> FinalApproved`, with `Rejected` reachable
/// from both non-terminal states.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    ManagerApproved,
    FinalApproved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::FinalApproved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Inclusive day count of a leave range.
pub fn duration_days(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": "emp-1000",
    "start_date": "2024-06-10",
    "end_date": "2024-06-14",
    "leave_type": "annual",
    "status": "pending",
    "version": 1,
    "created_at": "2024-06-01T08:30:00Z"
}))]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(value_type = String, example = "emp-1000")]
    pub employee_id: UserId,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: String,
    pub status: LeaveStatus,
    /// Optimistic concurrency counter, bumped by every write.
    #[schema(example = 1)]
    pub version: u32,
    #[schema(example = "2024-06-01T08:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn duration_days(&self) -> i64 {
        duration_days(self.start_date, self.end_date)
    }
}

/// Caller-supplied fields of a new request. Owner and status are never
/// taken from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
}

/// Partial update of an existing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveEdit {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub leave_type: Option<String>,
    pub status: Option<LeaveStatus>,
}
