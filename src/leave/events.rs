use strum::Display;

use crate::model::leave_request::LeaveRequest;
use crate::model::notification::NewNotification;
use crate::model::user::UserId;

pub const LEAVE_CATEGORY: &str = "leave";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum LeaveEvent {
    LeaveRequestCreated,
    LeaveApprovedByManager,
    LeaveFinalApproved,
    LeaveRejected,
}

/// Outbound notification produced by a workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveNotice {
    pub event: LeaveEvent,
    pub recipients: Vec<UserId>,
    pub category: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl LeaveNotice {
    pub fn new(
        event: LeaveEvent,
        request: &LeaveRequest,
        employee_name: &str,
        recipients: Vec<UserId>,
    ) -> Self {
        let days = request.duration_days();
        let range = format!("{} to {}", request.start_date, request.end_date);
        let (title, message) = match event {
            LeaveEvent::LeaveRequestCreated => (
                "New leave request",
                format!(
                    "{employee_name} requested {days} day(s) of {} leave from {range}.",
                    request.leave_type
                ),
            ),
            LeaveEvent::LeaveApprovedByManager => (
                "Leave approved by manager",
                format!(
                    "The {} leave of {employee_name} from {range} was approved by the manager and awaits HR validation.",
                    request.leave_type
                ),
            ),
            LeaveEvent::LeaveFinalApproved => (
                "Leave approved",
                format!(
                    "The {} leave of {employee_name} from {range} ({days} day(s)) has been approved.",
                    request.leave_type
                ),
            ),
            LeaveEvent::LeaveRejected => (
                "Leave rejected",
                format!(
                    "The {} leave of {employee_name} from {range} has been rejected.",
                    request.leave_type
                ),
            ),
        };

        Self {
            event,
            recipients,
            category: LEAVE_CATEGORY.to_string(),
            title: title.to_string(),
            message,
            link: Some(format!("/leave/{}", request.id)),
        }
    }

    /// One feed entry per recipient.
    pub fn into_notifications(self) -> Vec<NewNotification> {
        self.recipients
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                title: self.title.clone(),
                message: self.message.clone(),
                category: self.category.clone(),
                link: self.link.clone(),
            })
            .collect()
    }
}

/// Removes duplicates and `exclude`, keeping first-seen order.
pub(crate) fn dedup_recipients(ids: Vec<UserId>, exclude: Option<&UserId>) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::with_capacity(ids.len());
    for id in ids {
        if Some(&id) != exclude && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
