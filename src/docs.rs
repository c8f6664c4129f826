use crate::api::error::ErrorBody;
use crate::api::leave_request::{CreateLeave, UpdateLeave};
use crate::api::notification::{MarkedRead, UnreadCount};
use crate::leave::query::{LeaveFilter, LeavePage, LeaveSort};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::notification::Notification;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave workflow

Employees submit leave requests, their direct manager approves or rejects
them, and HR gives the final approval that books the days against the
employee's balance.

### Roles
- **employee**: own requests only; may edit or withdraw while pending
- **manager**: own and direct reports' requests; first-level decisions
- **hr_admin**: every request; final decisions, edits and deletions

### Security
All endpoints under the API prefix require a **JWT Bearer** access token
whose `sub` is the caller's user id.

### Errors
Failures return `{"error": <code>, "message": <text>}`.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::notification::list_notifications,
        crate::api::notification::unread_count,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read
    ),
    components(
        schemas(
            CreateLeave,
            UpdateLeave,
            LeaveFilter,
            LeaveSort,
            LeaveStatus,
            LeaveRequest,
            LeavePage,
            Notification,
            UnreadCount,
            MarkedRead,
            ErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request workflow APIs"),
        (name = "Notification", description = "In-app notification feed APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_leave_and_notification_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/leave",
            "/api/leave/{leave_id}",
            "/api/leave/{leave_id}/approve",
            "/api/leave/{leave_id}/reject",
            "/api/notifications",
            "/api/notifications/read-all",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
