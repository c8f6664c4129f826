use crate::leave::error::LeaveError;
use crate::model::leave_request::{Decision, LeaveStatus};
use crate::model::role::Role;

/// Two-level approval table.
///
/// Manager approval is a gate only; HR approval is final and may skip the
/// manager step. Terminal states accept nothing.
pub fn next_status(
    current: LeaveStatus,
    role: Role,
    decision: Decision,
) -> Result<LeaveStatus, LeaveError> {
    use LeaveStatus::*;

    if current.is_terminal() {
        return Err(LeaveError::invalid_transition(current, decision.to_string()));
    }

    match (current, role, decision) {
        (Pending, Role::Manager, Decision::Approve) => Ok(ManagerApproved),
        (Pending | ManagerApproved, Role::HrAdmin, Decision::Approve) => Ok(FinalApproved),
        (Pending | ManagerApproved, Role::Manager | Role::HrAdmin, Decision::Reject) => {
            Ok(Rejected)
        }
        (from, _, decision) => Err(LeaveError::invalid_transition(from, decision.to_string())),
    }
}
