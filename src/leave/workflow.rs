//! Leave workflow service: creation, two-level approval, role-scoped reads,
//! edits and deletion, with balance accounting on final approval.
//!
//! Every operation takes the acting user's id explicitly and resolves it
//! against the [`UserDirectory`]; an id that does not resolve is
//! `Unauthorized`.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::leave::balance::{BalanceChange, BalancePolicy};
use crate::leave::error::LeaveError;
use crate::leave::events::{LeaveEvent, LeaveNotice, dedup_recipients};
use crate::leave::query::{LeaveFilter, LeavePage, LeaveQuery, LeaveScope};
use crate::leave::transition::next_status;
use crate::model::leave_request::{Decision, LeaveEdit, LeaveRequest, LeaveStatus, NewLeave};
use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::notify::NotificationSink;
use crate::store::{LeaveStore, StoreError, UserDirectory};

const MAX_LEAVE_TYPE_LEN: usize = 50;

#[derive(Clone)]
pub struct LeaveWorkflow {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn LeaveStore>,
    notifier: Arc<dyn NotificationSink>,
    policy: BalancePolicy,
}

impl LeaveWorkflow {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn LeaveStore>,
        notifier: Arc<dyn NotificationSink>,
        policy: BalancePolicy,
    ) -> Self {
        Self {
            directory,
            store,
            notifier,
            policy,
        }
    }

    /* =========================
    Create
    ========================= */
    #[instrument(name = "leave_create", skip(self, actor_id, leave), fields(actor = %actor_id))]
    pub async fn create(
        &self,
        actor_id: &UserId,
        leave: NewLeave,
    ) -> Result<LeaveRequest, LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let leave = validate_new(leave)?;

        let request = self.store.insert(&actor.id, &leave).await?;
        info!(
            leave_id = request.id,
            days = request.duration_days(),
            "Leave request submitted"
        );

        self.notify(LeaveEvent::LeaveRequestCreated, &request, Some(&actor))
            .await;
        Ok(request)
    }

    /* =========================
    Approve / reject
    ========================= */
    #[instrument(name = "leave_decide", skip(self, actor_id), fields(actor = %actor_id))]
    pub async fn decide(
        &self,
        actor_id: &UserId,
        request_id: u64,
        decision: Decision,
    ) -> Result<LeaveRequest, LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let request = self.load(request_id).await?;

        match actor.role {
            Role::Employee => {
                return Err(LeaveError::forbidden(
                    "employees cannot approve or reject leave requests",
                ));
            }
            Role::Manager => {
                let employee = self.directory.get_user(&request.employee_id).await?;
                if !employee.is_some_and(|e| e.is_managed_by(&actor.id)) {
                    return Err(LeaveError::forbidden(
                        "managers can only review requests of their direct reports",
                    ));
                }
            }
            Role::HrAdmin => {}
        }

        self.transition(&actor, request, decision).await
    }

    /* =========================
    Reads
    ========================= */
    pub async fn list_visible(
        &self,
        actor_id: &UserId,
        filter: &LeaveFilter,
    ) -> Result<LeavePage, LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let scope = self.scope_for(&actor).await?;
        let query = LeaveQuery::new(scope, filter);
        Ok(self.store.list(&query).await?)
    }

    /// A request outside the actor's scope reads as missing.
    pub async fn get_visible(
        &self,
        actor_id: &UserId,
        request_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let request = self.load(request_id).await?;
        let scope = self.scope_for(&actor).await?;

        if scope.permits(&request) {
            Ok(request)
        } else {
            Err(LeaveError::request_not_found(request_id))
        }
    }

    /* =========================
    Edit / delete
    ========================= */
    #[instrument(name = "leave_edit", skip(self, actor_id, edit), fields(actor = %actor_id))]
    pub async fn edit(
        &self,
        actor_id: &UserId,
        request_id: u64,
        edit: LeaveEdit,
    ) -> Result<LeaveRequest, LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let current = self.load(request_id).await?;

        match actor.role {
            Role::Manager => Err(LeaveError::forbidden(
                "managers can approve or reject leave requests but not edit them",
            )),
            Role::Employee => {
                if current.employee_id != actor.id {
                    return Err(LeaveError::forbidden(
                        "you can only edit your own leave requests",
                    ));
                }
                if edit.status.is_some() {
                    return Err(LeaveError::forbidden(
                        "employees cannot change the status of a leave request",
                    ));
                }
                if current.status != LeaveStatus::Pending {
                    return Err(LeaveError::forbidden(
                        "only pending leave requests can be edited",
                    ));
                }

                let mut updated = apply_fields(&current, &edit)?;
                updated.status = LeaveStatus::Pending;
                let saved = self.store.save(&updated, None).await?;
                info!(leave_id = saved.id, "Leave request edited by owner");
                Ok(saved)
            }
            Role::HrAdmin => self.admin_edit(&actor, current, edit).await,
        }
    }

    #[instrument(name = "leave_delete", skip(self, actor_id), fields(actor = %actor_id))]
    pub async fn delete(&self, actor_id: &UserId, request_id: u64) -> Result<(), LeaveError> {
        let actor = self.resolve_actor(actor_id).await?;
        let request = self.load(request_id).await?;

        match actor.role {
            Role::HrAdmin => {}
            Role::Employee if request.employee_id == actor.id => {
                if request.status != LeaveStatus::Pending {
                    return Err(LeaveError::forbidden(
                        "only pending leave requests can be withdrawn",
                    ));
                }
            }
            Role::Employee => {
                return Err(LeaveError::forbidden(
                    "you can only delete your own leave requests",
                ));
            }
            Role::Manager => {
                return Err(LeaveError::forbidden(
                    "managers cannot delete leave requests",
                ));
            }
        }

        self.store.delete(request.id, request.version).await?;
        if request.status == LeaveStatus::FinalApproved {
            warn!(
                leave_id = request.id,
                employee_id = %request.employee_id,
                "Deleted an approved leave request; balance is not refunded"
            );
        }
        info!(leave_id = request.id, "Leave request deleted");
        Ok(())
    }

    /* =========================
    Internals
    ========================= */
    async fn resolve_actor(&self, actor_id: &UserId) -> Result<User, LeaveError> {
        self.directory
            .get_user(actor_id)
            .await?
            .ok_or(LeaveError::Unauthorized)
    }

    async fn load(&self, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store
            .get(request_id)
            .await?
            .ok_or_else(|| LeaveError::request_not_found(request_id))
    }

    async fn scope_for(&self, actor: &User) -> Result<LeaveScope, StoreError> {
        let reports = match actor.role {
            Role::Manager => self.directory.list_direct_reports(&actor.id).await?,
            Role::Employee | Role::HrAdmin => Vec::new(),
        };
        Ok(LeaveScope::for_actor(actor, &reports))
    }

    async fn admin_edit(
        &self,
        actor: &User,
        current: LeaveRequest,
        edit: LeaveEdit,
    ) -> Result<LeaveRequest, LeaveError> {
        let updated = apply_fields(&current, &edit)?;

        if current.status == LeaveStatus::FinalApproved
            && updated.duration_days() != current.duration_days()
        {
            return Err(LeaveError::invalid_transition(
                current.status,
                "change the duration of",
            ));
        }

        let decision = match edit.status {
            None => None,
            Some(target) if target == current.status => None,
            Some(LeaveStatus::FinalApproved) => Some(Decision::Approve),
            Some(LeaveStatus::Rejected) => Some(Decision::Reject),
            Some(target) => {
                return Err(LeaveError::invalid_transition(
                    current.status,
                    format!("set status to {target} on"),
                ));
            }
        };

        match decision {
            Some(decision) => self.transition(actor, updated, decision).await,
            None => {
                let saved = self.store.save(&updated, None).await?;
                info!(leave_id = saved.id, "Leave request edited by HR");
                Ok(saved)
            }
        }
    }

    /// Applies `decision` per the transition table, booking the balance on
    /// final approval in the same store write.
    async fn transition(
        &self,
        actor: &User,
        mut request: LeaveRequest,
        decision: Decision,
    ) -> Result<LeaveRequest, LeaveError> {
        let from = request.status;
        let to = next_status(from, actor.role, decision)?;
        request.status = to;

        let balance = if to == LeaveStatus::FinalApproved {
            self.plan_balance(&request).await?
        } else {
            None
        };

        let saved = self.store.save(&request, balance.as_ref()).await?;
        info!(
            leave_id = saved.id,
            from = %from,
            to = %to,
            balance_after = balance.as_ref().map(|b| b.new),
            "Leave request status changed"
        );

        let event = match to {
            LeaveStatus::ManagerApproved => Some(LeaveEvent::LeaveApprovedByManager),
            LeaveStatus::FinalApproved => Some(LeaveEvent::LeaveFinalApproved),
            LeaveStatus::Rejected => Some(LeaveEvent::LeaveRejected),
            LeaveStatus::Pending => None,
        };
        if let Some(event) = event {
            self.notify(event, &saved, None).await;
        }

        Ok(saved)
    }

    async fn plan_balance(
        &self,
        request: &LeaveRequest,
    ) -> Result<Option<BalanceChange>, LeaveError> {
        let days = request.duration_days();
        match self.store.leave_balance(&request.employee_id).await? {
            Some(available) => self
                .policy
                .plan(&request.employee_id, available, days)
                .map(Some),
            None => {
                info!(
                    employee_id = %request.employee_id,
                    days,
                    "Leave balance not tracked for employee, nothing to deduct"
                );
                Ok(None)
            }
        }
    }

    /// Best-effort: lookup failures are logged and the notice is dropped.
    async fn notify(&self, event: LeaveEvent, request: &LeaveRequest, employee: Option<&User>) {
        match self.recipients(event, request, employee).await {
            Ok((name, recipients)) if !recipients.is_empty() => {
                self.notifier
                    .publish(LeaveNotice::new(event, request, &name, recipients));
            }
            Ok(_) => {}
            Err(e) => warn!(
                event = %event,
                leave_id = request.id,
                error = %e,
                "Could not resolve notification recipients"
            ),
        }
    }

    async fn recipients(
        &self,
        event: LeaveEvent,
        request: &LeaveRequest,
        employee: Option<&User>,
    ) -> Result<(String, Vec<UserId>), StoreError> {
        let employee = match employee {
            Some(user) => Some(user.clone()),
            None => self.directory.get_user(&request.employee_id).await?,
        };
        let name = employee
            .as_ref()
            .map(|e| e.full_name.clone())
            .unwrap_or_else(|| request.employee_id.to_string());
        let manager = employee.as_ref().and_then(|e| e.manager_id.clone());
        let owner = request.employee_id.clone();

        let ids = match event {
            LeaveEvent::LeaveRequestCreated => {
                let mut ids: Vec<UserId> = manager.into_iter().collect();
                ids.extend(self.hr_admin_ids().await?);
                return Ok((name, dedup_recipients(ids, Some(&owner))));
            }
            LeaveEvent::LeaveApprovedByManager => {
                let mut ids = vec![owner];
                ids.extend(self.hr_admin_ids().await?);
                ids
            }
            LeaveEvent::LeaveFinalApproved => {
                let mut ids = vec![owner];
                ids.extend(manager);
                ids
            }
            LeaveEvent::LeaveRejected => vec![owner],
        };
        Ok((name, dedup_recipients(ids, None)))
    }

    async fn hr_admin_ids(&self) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .directory
            .list_users_by_role(Role::HrAdmin)
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect())
    }
}

fn validate_leave_type(raw: &str) -> Result<String, LeaveError> {
    let leave_type = raw.trim();
    if leave_type.is_empty() {
        return Err(LeaveError::validation("leave_type is required"));
    }
    if leave_type.chars().count() > MAX_LEAVE_TYPE_LEN {
        return Err(LeaveError::validation(format!(
            "leave_type must be at most {MAX_LEAVE_TYPE_LEN} characters"
        )));
    }
    Ok(leave_type.to_string())
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), LeaveError> {
    if end_date < start_date {
        return Err(LeaveError::validation(
            "end_date must be on or after start_date",
        ));
    }
    Ok(())
}

fn validate_new(leave: NewLeave) -> Result<NewLeave, LeaveError> {
    validate_range(leave.start_date, leave.end_date)?;
    Ok(NewLeave {
        leave_type: validate_leave_type(&leave.leave_type)?,
        ..leave
    })
}

fn apply_fields(current: &LeaveRequest, edit: &LeaveEdit) -> Result<LeaveRequest, LeaveError> {
    let mut updated = current.clone();
    if let Some(start_date) = edit.start_date {
        updated.start_date = start_date;
    }
    if let Some(end_date) = edit.end_date {
        updated.end_date = end_date;
    }
    if let Some(leave_type) = &edit.leave_type {
        updated.leave_type = validate_leave_type(leave_type)?;
    }
    validate_range(updated.start_date, updated.end_date)?;
    Ok(updated)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
