//! In-process store backing every port with a single mutex.
//!
//! Used by tests and for running the service without MySQL. Holding one
//! lock across a save makes the status and balance writes atomic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::leave::balance::BalanceChange;
use crate::leave::query::{LeavePage, LeaveQuery, LeaveSort};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};
use crate::model::notification::{NewNotification, Notification};
use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::store::{LeaveStore, NotificationFeed, StoreError, UserDirectory};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    leaves: BTreeMap<u64, LeaveRequest>,
    next_leave_id: u64,
    notifications: Vec<Notification>,
    next_notification_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.upsert_user(user);
        }
        store
    }

    pub fn upsert_user(&self, user: User) {
        self.lock().users.insert(user.id.clone(), user);
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.lock().users.get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn search_matches(state: &State, query: &LeaveQuery, request: &LeaveRequest) -> bool {
    let Some(term) = query.search.as_deref() else {
        return true;
    };
    let name_hit = state
        .users
        .get(&request.employee_id)
        .is_some_and(|user| user.full_name.to_lowercase().contains(term));
    name_hit || request.leave_type.to_lowercase().contains(term)
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.user(id))
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }

    async fn list_direct_reports(&self, manager_id: &UserId) -> Result<Vec<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|user| user.is_managed_by(manager_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(
        &self,
        employee_id: &UserId,
        leave: &NewLeave,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.lock();
        state.next_leave_id += 1;
        let request = LeaveRequest {
            id: state.next_leave_id,
            employee_id: employee_id.clone(),
            start_date: leave.start_date,
            end_date: leave.end_date,
            leave_type: leave.leave_type.clone(),
            status: LeaveStatus::Pending,
            version: 1,
            created_at: Utc::now(),
        };
        state.leaves.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.lock().leaves.get(&id).cloned())
    }

    async fn save(
        &self,
        request: &LeaveRequest,
        balance: Option<&BalanceChange>,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.lock();

        match state.leaves.get(&request.id) {
            Some(stored) if stored.version == request.version => {}
            _ => return Err(StoreError::Conflict),
        }

        if let Some(change) = balance {
            let user = state
                .users
                .get_mut(&change.employee_id)
                .ok_or(StoreError::Conflict)?;
            if user.leave_balance != Some(change.expected) {
                return Err(StoreError::Conflict);
            }
            user.leave_balance = Some(change.new);
        }

        let mut saved = request.clone();
        saved.version += 1;
        state.leaves.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: u64, expected_version: u32) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state.leaves.get(&id) {
            Some(stored) if stored.version == expected_version => {
                state.leaves.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::Conflict),
        }
    }

    async fn list(&self, query: &LeaveQuery) -> Result<LeavePage, StoreError> {
        let state = self.lock();
        let mut rows: Vec<LeaveRequest> = state
            .leaves
            .values()
            .filter(|request| query.matches(request) && search_matches(&state, query, request))
            .cloned()
            .collect();

        match query.sort {
            LeaveSort::StartDateDesc => {
                rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)))
            }
            LeaveSort::StartDateAsc => {
                rows.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)))
            }
            LeaveSort::CreatedAtDesc => {
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }

        let total = rows.len() as i64;
        let data = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok(LeavePage {
            data,
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    async fn leave_balance(&self, employee_id: &UserId) -> Result<Option<i32>, StoreError> {
        Ok(self
            .lock()
            .users
            .get(employee_id)
            .and_then(|user| user.leave_balance))
    }
}

#[async_trait]
impl NotificationFeed for MemoryStore {
    async fn push(&self, notification: &NewNotification) -> Result<Notification, StoreError> {
        let mut state = self.lock();
        state.next_notification_id += 1;
        let row = Notification {
            id: state.next_notification_id,
            user_id: notification.user_id.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            category: notification.category.clone(),
            is_read: false,
            created_at: Utc::now(),
            link: notification.link.clone(),
        };
        state.notifications.push(row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let state = self.lock();
        let mut rows: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == *user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<i64, StoreError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == *user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: &UserId, id: u64) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(row) = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == *user_id)
        {
            row.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let mut changed = 0;
        for row in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == *user_id && !n.is_read)
        {
            row.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
