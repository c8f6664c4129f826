//! Persistence ports used by the leave workflow and their adapters.
//!
//! [`UserDirectory`] is read-only to the workflow. [`LeaveStore`] owns the
//! leave rows and the write path of `users.leave_balance`, so a final
//! approval can move both in one transaction. [`NotificationFeed`] stores the
//! per-user in-app notifications.

use async_trait::async_trait;

use crate::leave::balance::BalanceChange;
use crate::leave::query::{LeavePage, LeaveQuery};
use crate::model::leave_request::{LeaveRequest, NewLeave};
use crate::model::notification::{NewNotification, Notification};
use crate::model::role::Role;
use crate::model::user::{User, UserId};

pub mod cached;
pub mod memory;
pub mod mysql;

pub use cached::CachedUserDirectory;
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable; not recoverable by the caller.
    #[error("store connection failed: {message}")]
    Connection { message: String },
    #[error("store query failed: {message}")]
    Query { message: String },
    /// A compare-and-set found the row changed since it was read.
    #[error("record changed since it was read")]
    Conflict,
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;

    /// Users whose `manager_id` is `manager_id`. One level only.
    async fn list_direct_reports(&self, manager_id: &UserId) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Inserts a pending request at version 1 for `employee_id`.
    async fn insert(
        &self,
        employee_id: &UserId,
        leave: &NewLeave,
    ) -> Result<LeaveRequest, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Writes the mutable fields of `request` if the stored version still
    /// equals `request.version`, and applies `balance` in the same
    /// transaction. Returns the row at its new version.
    ///
    /// Fails with [`StoreError::Conflict`] if either compare fails; nothing
    /// is written in that case.
    async fn save(
        &self,
        request: &LeaveRequest,
        balance: Option<&BalanceChange>,
    ) -> Result<LeaveRequest, StoreError>;

    async fn delete(&self, id: u64, expected_version: u32) -> Result<(), StoreError>;

    async fn list(&self, query: &LeaveQuery) -> Result<LeavePage, StoreError>;

    /// Current balance, `None` when the user is unknown or untracked.
    async fn leave_balance(&self, employee_id: &UserId) -> Result<Option<i32>, StoreError>;
}

#[async_trait]
pub trait NotificationFeed: Send + Sync {
    async fn push(&self, notification: &NewNotification) -> Result<Notification, StoreError>;

    /// Newest first.
    async fn list(&self, user_id: &UserId, unread_only: bool)
    -> Result<Vec<Notification>, StoreError>;

    async fn unread_count(&self, user_id: &UserId) -> Result<i64, StoreError>;

    /// No-op when `id` belongs to another user.
    async fn mark_read(&self, user_id: &UserId, id: u64) -> Result<(), StoreError>;

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, StoreError>;
}
