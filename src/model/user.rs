use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A user as seen by the leave workflow.
///
/// `leave_balance` is `None` when leave is not tracked for the user (the
/// column is nullable); final approvals then leave the balance untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    /// Direct manager, one level only.
    pub manager_id: Option<UserId>,
    pub full_name: String,
    pub leave_balance: Option<i32>,
}

impl User {
    pub fn is_managed_by(&self, manager_id: &UserId) -> bool {
        self.manager_id.as_ref() == Some(manager_id)
    }
}
