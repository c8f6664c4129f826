use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::store::{StoreError, UserDirectory};

/// TTL cache in front of a [`UserDirectory`].
///
/// Only `get_user` hits and role listings are cached. Direct reports are
/// always read through so manager visibility follows reassignments
/// immediately. Balances carried by cached users may be stale; the workflow
/// reads balances from the leave store.
pub struct CachedUserDirectory<D> {
    inner: D,
    users: Cache<UserId, User>,
    roles: Cache<Role, Arc<Vec<User>>>,
}

impl<D: UserDirectory> CachedUserDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            users: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
            roles: Cache::builder().max_capacity(8).time_to_live(ttl).build(),
        }
    }

    pub async fn invalidate(&self, id: &UserId) {
        self.users.invalidate(id).await;
        self.roles.invalidate_all();
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for CachedUserDirectory<D> {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        if let Some(user) = self.users.get(id).await {
            return Ok(Some(user));
        }

        let user = self.inner.get_user(id).await?;
        if let Some(user) = &user {
            debug!(user_id = %id, "Caching user");
            self.users.insert(id.clone(), user.clone()).await;
        }
        Ok(user)
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        if let Some(users) = self.roles.get(&role).await {
            return Ok(users.as_ref().clone());
        }

        let users = self.inner.list_users_by_role(role).await?;
        self.roles.insert(role, Arc::new(users.clone())).await;
        Ok(users)
    }

    async fn list_direct_reports(&self, manager_id: &UserId) -> Result<Vec<User>, StoreError> {
        self.inner.list_direct_reports(manager_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(id: &str, role: Role, manager: Option<&str>) -> User {
        User {
            id: UserId::from(id),
            role,
            manager_id: manager.map(UserId::from),
            full_name: id.to_uppercase(),
            leave_balance: None,
        }
    }

    #[actix_web::test]
    async fn serves_cached_user_until_invalidated() {
        let cached = CachedUserDirectory::new(
            MemoryStore::with_users([user("e1", Role::Employee, None)]),
            Duration::from_secs(60),
        );

        let first = cached.get_user(&"e1".into()).await.unwrap().unwrap();
        assert_eq!(first.manager_id, None);

        cached
            .inner
            .upsert_user(user("e1", Role::Employee, Some("m1")));
        let stale = cached.get_user(&"e1".into()).await.unwrap().unwrap();
        assert_eq!(stale.manager_id, None);

        cached.invalidate(&"e1".into()).await;
        let fresh = cached.get_user(&"e1".into()).await.unwrap().unwrap();
        assert_eq!(fresh.manager_id, Some(UserId::from("m1")));
    }

    #[actix_web::test]
    async fn direct_reports_are_never_cached() {
        let cached = CachedUserDirectory::new(
            MemoryStore::with_users([user("m1", Role::Manager, None)]),
            Duration::from_secs(60),
        );
        assert!(
            cached
                .list_direct_reports(&"m1".into())
                .await
                .unwrap()
                .is_empty()
        );

        cached
            .inner
            .upsert_user(user("e1", Role::Employee, Some("m1")));
        assert_eq!(
            cached.list_direct_reports(&"m1".into()).await.unwrap().len(),
            1
        );
    }

    #[actix_web::test]
    async fn missing_users_are_not_cached() {
        let cached = CachedUserDirectory::new(MemoryStore::new(), Duration::from_secs(60));
        assert!(cached.get_user(&"ghost".into()).await.unwrap().is_none());

        cached.inner.upsert_user(user("ghost", Role::Employee, None));
        assert!(cached.get_user(&"ghost".into()).await.unwrap().is_some());
    }
}
