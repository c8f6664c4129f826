//! MySQL adapter for all persistence ports.
//!
//! Expected tables:
//!
//! ```sql
//! users          (id VARCHAR PK, role VARCHAR, manager_id VARCHAR NULL,
//!                 full_name VARCHAR, leave_balance INT NULL)
//! leave_requests (id BIGINT UNSIGNED AUTO_INCREMENT PK, employee_id VARCHAR,
//!                 start_date DATE, end_date DATE, leave_type VARCHAR(50),
//!                 status VARCHAR(32), version INT UNSIGNED,
//!                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)
//! notifications  (id BIGINT UNSIGNED AUTO_INCREMENT PK, user_id VARCHAR,
//!                 title VARCHAR(200), message VARCHAR(500), category VARCHAR(50),
//!                 is_read BOOLEAN, created_at TIMESTAMP, link VARCHAR NULL)
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};

use crate::leave::balance::BalanceChange;
use crate::leave::query::{LeavePage, LeaveQuery, LeaveScope, LeaveSort};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};
use crate::model::notification::{NewNotification, Notification};
use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::store::{LeaveStore, NotificationFeed, StoreError, UserDirectory};

const LEAVE_COLUMNS: &str = "lr.id, lr.employee_id, lr.start_date, lr.end_date, lr.leave_type, \
     lr.status, lr.version, lr.created_at";

const USER_COLUMNS: &str = "id, role, manager_id, full_name, leave_balance";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::connection(err.to_string()),
            other => StoreError::query(other.to_string()),
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    role: String,
    manager_id: Option<String>,
    full_name: String,
    leave_balance: Option<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::query(format!("unknown role '{}' for user {}", row.role, row.id)))?;
        Ok(User {
            id: UserId::new(row.id),
            role,
            manager_id: row.manager_id.map(UserId::new),
            full_name: row.full_name,
            leave_balance: row.leave_balance,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
    status: String,
    version: u32,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            StoreError::query(format!("unknown status '{}' on leave {}", row.status, row.id))
        })?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: UserId::new(row.employee_id),
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type: row.leave_type,
            status,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: u64,
    user_id: String,
    title: String,
    message: String,
    category: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    link: Option<String>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: UserId::new(row.user_id),
            title: row.title,
            message: row.message,
            category: row.category,
            is_read: row.is_read,
            created_at: row.created_at,
            link: row.link,
        }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    Str(String),
    Date(NaiveDate),
}

fn users_from_rows(rows: Vec<UserRow>) -> Result<Vec<User>, StoreError> {
    rows.into_iter().map(User::try_from).collect()
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn where_clause(query: &LeaveQuery) -> (String, Vec<FilterValue>) {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let LeaveScope::Employees(ids) = &query.scope {
            let placeholders = vec!["?"; ids.len()].join(", ");
            if ids.is_empty() {
                where_sql.push_str(" AND 1=0");
            } else {
                where_sql.push_str(&format!(" AND lr.employee_id IN ({placeholders})"));
                args.extend(ids.iter().map(|id| FilterValue::Str(id.to_string())));
            }
        }

        if let Some(employee_id) = &query.employee_id {
            where_sql.push_str(" AND lr.employee_id = ?");
            args.push(FilterValue::Str(employee_id.to_string()));
        }

        if let Some(status) = query.status {
            where_sql.push_str(" AND lr.status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        if let Some(term) = &query.search {
            where_sql.push_str(
                " AND (LOWER(u.full_name) LIKE ? ESCAPE '!' OR LOWER(lr.leave_type) LIKE ? ESCAPE '!')",
            );
            let like = like_pattern(term);
            args.push(FilterValue::Str(like.clone()));
            args.push(FilterValue::Str(like));
        }

        if let Some(from) = query.from {
            where_sql.push_str(" AND lr.end_date >= ?");
            args.push(FilterValue::Date(from));
        }

        if let Some(to) = query.to {
            where_sql.push_str(" AND lr.start_date <= ?");
            args.push(FilterValue::Date(to));
        }

        (where_sql, args)
    }
}

/// Substring pattern matching `term` literally, escaped with `!`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '!' | '%' | '_') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn order_by(sort: LeaveSort) -> &'static str {
    match sort {
        LeaveSort::StartDateDesc => "lr.start_date DESC, lr.id DESC",
        LeaveSort::StartDateAsc => "lr.start_date ASC, lr.id ASC",
        LeaveSort::CreatedAtDesc => "lr.created_at DESC, lr.id DESC",
    }
}

#[async_trait]
impl UserDirectory for MySqlStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %id, "Failed to fetch user");
                StoreError::from(e)
            })?;
        row.map(User::try_from).transpose()
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_ref())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, role = %role, "Failed to list users by role");
                StoreError::from(e)
            })?;
        users_from_rows(rows)
    }

    async fn list_direct_reports(&self, manager_id: &UserId) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE manager_id = ? ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(manager_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, manager_id = %manager_id, "Failed to list direct reports");
                StoreError::from(e)
            })?;
        users_from_rows(rows)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert(
        &self,
        employee_id: &UserId,
        leave: &NewLeave,
    ) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, status, version)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(employee_id.as_str())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.leave_type)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to create leave request");
            StoreError::from(e)
        })?;

        let id = result.last_insert_id();
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::query(format!("leave request {id} vanished after insert")))
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests lr WHERE lr.id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, leave_id = id, "Failed to fetch leave request");
                StoreError::from(e)
            })?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn save(
        &self,
        request: &LeaveRequest,
        balance: Option<&BalanceChange>,
    ) -> Result<LeaveRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, leave_type = ?, status = ?, version = version + 1
            WHERE id = ?
            AND version = ?
            "#,
        )
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.leave_type)
        .bind(request.status.as_ref())
        .bind(request.id)
        .bind(request.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(leave_id = request.id, version = request.version, "Stale leave version");
            return Err(StoreError::Conflict);
        }

        if let Some(change) = balance {
            let adjusted = sqlx::query(
                r#"
                UPDATE users
                SET leave_balance = ?
                WHERE id = ?
                AND leave_balance = ?
                "#,
            )
            .bind(change.new)
            .bind(change.employee_id.as_str())
            .bind(change.expected)
            .execute(&mut *tx)
            .await?;

            if adjusted.rows_affected() == 0 {
                tx.rollback().await?;
                debug!(employee_id = %change.employee_id, "Leave balance changed concurrently");
                return Err(StoreError::Conflict);
            }
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, leave_id = request.id, "Failed to commit leave update");
            StoreError::from(e)
        })?;

        let mut saved = request.clone();
        saved.version += 1;
        Ok(saved)
    }

    async fn delete(&self, id: u64, expected_version: u32) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM leave_requests WHERE id = ? AND version = ?"#)
            .bind(id)
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, leave_id = id, "Failed to delete leave request");
                StoreError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    async fn list(&self, query: &LeaveQuery) -> Result<LeavePage, StoreError> {
        let (where_sql, args) = Self::where_clause(query);

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!(
            "SELECT COUNT(*) FROM leave_requests lr JOIN users u ON u.id = lr.employee_id{where_sql}"
        );
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::Str(s) => count_q.bind(s.as_str()),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(|e| {
            error!(error = %e, "Failed to count leave requests");
            StoreError::from(e)
        })?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests lr
            JOIN users u ON u.id = lr.employee_id
            {where_sql}
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            order_by(query.sort)
        );
        debug!(sql = %data_sql, page = query.page, per_page = query.per_page, "Fetching leave requests");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::Str(s) => data_q.bind(s.as_str()),
                FilterValue::Date(d) => data_q.bind(*d),
            };
        }
        let rows = data_q
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch leave list");
                StoreError::from(e)
            })?;

        let data = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LeavePage {
            data,
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    async fn leave_balance(&self, employee_id: &UserId) -> Result<Option<i32>, StoreError> {
        let balance = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT leave_balance FROM users WHERE id = ?",
        )
        .bind(employee_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(balance.flatten())
    }
}

#[async_trait]
impl NotificationFeed for MySqlStore {
    async fn push(&self, notification: &NewNotification) -> Result<Notification, StoreError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (user_id, title, message, category, is_read, created_at, link)
            VALUES (?, ?, ?, ?, FALSE, ?, ?)
            "#,
        )
        .bind(notification.user_id.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.category)
        .bind(created_at)
        .bind(notification.link.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(Notification {
            id: result.last_insert_id(),
            user_id: notification.user_id.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            category: notification.category.clone(),
            is_read: false,
            created_at,
            link: notification.link.clone(),
        })
    }

    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let unread_sql = if unread_only { " AND is_read = FALSE" } else { "" };
        let sql = format!(
            r#"
            SELECT id, user_id, title, message, category, is_read, created_at, link
            FROM notifications
            WHERE user_id = ?{unread_sql}
            ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: &UserId, id: u64) -> Result<(), StoreError> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
