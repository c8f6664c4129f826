//! Role-scoped listing of leave requests.
//!
//! The scope is decided from the actor's role; caller filters narrow it
//! further but can never widen it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::model::user::{User, UserId};

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveSort {
    #[default]
    StartDateDesc,
    StartDateAsc,
    CreatedAtDesc,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee id
    #[schema(example = "emp-1000")]
    pub employee_id: Option<String>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Case-insensitive match on employee name or leave type
    #[schema(example = "annual")]
    pub search: Option<String>,
    /// Keep requests ending on or after this date
    #[schema(example = "2024-06-01", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Keep requests starting on or before this date
    #[schema(example = "2024-06-30", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    pub to: Option<NaiveDate>,
    /// Ordering, `start_date_desc` by default
    pub sort: Option<LeaveSort>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

/// Which employees' requests an actor may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveScope {
    All,
    Employees(Vec<UserId>),
}

impl LeaveScope {
    /// Scope for `actor`, given the direct reports of a manager.
    ///
    /// Reports are only consulted for managers and only one level deep.
    pub fn for_actor(actor: &User, direct_reports: &[User]) -> Self {
        match actor.role {
            Role::HrAdmin => LeaveScope::All,
            Role::Manager => {
                let mut ids = vec![actor.id.clone()];
                ids.extend(
                    direct_reports
                        .iter()
                        .filter(|report| report.is_managed_by(&actor.id))
                        .map(|report| report.id.clone()),
                );
                LeaveScope::Employees(ids)
            }
            Role::Employee => LeaveScope::Employees(vec![actor.id.clone()]),
        }
    }

    pub fn permits(&self, request: &LeaveRequest) -> bool {
        match self {
            LeaveScope::All => true,
            LeaveScope::Employees(ids) => ids.contains(&request.employee_id),
        }
    }
}

/// Normalised store query: scope plus validated filters and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveQuery {
    pub scope: LeaveScope,
    pub employee_id: Option<UserId>,
    pub status: Option<LeaveStatus>,
    /// Lower-cased, trimmed, never empty.
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: LeaveSort,
    pub page: u64,
    pub per_page: u64,
}

impl LeaveQuery {
    pub fn new(scope: LeaveScope, filter: &LeaveFilter) -> Self {
        let per_page = filter
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        // OFFSET is bound as a signed 64-bit value.
        let max_page = i64::MAX as u64 / per_page;
        let page = filter.page.unwrap_or(1).clamp(1, max_page);
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let employee_id = filter
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(UserId::from);

        Self {
            scope,
            employee_id,
            status: filter.status,
            search,
            from: filter.from,
            to: filter.to,
            sort: filter.sort.unwrap_or_default(),
            page,
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// In-process evaluation of every predicate except the free-text search,
    /// which needs the employee's name.
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.scope.permits(request)
            && self
                .employee_id
                .as_ref()
                .is_none_or(|id| *id == request.employee_id)
            && self.status.is_none_or(|status| status == request.status)
            && self.from.is_none_or(|from| request.end_date >= from)
            && self.to.is_none_or(|to| request.start_date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role, manager: Option<&str>) -> User {
        User {
            id: UserId::from(id),
            role,
            manager_id: manager.map(UserId::from),
            full_name: id.to_string(),
            leave_balance: Some(10),
        }
    }

    #[test]
    fn hr_admin_sees_everything() {
        let hr = user("hr", Role::HrAdmin, None);
        assert_eq!(LeaveScope::for_actor(&hr, &[]), LeaveScope::All);
    }

    #[test]
    fn manager_scope_is_self_plus_direct_reports() {
        let manager = user("m1", Role::Manager, None);
        let reports = vec![
            user("e1", Role::Employee, Some("m1")),
            user("e2", Role::Employee, Some("m1")),
            user("e3", Role::Employee, Some("m2")),
        ];

        let scope = LeaveScope::for_actor(&manager, &reports);
        assert_eq!(
            scope,
            LeaveScope::Employees(vec!["m1".into(), "e1".into(), "e2".into()])
        );
    }

    #[test]
    fn employee_scope_is_self_only() {
        let employee = user("e1", Role::Employee, Some("m1"));
        assert_eq!(
            LeaveScope::for_actor(&employee, &[]),
            LeaveScope::Employees(vec!["e1".into()])
        );
    }

    #[test]
    fn paging_is_clamped() {
        let filter = LeaveFilter {
            page: Some(0),
            per_page: Some(1_000),
            ..Default::default()
        };
        let query = LeaveQuery::new(LeaveScope::All, &filter);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 100);
        assert_eq!(query.offset(), 0);

        let defaults = LeaveQuery::new(LeaveScope::All, &LeaveFilter::default());
        assert_eq!(defaults.per_page, 10);
        assert_eq!(defaults.sort, LeaveSort::StartDateDesc);
    }

    #[rstest::rstest]
    #[case(Some(1))]
    #[case(Some(100))]
    #[case(None)]
    fn huge_page_keeps_offset_in_range(#[case] per_page: Option<u64>) {
        let filter = LeaveFilter {
            page: Some(u64::MAX),
            per_page,
            ..Default::default()
        };
        let query = LeaveQuery::new(LeaveScope::All, &filter);
        assert!(query.offset() <= i64::MAX as u64);
        assert!(query.page > 1);
    }

    #[test]
    fn blank_search_is_dropped() {
        let filter = LeaveFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(LeaveQuery::new(LeaveScope::All, &filter).search, None);
    }
}
