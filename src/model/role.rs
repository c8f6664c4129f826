use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Organisation role attached to every user.
///
/// Stored as its snake_case name (`employee`, `manager`, `hr_admin`) both in
/// the `users.role` column and in API payloads.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Employee,
    /// First-line approver ("responsable").
    Manager,
    /// HR administrator, holds final approval authority.
    HrAdmin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("employee", Role::Employee)]
    #[case("manager", Role::Manager)]
    #[case("hr_admin", Role::HrAdmin)]
    fn parses_stored_names(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::from_str(raw).unwrap(), expected);
        assert_eq!(expected.as_ref(), raw);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::HrAdmin).unwrap();
        assert_eq!(json, "\"hr_admin\"");
    }
}
