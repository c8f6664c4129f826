use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::warn;

use crate::leave::error::LeaveError;
use crate::model::user::UserId;

/// What final approval does when the employee lacks the days.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BalancePolicy {
    /// Approve anyway and let the balance go negative. HR is never blocked.
    #[default]
    AllowNegative,
    /// Refuse the approval with `InsufficientBalance`.
    Block,
}

/// Balance write that accompanies a final approval.
///
/// `expected` is the value read before the write; the store applies `new`
/// only if the column still holds `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub employee_id: UserId,
    pub expected: i32,
    pub new: i32,
}

impl BalancePolicy {
    pub fn plan(
        self,
        employee_id: &UserId,
        available: i32,
        requested: i64,
    ) -> Result<BalanceChange, LeaveError> {
        let days = i32::try_from(requested)
            .map_err(|_| LeaveError::validation("leave duration is out of range"))?;

        if available < days {
            match self {
                BalancePolicy::Block => {
                    return Err(LeaveError::InsufficientBalance {
                        available,
                        requested,
                    });
                }
                BalancePolicy::AllowNegative => {
                    warn!(
                        employee_id = %employee_id,
                        available,
                        requested,
                        "Approving leave beyond remaining balance"
                    );
                }
            }
        }

        let new = available
            .checked_sub(days)
            .ok_or_else(|| LeaveError::validation("leave balance out of range"))?;

        Ok(BalanceChange {
            employee_id: employee_id.clone(),
            expected: available,
            new,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn deducts_when_balance_covers_request() {
        let change = BalancePolicy::AllowNegative
            .plan(&UserId::from("e"), 18, 5)
            .unwrap();
        assert_eq!(change.expected, 18);
        assert_eq!(change.new, 13);
    }

    #[test]
    fn allow_negative_goes_below_zero() {
        let change = BalancePolicy::AllowNegative
            .plan(&UserId::from("f"), 2, 5)
            .unwrap();
        assert_eq!(change.new, -3);
    }

    #[test]
    fn block_refuses_shortfall() {
        let err = BalancePolicy::Block
            .plan(&UserId::from("f"), 2, 5)
            .unwrap_err();
        assert_eq!(
            err,
            LeaveError::InsufficientBalance {
                available: 2,
                requested: 5
            }
        );
    }

    #[test]
    fn block_accepts_exact_balance() {
        let change = BalancePolicy::Block.plan(&UserId::from("f"), 5, 5).unwrap();
        assert_eq!(change.new, 0);
    }

    #[test]
    fn parses_config_values() {
        assert_eq!(
            BalancePolicy::from_str("allow_negative").unwrap(),
            BalancePolicy::AllowNegative
        );
        assert_eq!(BalancePolicy::from_str("block").unwrap(), BalancePolicy::Block);
        assert_eq!(BalancePolicy::default(), BalancePolicy::AllowNegative);
    }
}
