pub mod balance;
pub mod error;
pub mod events;
pub mod query;
pub mod transition;
pub mod workflow;

pub use balance::BalancePolicy;
pub use error::LeaveError;
pub use workflow::LeaveWorkflow;
