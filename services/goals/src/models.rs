//! Goal service models

pub mod goal;
pub mod user;

// Re-export for convenience
pub use goal::{Goal, GoalStatus, StatusChange};
pub use user::{NewUser, User};
