//! Repositories for database operations
//!
//! Together these form the goal store and status engine. Each repository
//! holds a clone of the injected pool; every mutation is a single SQL
//! statement, so individual operations are atomic without explicit locking.

pub mod goal;
pub mod user;

pub use goal::GoalRepository;
pub use user::UserRepository;
