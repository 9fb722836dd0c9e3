//! Common library for the goal tracker
//!
//! This crate provides the storage plumbing shared by the goal tracker
//! services: SQLite pool configuration, schema migration, health checks
//! and the database error type.

pub mod database;
pub mod error;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool, migrate};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::default();
///     let pool = init_pool(&config).await?;
///     migrate(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
