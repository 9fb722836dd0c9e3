//! Integration tests for the goal store schema
//!
//! These tests run against private in-memory SQLite databases and check
//! the table layout the goal service relies on.

use common::database::{DatabaseConfig, health_check, init_pool, migrate};
use sqlx::Row;

/// The schema applies cleanly and the pool answers queries
#[tokio::test]
async fn test_schema_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    migrate(&pool).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'goals') ORDER BY name")
            .fetch_all(&pool)
            .await?;
    assert_eq!(tables, vec!["goals".to_string(), "users".to_string()]);

    Ok(())
}

/// New goals default to `pending` and keep a null deadline when none is given
#[tokio::test]
async fn test_goal_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    migrate(&pool).await?;

    let user_id: i64 =
        sqlx::query_scalar("INSERT INTO users (username, password) VALUES ('ada', 'x') RETURNING id")
            .fetch_one(&pool)
            .await?;

    sqlx::query("INSERT INTO goals (user_id, goal) VALUES (?, 'read a book')")
        .bind(user_id)
        .execute(&pool)
        .await?;

    let row = sqlx::query("SELECT status, deadline FROM goals WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    let status: String = row.get("status");
    let deadline: Option<String> = row.get("deadline");
    assert_eq!(status, "pending");
    assert_eq!(deadline, None);

    Ok(())
}

/// Usernames are unique at the storage level
#[tokio::test]
async fn test_username_unique_constraint() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    migrate(&pool).await?;

    sqlx::query("INSERT INTO users (username, password) VALUES ('ada', 'x')")
        .execute(&pool)
        .await?;

    let duplicate = sqlx::query("INSERT INTO users (username, password) VALUES ('ada', 'y')")
        .execute(&pool)
        .await;

    match duplicate {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected a unique violation, got {:?}", other),
    }

    Ok(())
}

/// Goals must reference an existing user
#[tokio::test]
async fn test_goal_owner_must_exist() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    migrate(&pool).await?;

    let orphan = sqlx::query("INSERT INTO goals (user_id, goal) VALUES (42, 'orphan')")
        .execute(&pool)
        .await;

    assert!(orphan.is_err(), "foreign keys should be enforced");
    Ok(())
}
