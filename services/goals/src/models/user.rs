//! User model and related functionality

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, stored in the `password` column
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// New user registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}
