//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    error::{GoalError, GoalResult},
    models::{NewUser, User},
    validation,
};

/// Well-formed Argon2 hash that matches no password. Unknown usernames are
/// verified against it so a failed login costs the same either way.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user and return its id
    ///
    /// Fails with [`GoalError::DuplicateUsername`] when the name is taken;
    /// the store is left untouched in that case.
    pub async fn register(&self, new_user: &NewUser) -> GoalResult<i64> {
        validation::validate_username(&new_user.username).map_err(GoalError::Validation)?;
        validation::validate_password(&new_user.password).map_err(GoalError::Validation)?;

        info!("Registering new user: {}", new_user.username);

        if self.find_by_username(&new_user.username).await?.is_some() {
            warn!("Username already taken: {}", new_user.username);
            return Err(GoalError::DuplicateUsername);
        }

        let password_hash = hash_password(&new_user.password)?;

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, password)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(id),
            // lost a race with a concurrent registration
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(GoalError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check a username/password pair and return the user id
    pub async fn authenticate(&self, username: &str, password: &str) -> GoalResult<i64> {
        info!("Authenticating user: {}", username);

        let user = self.find_by_username(username).await?;
        let stored_hash = user
            .as_ref()
            .map(|user| user.password_hash.as_str())
            .unwrap_or(DUMMY_PASSWORD_HASH);

        let verified = verify_password(password, stored_hash)?;

        match user {
            Some(user) if verified => Ok(user.id),
            _ => {
                warn!("Failed login for user: {}", username);
                Err(GoalError::InvalidCredentials)
            }
        }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> GoalResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> GoalResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Number of registered users
    pub async fn count(&self) -> GoalResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Hash a password with Argon2 and a random salt
fn hash_password(password: &str) -> GoalResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GoalError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC string
fn verify_password(password: &str, stored_hash: &str) -> GoalResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| GoalError::PasswordHash(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool, migrate};

    async fn repository() -> UserRepository {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        migrate(&pool).await.unwrap();
        UserRepository::new(pool)
    }

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let repo = repository().await;

        let id = repo.register(&new_user("ada", "analytical")).await.unwrap();
        let user = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(user.username, "ada");
        assert_ne!(user.password_hash, "analytical");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_leaves_store_unchanged() {
        let repo = repository().await;
        let first = repo.register(&new_user("ada", "analytical")).await.unwrap();
        let before = repo.find_by_id(first).await.unwrap().unwrap();

        let result = repo.register(&new_user("ada", "different")).await;

        assert!(matches!(result, Err(GoalError::DuplicateUsername)));
        assert_eq!(repo.count().await.unwrap(), 1);
        let after = repo.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_username() {
        let repo = repository().await;

        let result = repo.register(&new_user("  ", "secret")).await;

        assert!(matches!(result, Err(GoalError::Validation(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let repo = repository().await;
        let id = repo.register(&new_user("ada", "analytical")).await.unwrap();

        assert_eq!(repo.authenticate("ada", "analytical").await.unwrap(), id);
        assert!(matches!(
            repo.authenticate("ada", "wrong").await,
            Err(GoalError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("grace", "analytical").await,
            Err(GoalError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_parseable_and_matches_nothing() {
        assert!(!verify_password("", DUMMY_PASSWORD_HASH).unwrap());
        assert!(!verify_password("password", DUMMY_PASSWORD_HASH).unwrap());
    }

    #[test]
    fn test_corrupt_stored_hash_is_an_error() {
        assert!(matches!(
            verify_password("password", "plaintext"),
            Err(GoalError::PasswordHash(_))
        ));
    }
}
