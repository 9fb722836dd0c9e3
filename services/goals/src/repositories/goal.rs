//! Goal repository: storage and status transitions for goals
//!
//! Every operation is scoped to the acting user by putting `user_id` in the
//! statement predicate. Expiration is lazy: [`GoalRepository::sweep_expired`]
//! runs before goals are listed, with the caller supplying `now`.

use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::{info, warn};

use crate::{
    error::{GoalError, GoalResult},
    models::{
        Goal, GoalStatus, StatusChange,
        goal::{completion_deadline, format_deadline, parse_deadline},
    },
    validation,
};

/// Goal repository
#[derive(Clone)]
pub struct GoalRepository {
    pool: SqlitePool,
}

impl GoalRepository {
    /// Create a new goal repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mark every pending goal whose deadline is at or before `now` as expired
    ///
    /// Applies to all users. Running it again with the same `now` changes
    /// nothing. Returns the number of goals that expired.
    pub async fn sweep_expired(&self, now: NaiveDateTime) -> GoalResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE goals
            SET status = 'expired'
            WHERE status = 'pending' AND deadline IS NOT NULL AND deadline <= ?
            "#,
        )
        .bind(format_deadline(now))
        .execute(&self.pool)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            info!("Expired {} overdue goals", expired);
        }

        Ok(expired)
    }

    /// All goals of a user in insertion order, swept at `now` first
    pub async fn list(&self, user_id: i64, now: NaiveDateTime) -> GoalResult<Vec<Goal>> {
        self.sweep_expired(now).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, goal, status, deadline
            FROM goals
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(goal_from_row).collect()
    }

    /// Number of the user's goals with status `completed`
    pub async fn count_completed(&self, user_id: i64) -> GoalResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM goals WHERE user_id = ? AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Create a pending goal and return its id
    ///
    /// `deadline` is `YYYY-MM-DD HH:MM`; anything unparseable fails with
    /// [`GoalError::InvalidDeadlineFormat`] and nothing is stored.
    pub async fn add(&self, user_id: i64, description: &str, deadline: &str) -> GoalResult<i64> {
        validation::validate_goal_text(description).map_err(GoalError::Validation)?;

        let deadline = parse_deadline(deadline).ok_or_else(|| {
            warn!("Rejected goal deadline: {:?}", deadline);
            GoalError::InvalidDeadlineFormat(deadline.to_string())
        })?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO goals (user_id, goal, status, deadline)
            VALUES (?, ?, 'pending', ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(description)
        .bind(format_deadline(deadline))
        .fetch_one(&self.pool)
        .await?;

        info!("User {} added goal {}", user_id, id);
        Ok(id)
    }

    /// Find one of the user's goals
    #[cfg(test)]
    pub async fn find(&self, user_id: i64, goal_id: i64) -> GoalResult<Option<Goal>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, goal, status, deadline
            FROM goals
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(goal_from_row).transpose()
    }

    /// Delete one of the user's goals
    pub async fn remove(&self, user_id: i64, goal_id: i64) -> GoalResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!("User {} cannot remove goal {}", user_id, goal_id);
            return Err(GoalError::NotFoundOrUnauthorized);
        }

        info!("User {} removed goal {}", user_id, goal_id);
        Ok(())
    }

    /// Apply a user-requested status change
    ///
    /// - `Completed` sets the status and rewrites the deadline to
    ///   [`completion_deadline`]`(now)`
    /// - `Pending` reopens the goal and keeps its deadline
    /// - `Removed` deletes the goal
    pub async fn set_status(
        &self,
        user_id: i64,
        goal_id: i64,
        change: StatusChange,
        now: NaiveDateTime,
    ) -> GoalResult<()> {
        let result = match change {
            StatusChange::Removed => return self.remove(user_id, goal_id).await,
            StatusChange::Completed => {
                sqlx::query(
                    r#"
                    UPDATE goals
                    SET status = ?, deadline = ?
                    WHERE id = ? AND user_id = ?
                    "#,
                )
                .bind(GoalStatus::Completed.as_str())
                .bind(format_deadline(completion_deadline(now)))
                .bind(goal_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
            StatusChange::Pending => {
                sqlx::query("UPDATE goals SET status = ? WHERE id = ? AND user_id = ?")
                    .bind(GoalStatus::Pending.as_str())
                    .bind(goal_id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            warn!("User {} cannot update goal {}", user_id, goal_id);
            return Err(GoalError::NotFoundOrUnauthorized);
        }

        info!("User {} set goal {} to {:?}", user_id, goal_id, change);
        Ok(())
    }
}

fn goal_from_row(row: &SqliteRow) -> GoalResult<Goal> {
    let id: i64 = row.try_get("id")?;
    let status: Option<String> = row.try_get("status")?;
    let deadline: Option<String> = row.try_get("deadline")?;

    let status = status
        .ok_or_else(|| GoalError::CorruptRecord(format!("goal {} has no status", id)))?
        .parse::<GoalStatus>()
        .map_err(|e| GoalError::CorruptRecord(format!("goal {}: {}", id, e)))?;

    let deadline = deadline
        .map(|raw| {
            parse_deadline(&raw).ok_or_else(|| {
                GoalError::CorruptRecord(format!("goal {} has deadline {:?}", id, raw))
            })
        })
        .transpose()?;

    Ok(Goal {
        id,
        user_id: row.try_get("user_id")?,
        goal: row.try_get("goal")?,
        status,
        deadline,
    })
}
