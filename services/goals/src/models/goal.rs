//! Goal model and the goal status state machine
//!
//! A goal moves between `pending`, `completed` and `expired`:
//!
//! - `pending -> expired` happens lazily when a sweep runs past the deadline
//! - `pending -> completed` and `any -> pending` are user requests
//! - `any -> deleted` removes the row, so nothing leaves that state
//!
//! Deadlines are local naive timestamps stored as `YYYY-MM-DD HH:MM:SS` text,
//! the layout SQLite's own `datetime()` produces, which keeps string
//! comparison in SQL chronological.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Layout used for deadlines in the `goals.deadline` column
pub const DEADLINE_STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout accepted from the add-goal form (`<date> <time>`)
pub const DEADLINE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Offset written into the deadline of a goal when it is completed
pub const COMPLETION_DEADLINE_OFFSET_HOURS: i64 = 2;

/// A status string that is not part of the state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown goal status: {0}")]
pub struct UnknownStatus(pub String);

/// Stored goal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Pending,
    Completed,
    Expired,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Pending => "pending",
            GoalStatus::Completed => "completed",
            GoalStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GoalStatus::Pending),
            "completed" => Ok(GoalStatus::Completed),
            "expired" => Ok(GoalStatus::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Status change a user can request for one of their goals
///
/// `Removed` is not a stored status: applying it deletes the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Completed,
    Removed,
    Pending,
}

impl FromStr for StatusChange {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(StatusChange::Completed),
            "removed" => Ok(StatusChange::Removed),
            "pending" => Ok(StatusChange::Pending),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Goal entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    /// Free-text description
    pub goal: String,
    pub status: GoalStatus,
    pub deadline: Option<NaiveDateTime>,
}

/// Parse a deadline as typed by a user (`2024-01-01 09:00`) or as stored
/// (`2024-01-01 09:00:00`)
pub fn parse_deadline(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    [DEADLINE_INPUT_FORMAT, DEADLINE_STORAGE_FORMAT, "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
}

/// Render a deadline in the storage layout
pub fn format_deadline(deadline: NaiveDateTime) -> String {
    deadline.format(DEADLINE_STORAGE_FORMAT).to_string()
}

/// Deadline written when a goal is marked completed
///
/// Completion reuses the deadline column as a "completed at + 2h" marker
/// instead of clearing it. Existing databases depend on this, so it lives
/// here on its own rather than being folded into general deadline handling.
pub fn completion_deadline(now: NaiveDateTime) -> NaiveDateTime {
    now + Duration::hours(COMPLETION_DEADLINE_OFFSET_HOURS)
}
