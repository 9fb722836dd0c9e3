//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_GOAL_LENGTH: usize = 500;

fn control_characters() -> &'static Regex {
    static CONTROL_REGEX: OnceLock<Regex> = OnceLock::new();
    CONTROL_REGEX.get_or_init(|| {
        Regex::new(r"[\x00-\x1f\x7f]").expect("Failed to compile control character regex")
    })
}

fn control_characters_except_whitespace() -> &'static Regex {
    static CONTROL_REGEX: OnceLock<Regex> = OnceLock::new();
    CONTROL_REGEX.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]")
            .expect("Failed to compile control character regex")
    })
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at most {} characters long",
            MAX_USERNAME_LENGTH
        ));
    }

    if control_characters().is_match(username) {
        return Err("Username contains invalid characters".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a goal description
pub fn validate_goal_text(goal: &str) -> Result<(), String> {
    if goal.trim().is_empty() {
        return Err("Goal description is required".to_string());
    }

    if goal.chars().count() > MAX_GOAL_LENGTH {
        return Err(format!(
            "Goal description must be at most {} characters long",
            MAX_GOAL_LENGTH
        ));
    }

    // newlines and tabs are fine in a description
    if control_characters_except_whitespace().is_match(goal) {
        return Err("Goal description contains invalid characters".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ada").is_ok());
        assert!(validate_username("Ada Lovelace").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("ada\0").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("x").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_goal_text() {
        assert!(validate_goal_text("Run a marathon").is_ok());
        assert!(validate_goal_text("Line one\nLine two\tindented").is_ok());
        assert!(validate_goal_text("").is_err());
        assert!(validate_goal_text(" \n ").is_err());
        assert!(validate_goal_text("bell\x07").is_err());
        assert!(validate_goal_text(&"g".repeat(501)).is_err());
    }
}
