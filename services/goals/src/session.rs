//! Cookie-backed user sessions and flash notices
//!
//! The whole session (logged-in user plus pending notices) travels in one
//! signed cookie, see [`crate::jwt::JwtService`]. Handlers load it from the
//! request's [`CookieJar`], mutate it, and store it back into the jar they
//! return with the response.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::jwt::JwtService;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "goals_session";

/// Notice category, used by templates for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
}

/// One-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

/// Session contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn log_in(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }

    pub fn log_out(&mut self) {
        self.user_id = None;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.flash(FlashCategory::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.flash(FlashCategory::Error, message);
    }

    fn flash(&mut self, category: FlashCategory, message: impl Into<String>) {
        self.flashes.push(Flash {
            category,
            message: message.into(),
        });
    }

    /// Remove and return the queued notices
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

/// Session manager for reading and writing the session cookie
#[derive(Clone)]
pub struct SessionManager {
    jwt_service: JwtService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }

    /// Read the session from the cookie jar
    ///
    /// A missing, expired or tampered cookie yields an empty session.
    pub fn load(&self, jar: &CookieJar) -> SessionData {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return SessionData::default();
        };

        self.jwt_service
            .verify(cookie.value())
            .unwrap_or_else(|e| {
                debug!("Discarding invalid session cookie: {}", e);
                SessionData::default()
            })
    }

    /// Write the session into the cookie jar
    pub fn store(
        &self,
        jar: CookieJar,
        session: &SessionData,
    ) -> Result<CookieJar, jsonwebtoken::errors::Error> {
        let token = self.jwt_service.sign(session)?;

        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);

        Ok(jar.add(cookie))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(JwtService::new("test-secret", 3600))
    }

    #[test]
    fn test_take_flashes_empties_queue() {
        let mut session = SessionData::default();
        session.success("Goal added successfully!");
        session.error("Invalid goal ID or unauthorized access.");

        let flashes = session.take_flashes();

        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].category, FlashCategory::Success);
        assert_eq!(flashes[1].category, FlashCategory::Error);
        assert!(session.flashes.is_empty());
    }

    #[test]
    fn test_log_out_keeps_notices() {
        let mut session = SessionData::default();
        session.log_in(7);
        session.log_out();
        session.success("Logout successful!");

        assert_eq!(session.user_id, None);
        assert_eq!(session.flashes.len(), 1);
    }

    #[test]
    fn test_store_then_load() {
        let manager = manager();
        let mut session = SessionData::default();
        session.log_in(3);
        session.success("Login successful!");

        let jar = manager.store(CookieJar::new(), &session).unwrap();

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(manager.load(&jar), session);
    }

    #[test]
    fn test_load_without_cookie_is_empty() {
        assert_eq!(manager().load(&CookieJar::new()), SessionData::default());
    }

    #[test]
    fn test_load_ignores_foreign_signature() {
        let mut session = SessionData::default();
        session.log_in(1);
        let other = SessionManager::new(JwtService::new("another-secret", 3600));
        let jar = other.store(CookieJar::new(), &session).unwrap();

        assert_eq!(manager().load(&jar), SessionData::default());
    }

    #[test]
    fn test_load_ignores_garbage() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "not-a-token"));

        assert_eq!(manager().load(&jar), SessionData::default());
    }
}
