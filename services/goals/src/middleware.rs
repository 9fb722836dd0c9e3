//! Login gate for goal routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use crate::{error::WebError, state::AppState};

/// Id of the logged-in user, inserted into request extensions by
/// [`require_login`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

/// Notice shown when an anonymous visitor hits a gated route
pub fn login_notice(path: &str) -> &'static str {
    if path.starts_with("/goals") {
        "Please log in to view your goals."
    } else if path.starts_with("/add_goal") {
        "Please log in to add goals."
    } else if path.starts_with("/remove_goal") {
        "Please log in to remove goals."
    } else if path.starts_with("/update_status") {
        "Please log in to update goal status."
    } else {
        "Please log in to continue."
    }
}

/// Let the request through only with a session naming an existing user
///
/// Anonymous requests are redirected to `/login` with a notice.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let mut session = state.sessions.load(&jar);

    if let Some(user_id) = session.user_id {
        match state.user_repository.find_by_id(user_id).await {
            Ok(Some(_)) => {
                req.extensions_mut().insert(CurrentUser(user_id));
                return next.run(req).await;
            }
            Ok(None) => {
                info!("Session names unknown user {}", user_id);
                session.log_out();
            }
            Err(e) => {
                error!("Failed to look up session user: {}", e);
                return WebError::from(e).into_response();
            }
        }
    }

    session.error(login_notice(req.uri().path()));

    match state.sessions.store(jar, &session) {
        Ok(jar) => (jar, Redirect::to("/login")).into_response(),
        Err(e) => WebError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_notice_names_the_action() {
        assert_eq!(login_notice("/goals"), "Please log in to view your goals.");
        assert_eq!(login_notice("/add_goal"), "Please log in to add goals.");
        assert_eq!(login_notice("/remove_goal/3"), "Please log in to remove goals.");
        assert_eq!(
            login_notice("/update_status/3/completed"),
            "Please log in to update goal status."
        );
        assert_eq!(login_notice("/elsewhere"), "Please log in to continue.");
    }
}
