//! Goal tracker routes
//!
//! Every handler loads the session from the cookie jar, applies its change,
//! and returns the re-signed session cookie together with the page or
//! redirect. Failures a user can cause become flash notices; everything else
//! is a [`WebError`].

use axum::{
    Extension, Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Local, NaiveDateTime};
use handlebars::RenderError;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    error::{GoalError, WebResult},
    middleware::{CurrentUser, require_login},
    models::{NewUser, StatusChange},
    session::{Flash, SessionData},
    state::AppState,
    views::Templates,
};

const THROTTLED_NOTICE: &str = "Too many failed login attempts. Please try again later.";

/// Longest status value echoed back in a notice; the notice rides in the
/// session cookie
const MAX_ECHOED_STATUS_CHARS: usize = 32;

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// New goal form; the deadline arrives as separate date and time inputs
#[derive(Debug, Deserialize)]
pub struct AddGoalForm {
    pub goal: String,
    pub deadline_date: String,
    pub deadline_time: String,
}

/// Create the router for the goal tracker
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/goals", get(goals))
        .route("/add_goal", post(add_goal))
        .route("/remove_goal/:goal_id", get(remove_goal))
        .route("/update_status/:goal_id/:status", get(update_status))
        .route_layer(from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Local wall-clock time, the reference for deadlines
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Render a page with the queued notices and consume them
fn render<F>(state: &AppState, jar: CookieJar, mut session: SessionData, page: F) -> WebResult<Response>
where
    F: FnOnce(&Templates, &[Flash]) -> Result<String, RenderError>,
{
    let flashes = session.take_flashes();
    let body = page(&state.templates, &flashes)?;
    let jar = state.sessions.store(jar, &session)?;

    Ok((jar, Html(body)).into_response())
}

/// Notice for a status value outside the state machine
fn unknown_status_notice(status: &str) -> String {
    if status.chars().count() > MAX_ECHOED_STATUS_CHARS {
        let shown: String = status.chars().take(MAX_ECHOED_STATUS_CHARS).collect();
        format!("Unknown goal status: {}...", shown)
    } else {
        format!("Unknown goal status: {}.", status)
    }
}

/// Redirect, carrying the session (and its notices) along
fn redirect(state: &AppState, jar: CookieJar, session: &SessionData, to: &str) -> WebResult<Response> {
    let jar = state.sessions.store(jar, session)?;

    Ok((jar, Redirect::to(to)).into_response())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match common::database::health_check(&state.db_pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "goals",
                "database": "ok"
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": "goals",
                    "database": "unavailable"
                })),
            )
        }
    }
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if state.sessions.load(&jar).user_id.is_some() {
        Redirect::to("/goals")
    } else {
        Redirect::to("/register")
    }
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let session = state.sessions.load(&jar);
    if session.user_id.is_some() {
        return Ok(Redirect::to("/goals").into_response());
    }

    render(&state, jar, session, |templates, flashes| {
        templates.login_page(flashes)
    })
}

/// Check credentials, start the session and sweep overdue goals
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);
    if session.user_id.is_some() {
        return Ok(Redirect::to("/goals").into_response());
    }

    if !state.login_limiter.is_allowed(&form.username).await {
        warn!("Login throttled for user: {}", form.username);
        session.error(THROTTLED_NOTICE);
        return render(&state, jar, session, |templates, flashes| {
            templates.login_page(flashes)
        });
    }

    match state
        .user_repository
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user_id) => {
            state.login_limiter.reset(&form.username).await;
            session.log_in(user_id);
            session.success("Login successful!");
            state.goal_repository.sweep_expired(now()).await?;

            info!("User {} logged in", user_id);
            redirect(&state, jar, &session, "/goals")
        }
        Err(GoalError::InvalidCredentials) => {
            state.login_limiter.record_failure(&form.username).await;
            session.error("Invalid username or password. Please try again.");

            render(&state, jar, session, |templates, flashes| {
                templates.login_page(flashes)
            })
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn register_page(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let session = state.sessions.load(&jar);
    if session.user_id.is_some() {
        return Ok(Redirect::to("/goals").into_response());
    }

    render(&state, jar, session, |templates, flashes| {
        templates.register_page(flashes)
    })
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);
    if session.user_id.is_some() {
        return Ok(Redirect::to("/goals").into_response());
    }

    let new_user = NewUser {
        username: form.username,
        password: form.password,
    };

    match state.user_repository.register(&new_user).await {
        Ok(_) => {
            session.success("Registration successful! Please log in.");
            redirect(&state, jar, &session, "/login")
        }
        Err(GoalError::DuplicateUsername) => {
            session.error("Username already exists. Please choose a different username.");
            render(&state, jar, session, |templates, flashes| {
                templates.register_page(flashes)
            })
        }
        Err(GoalError::Validation(message)) => {
            session.error(format!("{}.", message));
            render(&state, jar, session, |templates, flashes| {
                templates.register_page(flashes)
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// The user's goals, swept first, with the completed count
pub async fn goals(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    jar: CookieJar,
) -> WebResult<Response> {
    let session = state.sessions.load(&jar);

    let goals = state.goal_repository.list(user_id, now()).await?;
    let completed_goals_count = state.goal_repository.count_completed(user_id).await?;

    render(&state, jar, session, |templates, flashes| {
        templates.goals_page(&goals, completed_goals_count, flashes)
    })
}

pub async fn add_goal(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<AddGoalForm>,
) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);
    let deadline = format!("{} {}", form.deadline_date.trim(), form.deadline_time.trim());

    match state.goal_repository.add(user_id, &form.goal, &deadline).await {
        Ok(_) => session.success("Goal added successfully!"),
        Err(GoalError::InvalidDeadlineFormat(_)) => {
            session.error("Invalid deadline. Please enter a date and a time.")
        }
        Err(GoalError::Validation(message)) => session.error(format!("{}.", message)),
        Err(e) => return Err(e.into()),
    }

    redirect(&state, jar, &session, "/goals")
}

pub async fn remove_goal(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    jar: CookieJar,
    Path(goal_id): Path<i64>,
) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);

    match state.goal_repository.remove(user_id, goal_id).await {
        Ok(()) => session.success("Goal removed successfully!"),
        Err(GoalError::NotFoundOrUnauthorized) => {
            session.error("Invalid goal ID or unauthorized access.")
        }
        Err(e) => return Err(e.into()),
    }

    redirect(&state, jar, &session, "/goals")
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    jar: CookieJar,
    Path((goal_id, status)): Path<(i64, String)>,
) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);

    match status.parse::<StatusChange>() {
        Ok(change) => match state
            .goal_repository
            .set_status(user_id, goal_id, change, now())
            .await
        {
            Ok(()) => session.success("Goal status updated successfully!"),
            Err(GoalError::NotFoundOrUnauthorized) => {
                session.error("Invalid goal ID or unauthorized access.")
            }
            Err(e) => return Err(e.into()),
        },
        Err(unknown) => {
            warn!("User {} sent unknown goal status {:?}", user_id, unknown.0);
            session.error(unknown_status_notice(&unknown.0));
        }
    }

    redirect(&state, jar, &session, "/goals")
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let mut session = state.sessions.load(&jar);

    if let Some(user_id) = session.user_id {
        info!("User {} logged out", user_id);
    }
    session.log_out();
    session.success("Logout successful!");

    redirect(&state, jar, &session, "/")
}
