//! Server-rendered pages
//!
//! Templates live in `templates/` and are compiled into the binary. All
//! pages share the `layout` partial, which also renders the flash notices.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    models::{Goal, GoalStatus},
    session::Flash,
};

/// Deadline layout shown to users
const DEADLINE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A goal as the goals page sees it
#[derive(Debug, Serialize)]
struct GoalView<'a> {
    id: i64,
    goal: &'a str,
    status: &'static str,
    deadline: String,
    is_pending: bool,
    is_completed: bool,
}

impl<'a> From<&'a Goal> for GoalView<'a> {
    fn from(goal: &'a Goal) -> Self {
        Self {
            id: goal.id,
            goal: &goal.goal,
            status: goal.status.as_str(),
            deadline: goal
                .deadline
                .map(|d| d.format(DEADLINE_DISPLAY_FORMAT).to_string())
                .unwrap_or_default(),
            is_pending: goal.status == GoalStatus::Pending,
            is_completed: goal.status == GoalStatus::Completed,
        }
    }
}

/// Compiled page templates
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

impl Templates {
    /// Compile the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("layout", include_str!("../templates/layout.hbs"))?;
        registry.register_template_string("login", include_str!("../templates/login.hbs"))?;
        registry.register_template_string("register", include_str!("../templates/register.hbs"))?;
        registry.register_template_string("goals", include_str!("../templates/goals.hbs"))?;

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn login_page(&self, flashes: &[Flash]) -> Result<String, RenderError> {
        self.registry.render("login", &json!({ "flashes": flashes }))
    }

    pub fn register_page(&self, flashes: &[Flash]) -> Result<String, RenderError> {
        self.registry.render("register", &json!({ "flashes": flashes }))
    }

    pub fn goals_page(
        &self,
        goals: &[Goal],
        completed_goals_count: i64,
        flashes: &[Flash],
    ) -> Result<String, RenderError> {
        let goals: Vec<GoalView<'_>> = goals.iter().map(GoalView::from).collect();

        self.registry.render(
            "goals",
            &json!({
                "goals": goals,
                "completed_goals_count": completed_goals_count,
                "flashes": flashes,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashCategory;
    use chrono::NaiveDate;

    fn goal(id: i64, text: &str, status: GoalStatus) -> Goal {
        Goal {
            id,
            user_id: 1,
            goal: text.to_string(),
            status,
            deadline: NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(9, 0, 0)),
        }
    }

    #[test]
    fn test_goals_page_lists_goals_and_count() {
        let templates = Templates::new().unwrap();
        let goals = vec![
            goal(1, "Learn Rust", GoalStatus::Pending),
            goal(2, "Ship it", GoalStatus::Completed),
        ];

        let html = templates.goals_page(&goals, 1, &[]).unwrap();

        assert!(html.contains("Learn Rust"));
        assert!(html.contains("2024-01-01 09:00"));
        assert!(html.contains("/update_status/1/completed"));
        assert!(!html.contains("/update_status/2/completed"));
        assert!(html.contains("/update_status/2/pending"));
        assert!(html.contains("/remove_goal/2"));
        assert!(html.contains("Completed goals: <strong>1</strong>"));
    }

    #[test]
    fn test_goal_text_is_escaped() {
        let templates = Templates::new().unwrap();
        let goals = vec![goal(1, "<script>alert(1)</script>", GoalStatus::Expired)];

        let html = templates.goals_page(&goals, 0, &[]).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_notices_are_rendered() {
        let templates = Templates::new().unwrap();
        let flashes = vec![Flash {
            category: FlashCategory::Error,
            message: "Invalid username or password. Please try again.".to_string(),
        }];

        let html = templates.login_page(&flashes).unwrap();

        assert!(html.contains("notice error"));
        assert!(html.contains("Invalid username or password. Please try again."));
    }

    #[test]
    fn test_empty_goals_page() {
        let templates = Templates::new().unwrap();

        let html = templates.goals_page(&[], 0, &[]).unwrap();

        assert!(html.contains("No goals yet."));
        assert!(templates.register_page(&[]).unwrap().contains("Register"));
    }
}
