use super::{ConversationSession, SummaryViewState};
use crate::models::TodoTask;

/// The currently active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Landing,
    Chat,
}

/// Root application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub route: Route,
    pub session: ConversationSession,
    pub summary_view: SummaryViewState,
    pub todo_tasks: Vec<TodoTask>,
    pub is_refreshing_summary: bool,
    pub show_help: bool,
    /// Set once the greeting and task list have been requested
    chat_opened: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate to a screen; returns true the first time the chat opens
    pub fn navigate_to(&mut self, route: Route) -> bool {
        self.route = route;
        if route == Route::Chat && !self.chat_opened {
            self.chat_opened = true;
            return true;
        }
        false
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Epic, Progress, ProjectSummary};

    fn summary(updated: &str) -> ProjectSummary {
        ProjectSummary {
            project_name: "ScrumBot".to_string(),
            project_key: "SCRUM".to_string(),
            last_updated: updated.to_string(),
            epics: vec![Epic {
                key: "SCRUM-1".to_string(),
                summary: "Voice input".to_string(),
                status: "In Progress".to_string(),
                assignee: "Sam".to_string(),
                progress: Progress {
                    total: 4,
                    completed: 1,
                },
                stories: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_first_chat_visit_is_reported_once() {
        let mut state = AppState::new();
        assert_eq!(state.route, Route::Landing);

        assert!(state.navigate_to(Route::Chat));
        assert!(!state.navigate_to(Route::Landing));
        assert!(!state.navigate_to(Route::Chat));
        assert_eq!(state.route, Route::Chat);
    }

    #[test]
    fn test_expanded_epics_survive_summary_refresh() {
        let mut state = AppState::new();
        state.session.set_project_summary(summary("2024-03-01T10:00:00Z"));
        state.summary_view.toggle("SCRUM-1");

        state.session.set_project_summary(summary("2024-03-02T10:00:00Z"));

        let refreshed = state.session.project_summary().unwrap();
        assert_eq!(refreshed.last_updated, "2024-03-02T10:00:00Z");
        assert!(state.summary_view.is_expanded(&refreshed.epics[0].key));
    }
}
