//! Local view state for the project status report

use chrono::{DateTime, Local};
use std::collections::BTreeSet;

/// Display colour class of an issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Done,
    InProgress,
    Blocked,
    Default,
}

impl StatusColor {
    pub fn for_status(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "done" => Self::Done,
            "in progress" => Self::InProgress,
            "blocked" => Self::Blocked,
            _ => Self::Default,
        }
    }

    /// Badge colour as 0xRRGGBB
    pub fn rgb(self) -> u32 {
        match self {
            Self::Done => 0x22c55e,
            Self::InProgress => 0x3b82f6,
            Self::Blocked => 0xef4444,
            Self::Default => 0x6b7280,
        }
    }
}

/// Which epics are expanded, keyed by epic key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryViewState {
    expanded: BTreeSet<String>,
}

impl SummaryViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, epic_key: &str) -> bool {
        self.expanded.contains(epic_key)
    }

    pub fn toggle(&mut self, epic_key: &str) {
        if !self.expanded.remove(epic_key) {
            self.expanded.insert(epic_key.to_string());
        }
    }
}

/// Render an RFC 3339 timestamp as e.g. `Mar 1, 2024, 10:00 AM` in local time
///
/// Values that do not parse are shown verbatim.
pub fn format_timestamp(value: &str) -> String {
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%b %-d, %Y, %I:%M %p")
            .to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lookup_is_case_insensitive() {
        assert_eq!(StatusColor::for_status("Done"), StatusColor::Done);
        assert_eq!(StatusColor::for_status("DONE"), StatusColor::Done);
        assert_eq!(StatusColor::for_status("In Progress"), StatusColor::InProgress);
        assert_eq!(StatusColor::for_status("blocked"), StatusColor::Blocked);
    }

    #[test]
    fn test_unknown_status_falls_back() {
        for status in ["To Do", "", "In Review", "progress"] {
            assert_eq!(StatusColor::for_status(status), StatusColor::Default);
        }
        assert_eq!(StatusColor::Default.rgb(), 0x6b7280);
    }

    #[test]
    fn test_toggle_is_per_key() {
        let mut view = SummaryViewState::new();
        view.toggle("SCRUM-1");
        view.toggle("SCRUM-2");
        assert!(view.is_expanded("SCRUM-1"));
        assert!(view.is_expanded("SCRUM-2"));

        view.toggle("SCRUM-1");
        assert!(!view.is_expanded("SCRUM-1"));
        assert!(view.is_expanded("SCRUM-2"));
        assert!(!view.is_expanded("SCRUM-3"));
    }

    #[test]
    fn test_format_timestamp() {
        let formatted = format_timestamp("2024-03-01T10:00:00Z");
        assert!(formatted.contains("2024"), "{formatted}");
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"), "{formatted}");

        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
