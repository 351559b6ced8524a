use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single chat entry, either typed/spoken by the user or replied by the bot
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Local>,
    /// Set when the text came from speech recognition
    pub transcript: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), true, None)
    }

    /// A user message whose text is the recognized transcript of a recording
    pub fn transcribed(transcript: impl Into<String>) -> Self {
        let transcript = transcript.into();
        Self::new(transcript.clone(), true, Some(transcript))
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text.into(), false, None)
    }

    fn new(text: String, is_user: bool, transcript: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            is_user,
            timestamp: Local::now(),
            transcript,
        }
    }

    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Uniform response envelope shared by every JSON endpoint of the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_segments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(
        default,
        rename = "summaryData",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary_data: Option<SummaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ApiResponse {
    /// The result every failed call is downgraded to
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Project summary carried by this response, if any
    ///
    /// Chat replies nest it under `summaryData.project`; the summary endpoint
    /// returns it as `data`.
    pub fn project_summary(&self) -> Option<ProjectSummary> {
        if let Some(project) = self.summary_data.as_ref().and_then(|s| s.project.clone()) {
            return Some(project);
        }
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}

/// Stand-up summary envelope attached to a chat reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub standup: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectSummary>,
}

/// Read-only project status: epics and their stories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_name: String,
    pub project_key: String,
    pub last_updated: String,
    #[serde(default)]
    pub epics: Vec<Epic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub key: String,
    pub summary: String,
    pub status: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Epic {
    /// Completion fraction clamped to 0.0..=1.0 (0.0 for an empty epic)
    pub fn progress_fraction(&self) -> f32 {
        if self.progress.total == 0 {
            return 0.0;
        }
        (self.progress.completed as f32 / self.progress.total as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub key: String,
    pub summary: String,
    pub status: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub updated: String,
}

/// An open task assigned to the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTask {
    pub key: String,
    pub summary: String,
    pub status: String,
}

/// Synthesized speech as returned by the backend (WAV bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub const MIME_TYPE: &'static str = "audio/wav";

    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// A finished microphone recording, encoded as a single WAV blob
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_chat_reply_with_summary() {
        let json = r#"{
            "success": true,
            "message": "Here is your summary",
            "stage": "done",
            "summaryData": {
                "type": "summary",
                "standup": "Yesterday: X",
                "project": {
                    "projectName": "Scrum Demo",
                    "projectKey": "SCRUM",
                    "lastUpdated": "2024-03-01T10:00:00Z",
                    "epics": [{
                        "key": "SCRUM-1",
                        "summary": "Login",
                        "status": "In Progress",
                        "assignee": "Ana",
                        "progress": {"total": 4, "completed": 1},
                        "stories": [{
                            "key": "SCRUM-2",
                            "summary": "Form",
                            "status": "Done",
                            "assignee": "Ana",
                            "priority": "High",
                            "updated": "2024-03-01T09:00:00Z"
                        }]
                    }]
                }
            }
        }"#;

        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.stage.as_deref(), Some("done"));

        let summary = response.project_summary().unwrap();
        assert_eq!(summary.project_key, "SCRUM");
        assert_eq!(summary.epics[0].progress, Progress { total: 4, completed: 1 });
        assert_eq!(summary.epics[0].stories[0].priority, "High");
    }

    #[test]
    fn test_summary_from_data_field() {
        let response = ApiResponse {
            success: true,
            data: Some(serde_json::json!({
                "projectName": "P",
                "projectKey": "K",
                "lastUpdated": "now",
                "epics": []
            })),
            ..Default::default()
        };
        assert_eq!(response.project_summary().unwrap().project_name, "P");
    }

    #[test]
    fn test_summary_absent_or_malformed() {
        assert!(ApiResponse::failure("nope").project_summary().is_none());

        let response = ApiResponse {
            success: true,
            data: Some(serde_json::json!({"unexpected": true})),
            ..Default::default()
        };
        assert!(response.project_summary().is_none());
    }

    #[test]
    fn test_progress_fraction() {
        let mut epic = Epic {
            key: "E".into(),
            summary: "s".into(),
            status: "Done".into(),
            assignee: String::new(),
            progress: Progress { total: 0, completed: 0 },
            stories: Vec::new(),
        };
        assert_eq!(epic.progress_fraction(), 0.0);

        epic.progress = Progress { total: 4, completed: 1 };
        assert_eq!(epic.progress_fraction(), 0.25);

        epic.progress = Progress { total: 2, completed: 5 };
        assert_eq!(epic.progress_fraction(), 1.0);
    }

    #[test]
    fn test_transcribed_message_keeps_transcript() {
        let message = Message::transcribed("hello");
        assert!(message.is_user);
        assert_eq!(message.text, "hello");
        assert_eq!(message.transcript.as_deref(), Some("hello"));
    }
}
