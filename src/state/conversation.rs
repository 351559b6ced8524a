//! Chat history, conversation stage and in-flight request tracking

use crate::api::ScrumApi;
use crate::models::{ApiResponse, Message, ProjectSummary, RecordedAudio};
use log::{debug, info};

/// Stage sent with the first request of a conversation
pub const INITIAL_STAGE: &str = "greeting";

pub const TEXT_APOLOGY: &str = "I'm sorry, I couldn't process your message. Please try again.";
pub const AUDIO_APOLOGY: &str = "I'm sorry, I couldn't process your audio. Please try again.";

/// A request the session has committed to; carries what the backend needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingText {
    pub text: String,
    pub stage: String,
}

/// Message history and stage of one chat session
#[derive(Debug, Clone)]
pub struct ConversationSession {
    messages: Vec<Message>,
    stage: String,
    is_processing: bool,
    project_summary: Option<ProjectSummary>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            stage: INITIAL_STAGE.to_string(),
            is_processing: false,
            project_summary: None,
        }
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn project_summary(&self) -> Option<&ProjectSummary> {
        self.project_summary.as_ref()
    }

    /// Replace the summary wholesale
    pub fn set_project_summary(&mut self, summary: ProjectSummary) {
        self.project_summary = Some(summary);
    }

    /// Whether the opening greeting still has to be fetched
    pub fn needs_greeting(&self) -> bool {
        self.messages.is_empty()
    }

    /// Apply the opening greeting; returns the speech segments to play
    pub fn apply_greeting(&mut self, response: ApiResponse) -> Vec<String> {
        if !self.needs_greeting() {
            return Vec::new();
        }
        match (response.success, response.message) {
            (true, Some(message)) => {
                self.messages.push(Message::bot(message));
                if let Some(stage) = response.stage {
                    self.stage = stage;
                }
                response.speech_segments.unwrap_or_default()
            }
            _ => {
                info!("Conversation could not be started");
                Vec::new()
            }
        }
    }

    /// Commit a typed message; `None` when it must not be sent
    pub fn begin_text(&mut self, text: &str) -> Option<PendingText> {
        let text = text.trim();
        if text.is_empty() || self.is_processing {
            return None;
        }

        self.is_processing = true;
        self.messages.push(Message::user(text));
        Some(PendingText {
            text: text.to_string(),
            stage: self.stage.clone(),
        })
    }

    /// Apply the reply to a typed message; returns the bot text to speak
    pub fn finish_text(&mut self, response: ApiResponse) -> Option<String> {
        self.is_processing = false;
        if !response.success {
            return Some(self.push_bot(TEXT_APOLOGY));
        }
        self.apply_reply(response)
    }

    /// Commit a recording; returns the stage to send it with
    pub fn begin_audio(&mut self) -> Option<String> {
        if self.is_processing {
            return None;
        }
        self.is_processing = true;
        Some(self.stage.clone())
    }

    /// Apply the reply to a recording; returns the bot text to speak
    pub fn finish_audio(&mut self, mut response: ApiResponse) -> Option<String> {
        self.is_processing = false;
        if !response.success {
            return Some(self.push_bot(AUDIO_APOLOGY));
        }
        if let Some(transcript) = response.transcript.take() {
            self.messages.push(Message::transcribed(transcript));
        }
        self.apply_reply(response)
    }

    fn apply_reply(&mut self, response: ApiResponse) -> Option<String> {
        if let Some(summary) = response.project_summary() {
            debug!("Reply carries summary for {}", summary.project_key);
            self.project_summary = Some(summary);
        }
        if let Some(stage) = response.stage {
            self.stage = stage;
        }
        response.message.map(|message| self.push_bot(message))
    }

    fn push_bot(&mut self, text: impl Into<String>) -> String {
        let message = Message::bot(text);
        let text = message.text.clone();
        self.messages.push(message);
        text
    }

    /// Fetch and apply the greeting
    pub async fn start(&mut self, api: &dyn ScrumApi) -> Vec<String> {
        if !self.needs_greeting() {
            return Vec::new();
        }
        let response = api.start_conversation().await;
        self.apply_greeting(response)
    }

    /// Send a typed message and apply the reply
    pub async fn submit_text(&mut self, api: &dyn ScrumApi, text: &str) -> Option<String> {
        let pending = self.begin_text(text)?;
        let response = api.send_message(&pending.text, &pending.stage).await;
        self.finish_text(response)
    }

    /// Upload a recording and apply the reply
    pub async fn submit_audio(
        &mut self,
        api: &dyn ScrumApi,
        audio: &RecordedAudio,
    ) -> Option<String> {
        let stage = self.begin_audio()?;
        let response = api.process_audio(audio, &stage).await;
        self.finish_audio(response)
    }
}
