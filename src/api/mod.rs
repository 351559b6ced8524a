//! HTTP access to the ScrumBot backend
//!
//! Every call converts its own failures into a plain result value, so callers
//! never see a transport error.

mod client;

use crate::models::{ApiResponse, AudioClip, RecordedAudio, TodoTask};
use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpApi;

/// Failure of a single backend request, before it is downgraded
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Operations the client needs from the backend
#[async_trait]
pub trait ScrumApi: Send + Sync {
    /// Fetch the opening greeting and its speech segments
    async fn start_conversation(&self) -> ApiResponse;

    /// Send a typed message for the given stage
    async fn send_message(&self, text: &str, stage: &str) -> ApiResponse;

    /// Synthesize speech; `None` when synthesis failed
    async fn speak(&self, text: &str) -> Option<AudioClip>;

    /// Upload a recording for transcription and a reply
    async fn process_audio(&self, audio: &RecordedAudio, stage: &str) -> ApiResponse;

    /// Fetch the project status report
    async fn project_summary(&self, project_key: &str) -> ApiResponse;

    /// Open tasks of the current user; empty on failure
    async fn todo_tasks(&self) -> Vec<TodoTask>;
}
