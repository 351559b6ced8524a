//! reqwest implementation of [`ScrumApi`]

use super::{ApiError, ScrumApi};
use crate::models::{ApiResponse, AudioClip, RecordedAudio, TodoTask};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const START_FAILED: &str = "Failed to start conversation";
const SEND_FAILED: &str = "Failed to send message";
const AUDIO_FAILED: &str = "Failed to process audio";
const SUMMARY_FAILED: &str = "Failed to fetch project summary";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    stage: &'a str,
}

#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TodoTasksResponse {
    #[serde(default)]
    tasks: Vec<TodoTask>,
}

/// Backend client rooted at the API base URL (e.g. `http://host:8000/api`)
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn try_start(&self) -> Result<ApiResponse, ApiError> {
        let response = self.client.get(self.url("/start")).send().await?;
        decode(response).await
    }

    async fn try_send(&self, text: &str, stage: &str) -> Result<ApiResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&ChatRequest {
                message: text,
                stage,
            })
            .send()
            .await?;
        decode(response).await
    }

    async fn try_speak(&self, text: &str) -> Result<AudioClip, ApiError> {
        let response = self
            .client
            .post(self.url("/speak"))
            .json(&SpeakRequest { text })
            .send()
            .await?;
        let response = check_status(response)?;
        let bytes = response.bytes().await?;
        Ok(AudioClip::new(bytes.to_vec()))
    }

    async fn try_process_audio(
        &self,
        audio: &RecordedAudio,
        stage: &str,
    ) -> Result<ApiResponse, ApiError> {
        let part = Part::bytes(audio.bytes.clone())
            .file_name("recording.wav")
            .mime_str(AudioClip::MIME_TYPE)?;
        let form = Form::new()
            .part("audio", part)
            .text("stage", stage.to_string());

        let response = self
            .client
            .post(self.url("/audio"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn try_project_summary(&self, project_key: &str) -> Result<ApiResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/project-summary"))
            .query(&[("projectKey", project_key)])
            .send()
            .await?;
        decode(response).await
    }

    async fn try_todo_tasks(&self) -> Result<Vec<TodoTask>, ApiError> {
        let response = self.client.get(self.url("/get_todo_tasks")).send().await?;
        let body: TodoTasksResponse = decode(response).await?;
        Ok(body.tasks)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response)?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Log the failure and replace it with the fixed per-operation result
fn downgrade(result: Result<ApiResponse, ApiError>, what: &str, message: &str) -> ApiResponse {
    result.unwrap_or_else(|e| {
        warn!("Error {}: {}", what, e);
        ApiResponse::failure(message)
    })
}

#[async_trait]
impl ScrumApi for HttpApi {
    async fn start_conversation(&self) -> ApiResponse {
        debug!("Starting conversation");
        downgrade(self.try_start().await, "starting conversation", START_FAILED)
    }

    async fn send_message(&self, text: &str, stage: &str) -> ApiResponse {
        debug!("Sending message at stage {:?}", stage);
        downgrade(self.try_send(text, stage).await, "sending message", SEND_FAILED)
    }

    async fn speak(&self, text: &str) -> Option<AudioClip> {
        match self.try_speak(text).await {
            Ok(clip) => Some(clip),
            Err(e) => {
                warn!("Error converting text to speech: {}", e);
                None
            }
        }
    }

    async fn process_audio(&self, audio: &RecordedAudio, stage: &str) -> ApiResponse {
        debug!(
            "Uploading {:.1}s recording ({} bytes) at stage {:?}",
            audio.duration_seconds,
            audio.bytes.len(),
            stage
        );
        downgrade(
            self.try_process_audio(audio, stage).await,
            "processing audio",
            AUDIO_FAILED,
        )
    }

    async fn project_summary(&self, project_key: &str) -> ApiResponse {
        downgrade(
            self.try_project_summary(project_key).await,
            "fetching project summary",
            SUMMARY_FAILED,
        )
    }

    async fn todo_tasks(&self) -> Vec<TodoTask> {
        self.try_todo_tasks().await.unwrap_or_else(|e| {
            warn!("Error getting TODO tasks: {}", e);
            Vec::new()
        })
    }
}
