use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Message, Role};
use crate::app::world::Npc;

pub(crate) const MISSING_KEY_FALLBACK: &str =
    "Error: API Key is missing in environment variables.";
pub(crate) const LOST_IN_THOUGHT_FALLBACK: &str =
    "Sorry, I got a bit lost in thought. Could you say that again?";

/// Produces the next NPC line. Never fails: errors degrade to a fallback line.
pub(crate) trait ReplyService: Send + Sync {
    fn generate_reply(&self, npc: &Npc, history: &[Message], user_message: &str) -> String;
}

#[derive(Debug, Error)]
pub(crate) enum ReplyError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("reply request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("reply endpoint returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed reply at {path}: {message}")]
    Malformed { path: String, message: String },
}

#[derive(Debug, Clone)]
pub(crate) struct ReplyClientConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) api_base: String,
    pub(crate) timeout: Duration,
}

impl ReplyClientConfig {
    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// Blocking client for the `generateContent` endpoint; called from worker threads.
pub(crate) struct GeminiReplyService {
    client: reqwest::blocking::Client,
    config: ReplyClientConfig,
}

impl GeminiReplyService {
    pub(crate) fn new(config: ReplyClientConfig) -> Result<Self, ReplyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ReplyError::Transport)?;
        Ok(Self { client, config })
    }

    pub(crate) fn try_generate(
        &self,
        npc: &Npc,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, ReplyError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ReplyError::MissingApiKey)?;

        let body = build_request(npc, history, user_message);
        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(ReplyError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReplyError::Status { status, body });
        }

        let bytes = response.bytes().map_err(ReplyError::Transport)?;
        parse_reply(&bytes)
    }
}

impl ReplyService for GeminiReplyService {
    fn generate_reply(&self, npc: &Npc, history: &[Message], user_message: &str) -> String {
        match self.try_generate(npc, history, user_message) {
            Ok(text) => {
                debug!(npc = %npc.id, chars = text.len(), "reply_received");
                text
            }
            Err(error) => fallback_for(npc, &error),
        }
    }
}

pub(crate) fn fallback_for(npc: &Npc, error: &ReplyError) -> String {
    warn!(npc = %npc.id, error = %error, "reply_failed");
    match error {
        ReplyError::MissingApiKey => MISSING_KEY_FALLBACK.to_string(),
        _ => LOST_IN_THOUGHT_FALLBACK.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn system_instruction(npc: &Npc) -> String {
    format!(
        "Character: {}. Context: {}. Constraint: Speak English only. \
Keep responses concise (under 50 words) suitable for a game dialog.",
        npc.name, npc.profile
    )
}

fn build_request(npc: &Npc, history: &[Message], user_message: &str) -> GenerateContentRequest {
    let mut contents = history
        .iter()
        .map(|message| Content {
            role: Some(message.role.as_wire().to_string()),
            parts: vec![Part {
                text: message.text.clone(),
            }],
        })
        .collect::<Vec<_>>();

    // History normally already ends with the just-sent line.
    let ends_with_user_message = history
        .last()
        .is_some_and(|last| last.role == Role::User && last.text == user_message);
    if !ends_with_user_message {
        contents.push(Content {
            role: Some(Role::User.as_wire().to_string()),
            parts: vec![Part {
                text: user_message.to_string(),
            }],
        });
    }

    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: system_instruction(npc),
            }],
        },
        contents,
    }
}

fn parse_reply(bytes: &[u8]) -> Result<String, ReplyError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    let response: GenerateContentResponse =
        serde_path_to_error::deserialize(deserializer).map_err(|error| ReplyError::Malformed {
            path: error.path().to_string(),
            message: error.inner().to_string(),
        })?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(ReplyError::Malformed {
            path: "candidates[0].content.parts".to_string(),
            message: "reply contained no text".to_string(),
        });
    }
    Ok(text.to_string())
}
