//! Remote delegation with local fallback.
//!
//! A [`Responder`] optionally holds a [`ChatBackend`]. When present, each
//! question is first sent to the backend with a bounded timeout; any failure
//! is logged and answered by [`synthesize`] instead. Callers never see a
//! delegation error.

use crate::respond::{synthesize, vision_context};
use crate::types::{Mode, Scene};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(10);

const PERSONA: &str = "You are Guardian X, an AI situational-awareness assistant \
    supporting field operators. Answer in at most three short plain-text sentences \
    suitable for speech. Do not use markdown.";

/// Characters stripped from remote replies before display and narration.
const DECORATIVE_MARKUP: [char; 5] = ['*', '#', '`', '_', '~'];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DelegationError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote reply was empty")]
    EmptyReply,
}

/// A remote language model that turns a prompt into reply text.
pub trait ChatBackend: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, DelegationError>> + Send;
}

/// Placeholder backend type for responders that never delegate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChat;

impl ChatBackend for NoChat {
    async fn complete(&self, _prompt: &str) -> Result<String, DelegationError> {
        Err(DelegationError::Transport("no chat backend configured".into()))
    }
}

/// Build the single prompt string sent to the remote model.
pub fn build_prompt(text: &str, scene: &Scene, mode: Mode) -> String {
    format!(
        "{PERSONA}\nMission mode: {mode}.\nVision context: {}\nUser: {}",
        vision_context(scene),
        text.trim()
    )
}

/// Strip decorative markup and control characters, collapse whitespace.
pub fn sanitize_reply(raw: &str) -> String {
    raw.chars()
        .filter(|c| !DECORATIVE_MARKUP.contains(c))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Answers questions, delegating to a chat backend when one is configured.
#[derive(Debug, Clone)]
pub struct Responder<C = NoChat> {
    chat: Option<C>,
    timeout: Duration,
}

impl Responder<NoChat> {
    /// A responder that only uses local templates.
    pub fn local() -> Self {
        Self {
            chat: None,
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }
}

impl Default for Responder<NoChat> {
    fn default() -> Self {
        Self::local()
    }
}

impl<C: ChatBackend> Responder<C> {
    pub fn new(chat: Option<C>) -> Self {
        Self {
            chat,
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    pub fn with_chat(chat: C) -> Self {
        Self::new(Some(chat))
    }

    /// Bound on each delegated call. A timeout counts as a delegation failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce the answer for `text`. Never fails.
    pub async fn respond(&self, text: &str, scene: &Scene, mode: Mode) -> String {
        if let Some(chat) = &self.chat {
            match self.delegate(chat, text, scene, mode).await {
                Ok(reply) => {
                    tracing::debug!(chars = reply.len(), "remote reply accepted");
                    return reply;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "delegation failed; falling back to local synthesis");
                }
            }
        }
        synthesize(text, scene, mode)
    }

    async fn delegate(
        &self,
        chat: &C,
        text: &str,
        scene: &Scene,
        mode: Mode,
    ) -> Result<String, DelegationError> {
        let prompt = build_prompt(text, scene, mode);
        let raw = tokio::time::timeout(self.timeout, chat.complete(&prompt))
            .await
            .map_err(|_| DelegationError::Timeout(self.timeout))??;

        let reply = sanitize_reply(&raw);
        if reply.is_empty() {
            return Err(DelegationError::EmptyReply);
        }
        Ok(reply)
    }
}
