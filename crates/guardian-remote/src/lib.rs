//! guardian-remote — Remote language-model backend for guardian-core.
//!
//! Speaks the Gemini `generateContent` JSON API over HTTPS and implements
//! [`guardian_core::ChatBackend`], mapping every failure to a
//! [`guardian_core::DelegationError`] so the core can fall back locally.

pub mod gemini;
pub mod wire;

pub use gemini::{ChatConfig, ClientError, GeminiChat, DEFAULT_BASE_URL, DEFAULT_MODEL};
