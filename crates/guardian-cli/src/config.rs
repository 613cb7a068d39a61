use anyhow::{Context, Result};
use guardian_core::{Mode, DEFAULT_CHAT_TIMEOUT};
use guardian_remote::{ChatConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Optional TOML base layer. Every field may be omitted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub chat_timeout_secs: Option<u64>,
    pub mode: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Effective configuration: file < `GUARDIAN_*` environment < CLI flags.
pub struct Config {
    /// Remote model credential. `None` disables delegation.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    /// Bound on each delegated call, at least one second.
    pub chat_timeout: Duration,
    /// Mission mode used when no `--mode` flag is given.
    pub mode: Mode,
}

impl Config {
    /// Load from an optional TOML file (`path`, else `GUARDIAN_CONFIG`) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("GUARDIAN_CONFIG").ok();
        let path = path.or(env_path.as_deref().map(Path::new));
        let file = match path {
            Some(p) => FileConfig::read(p)?,
            None => FileConfig::default(),
        };
        Ok(Self::from_sources(file, |key| std::env::var(key).ok()))
    }

    /// Merge a file layer with an environment lookup.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = env("GUARDIAN_API_KEY")
            .or(file.api_key)
            .filter(|k| !k.is_empty());

        let model = env("GUARDIAN_MODEL")
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = env("GUARDIAN_API_BASE")
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = env_u64(&env, "GUARDIAN_CHAT_TIMEOUT_SECS")
            .or(file.chat_timeout_secs)
            .unwrap_or(DEFAULT_CHAT_TIMEOUT.as_secs())
            .max(1);

        let mode = env("GUARDIAN_MODE")
            .or(file.mode)
            .map(|m| Mode::parse_lossy(&m))
            .unwrap_or_default();

        Self {
            api_key,
            model,
            api_base,
            chat_timeout: Duration::from_secs(timeout_secs),
            mode,
        }
    }

    /// Remote chat settings, if a credential is configured.
    pub fn chat_config(&self) -> Option<ChatConfig> {
        let key = self.api_key.as_ref()?;
        let mut chat = ChatConfig::new(key.clone());
        chat.model = self.model.clone();
        chat.base_url = self.api_base.clone();
        chat.timeout = self.chat_timeout;
        Some(chat)
    }
}

fn env_u64(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    env(key).and_then(|v| v.parse().ok())
}
