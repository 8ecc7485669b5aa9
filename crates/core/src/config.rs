use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::paths::Paths;

/// Environment variable that forces the testing flag on or off.
pub const TESTING_ENV: &str = "DEVFRONT_TESTING";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Debugger endpoint, e.g. `ws://127.0.0.1:6080`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Capacity of the outgoing packet queue.
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:6080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_send_buffer() -> usize {
    256
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            send_buffer: default_send_buffer(),
        }
    }
}

/// Process-wide runtime switches consulted by fronts at call time.
///
/// Fronts never read these from a global; callers pass them in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFlags {
    /// Test mode: the highlighter stays visible across hovers unless a hide
    /// is forced.
    #[serde(default)]
    pub testing: bool,
}

impl RuntimeFlags {
    pub fn testing() -> Self {
        Self { testing: true }
    }

    /// Apply an override from `DEVFRONT_TESTING` if it is set.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(raw) = std::env::var(TESTING_ENV) {
            match parse_bool(&raw) {
                Some(testing) => {
                    debug!(testing, "testing flag overridden from environment");
                    self.testing = testing;
                }
                None => debug!(value = %raw, "ignoring unrecognised {}", TESTING_ENV),
            }
        }
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub flags: RuntimeFlags,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.client.endpoint.trim().is_empty() {
            return Err(Error::Config("client.endpoint must not be empty".to_string()));
        }
        if self.client.request_timeout_ms == 0 {
            return Err(Error::Config("client.requestTimeoutMs must be > 0".to_string()));
        }
        if self.client.send_buffer == 0 {
            return Err(Error::Config("client.sendBuffer must be > 0".to_string()));
        }
        Ok(())
    }

    /// Flags with the environment override applied.
    pub fn runtime_flags(&self) -> RuntimeFlags {
        self.flags.with_env_override()
    }
}
