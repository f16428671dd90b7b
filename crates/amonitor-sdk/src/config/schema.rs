use std::net::SocketAddr;
use std::time::Duration;

use amonitor_core::error::{AmonitorError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub target: TargetSection,
}

impl SdkConfig {
    /// Programmatic config with defaults for everything but the target id.
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            target: TargetSection {
                id: target_id.into(),
                heartbeat_interval_secs: default_heartbeat_interval_secs(),
                auth_token: None,
            },
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.target.auth_token = Some(token.into());
        self
    }

    pub fn with_heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.target.heartbeat_interval_secs = secs;
        self
    }

    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.server.listen = listen.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AmonitorError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.target.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_frame_bytes: default_max_frame_bytes(),
            broadcast_timeout_ms: default_broadcast_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1024..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(AmonitorError::Config(
                "server.max_frame_bytes must be between 1024 and 16777216".into(),
            ));
        }
        if !(1..=60000).contains(&self.broadcast_timeout_ms) {
            return Err(AmonitorError::Config(
                "server.broadcast_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            AmonitorError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    pub id: String,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Bearer token required at handshake. Unset or empty disables the check.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl TargetSection {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AmonitorError::Config("target.id must not be empty".into()));
        }
        if !(1..=3600).contains(&self.heartbeat_interval_secs) {
            return Err(AmonitorError::Config(
                "target.heartbeat_interval_secs must be between 1 and 3600".into(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Configured token, with an empty string treated as unset.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8765".into()
}
fn default_max_frame_bytes() -> usize {
    64 * 1024
}
fn default_broadcast_timeout_ms() -> u64 {
    1500
}
fn default_heartbeat_interval_secs() -> u64 {
    10
}
