//! Static configuration
//!
//! All values are fixed before the core starts: network credentials,
//! broker address, the four topic strings, and the camera endpoint. The
//! firmware embeds `opsis.toml` at compile time and parses it once during
//! boot; the core treats every value as an opaque immutable string/int.

use serde::Deserialize;
use thiserror::Error;

use crate::telemetry::TopicSet;

/// Default MQTT broker port
pub const DEFAULT_BROKER_PORT: u16 = 1883;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Wi-Fi credentials
#[derive(Debug, Clone, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

/// Camera endpoint, host plus absolute path
#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub host: String,
    pub path: String,
}

/// MQTT broker endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_port() -> u16 {
    DEFAULT_BROKER_PORT
}

fn default_client_id() -> String {
    "OpsisDisplay".to_string()
}

/// The four telemetry topics
#[derive(Debug, Clone, Deserialize)]
pub struct TopicsConfig {
    pub nozzle: String,
    pub bed: String,
    pub progress: String,
    pub state: String,
}

/// Fetch loop tuning
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FetchConfig {
    /// Consecutive empty polls tolerated before a stalled fetch is abandoned
    pub max_idle_polls: Option<u32>,
}

/// Complete device configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wifi: WifiConfig,
    pub camera: CameraConfig,
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Config {
    /// Parse a TOML configuration document
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Camera URL, assembled once at startup
    pub fn camera_url(&self) -> String {
        format!("http://{}{}", self.camera.host, self.camera.path)
    }

    /// Topic set for dispatch and subscription
    pub fn topic_set(&self) -> TopicSet {
        TopicSet {
            nozzle: self.topics.nozzle.clone(),
            bed: self.topics.bed.clone(),
            progress: self.topics.progress.clone(),
            state: self.topics.state.clone(),
        }
    }

    /// Fetch limits with config overrides applied
    pub fn fetch_limits(&self) -> crate::fetch::FetchLimits {
        let mut limits = crate::fetch::FetchLimits::default();
        if let Some(polls) = self.fetch.max_idle_polls {
            limits.max_idle_polls = polls;
        }
        limits
    }
}
