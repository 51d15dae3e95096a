//! Sync configuration.

use crate::error::{Result, SyncError};
use crate::reconcile::FrameEncoding;
use crate::subscriptions::SubscriptionConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a detail controller and its push channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Streaming endpoint handed to the transport adapter.
    pub endpoint: String,

    /// Topic prefix; the per-tweet topic is `{topic_prefix}/{id}`.
    pub topic_prefix: String,

    /// Max buffered transport events before the subscription is dropped.
    /// Default: 1000
    pub buffer_size: usize,

    /// Encoding of pushed frame bodies.
    pub frame_encoding: FrameEncoding,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8000/websocket".to_string(),
            topic_prefix: "/topic/tweet".to_string(),
            buffer_size: 1000,
            frame_encoding: FrameEncoding::Json,
        }
    }
}

impl SyncConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::InvalidConfig("endpoint is empty".into()));
        }
        if !self.topic_prefix.starts_with('/') || self.topic_prefix.ends_with('/') {
            return Err(SyncError::InvalidConfig(format!(
                "topic prefix {:?} must start with '/' and not end with '/'",
                self.topic_prefix
            )));
        }
        if self.buffer_size == 0 {
            return Err(SyncError::InvalidConfig("buffer_size must be positive".into()));
        }
        Ok(())
    }

    /// Settings the subscription manager needs.
    pub fn subscription(&self) -> SubscriptionConfig {
        SubscriptionConfig {
            endpoint: self.endpoint.clone(),
            topic_prefix: self.topic_prefix.clone(),
            buffer_size: self.buffer_size,
            frame_encoding: self.frame_encoding,
        }
    }
}
