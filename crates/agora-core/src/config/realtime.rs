//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound queue capacity per connection. Events beyond this are
    /// dropped for that recipient.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Seconds without a pong before a connection is closed.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Maximum inbound frame size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Maximum room name length in bytes.
    #[serde(default = "default_max_room_name_length")]
    pub max_room_name_length: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_message_size: default_max_message_size(),
            max_room_name_length: default_max_room_name_length(),
        }
    }
}

impl RealtimeConfig {
    /// Rejects zero sizes and zero heartbeat timings.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("channel_buffer_size", self.channel_buffer_size as u64),
            ("ping_interval_seconds", self.ping_interval_seconds),
            ("ping_timeout_seconds", self.ping_timeout_seconds),
            ("max_message_size", self.max_message_size as u64),
            ("max_room_name_length", self.max_room_name_length as u64),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(AppError::configuration(format!(
                "realtime.{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    25
}

fn default_ping_timeout() -> u64 {
    60
}

fn default_max_message_size() -> usize {
    65_536
}

fn default_max_room_name_length() -> usize {
    256
}
