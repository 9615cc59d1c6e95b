use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Deadlines for every network operation the harness and the store perform.
///
/// A timed out operation is a terminal failure; nothing here is retried.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    /// Client dial deadline
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_in_ms: u64,

    /// Put/Get completion deadline, also bounds primary-to-peer replication
    #[serde(default = "default_request_timeout")]
    pub request_timeout_in_ms: u64,

    /// Per-address deadline for the reachability sweep
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_in_ms: u64,

    /// TCP connect deadline between members
    #[serde(default = "default_peer_connect_timeout")]
    pub peer_connect_timeout_in_ms: u64,

    /// Largest accepted frame in bytes
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,

    #[serde(default = "default_listen_backlog")]
    pub listen_backlog: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            dial_timeout_in_ms: default_dial_timeout(),
            request_timeout_in_ms: default_request_timeout(),
            probe_timeout_in_ms: default_probe_timeout(),
            peer_connect_timeout_in_ms: default_peer_connect_timeout(),
            max_frame_length: default_max_frame_length(),
            listen_backlog: default_listen_backlog(),
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("dial_timeout_in_ms", self.dial_timeout_in_ms),
            ("request_timeout_in_ms", self.request_timeout_in_ms),
            ("probe_timeout_in_ms", self.probe_timeout_in_ms),
            ("peer_connect_timeout_in_ms", self.peer_connect_timeout_in_ms),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be > 0")));
            }
        }

        if self.peer_connect_timeout_in_ms >= self.request_timeout_in_ms {
            return Err(Error::InvalidConfig(format!(
                "peer connect timeout {}ms must be below request timeout {}ms",
                self.peer_connect_timeout_in_ms, self.request_timeout_in_ms
            )));
        }

        if self.max_frame_length < 1024 {
            return Err(Error::InvalidConfig(format!(
                "max_frame_length {} too small, minimum 1024 bytes",
                self.max_frame_length
            )));
        }

        if self.listen_backlog == 0 {
            return Err(Error::InvalidConfig("listen_backlog must be > 0".into()));
        }

        Ok(())
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_in_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_in_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_in_ms)
    }

    pub fn peer_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_connect_timeout_in_ms)
    }
}

fn default_dial_timeout() -> u64 {
    10_000
}
fn default_request_timeout() -> u64 {
    5_000
}
fn default_probe_timeout() -> u64 {
    1_000
}
fn default_peer_connect_timeout() -> u64 {
    500
}
fn default_max_frame_length() -> usize {
    8 * 1024 * 1024
}
fn default_listen_backlog() -> u32 {
    1024
}
