use std::time::Duration;

/// Client configuration parameters for connection management
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum time to wait for establishing a TCP connection
    /// Default: 1 second
    pub dial_timeout: Duration,

    /// Maximum time to wait for a complete response
    /// Default: 3 seconds
    pub request_timeout: Duration,

    /// Maximum size of a single frame in bytes
    /// Default: 1MB
    pub max_frame_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(3000),
            max_frame_length: 1 << 20, // 1MB
        }
    }
}
