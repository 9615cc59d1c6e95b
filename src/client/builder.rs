use std::time::Duration;

use super::Client;
use super::ClientConfig;
use super::ConnectionPool;
use super::KvClient;
use crate::Result;

pub struct ClientBuilder {
    config: ClientConfig,
    endpoints: Vec<String>,
}

impl ClientBuilder {
    /// Create a new builder with default config and specified endpoints
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            config: ClientConfig::default(),
            endpoints,
        }
    }

    /// Set connection timeout (default: 1s)
    pub fn dial_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.dial_timeout = timeout;
        self
    }

    /// Set request timeout (default: 3s)
    pub fn request_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_frame_length(
        mut self,
        max_frame_length: usize,
    ) -> Self {
        self.config.max_frame_length = max_frame_length;
        self
    }

    /// Completely replaces the default configuration
    ///
    /// Discards every setting made earlier through
    /// [`dial_timeout`](ClientBuilder::dial_timeout) and friends.
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Dials the endpoints and builds the client
    ///
    /// # Errors
    /// `Error::Dial` if no endpoint accepts a connection within the dial
    /// timeout
    pub async fn build(self) -> Result<Client> {
        let pool = ConnectionPool::create(self.endpoints.clone(), self.config.clone()).await?;
        Ok(Client {
            kv: KvClient::new(pool, self.config),
            endpoints: self.endpoints,
        })
    }
}
