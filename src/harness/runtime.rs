//! The narrow surface through which the harness drives a store: validate
//! a node configuration, start a node, close it, and talk to the started
//! cluster through a put/get client.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Client;
use crate::EmbeddedNode;
use crate::NetworkConfig;
use crate::NodeConfig;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreRuntime: Send + Sync + 'static {
    /// Checks required fields and their mutual consistency
    ///
    /// # Errors
    /// `Error::InvalidConfig`
    fn validate(
        &self,
        config: &NodeConfig,
    ) -> Result<()>;

    /// Consumes `config` and returns once the node serves or has failed
    ///
    /// # Errors
    /// `Error::Startup`
    async fn start(
        &self,
        config: NodeConfig,
    ) -> Result<Box<dyn NodeHandle>>;

    /// Connects one client to every endpoint in `endpoints`
    ///
    /// # Errors
    /// `Error::Dial`
    async fn connect(
        &self,
        endpoints: Vec<String>,
        dial_timeout: Duration,
    ) -> Result<Box<dyn KvApi>>;
}

/// A running node, owned by the harness until it is closed
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeHandle: Send + Sync {
    fn name(&self) -> String;

    fn peer_urls(&self) -> Vec<String>;

    fn client_urls(&self) -> Vec<String>;

    /// Releases sockets, background tasks and storage of the node
    async fn close(&mut self);
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvApi: Send + Sync {
    /// # Errors
    /// `Error::Write`
    async fn put(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<()>;

    /// # Errors
    /// `Error::Read`
    async fn get(
        &self,
        key: Vec<u8>,
    ) -> Result<Option<Vec<u8>>>;
}

/// Runs every node in the current process on the crate's own store
#[derive(Debug, Clone, Default)]
pub struct EmbeddedRuntime {
    network: NetworkConfig,
}

impl EmbeddedRuntime {
    pub fn new(network: NetworkConfig) -> Self {
        Self { network }
    }
}

#[async_trait]
impl StoreRuntime for EmbeddedRuntime {
    fn validate(
        &self,
        config: &NodeConfig,
    ) -> Result<()> {
        config.validate()
    }

    async fn start(
        &self,
        config: NodeConfig,
    ) -> Result<Box<dyn NodeHandle>> {
        let node = EmbeddedNode::start(config, &self.network).await?;
        Ok(Box::new(node))
    }

    async fn connect(
        &self,
        endpoints: Vec<String>,
        dial_timeout: Duration,
    ) -> Result<Box<dyn KvApi>> {
        let client = Client::builder(endpoints)
            .dial_timeout(dial_timeout)
            .request_timeout(self.network.request_timeout())
            .max_frame_length(self.network.max_frame_length)
            .build()
            .await?;
        Ok(Box::new(client))
    }
}

#[async_trait]
impl NodeHandle for EmbeddedNode {
    fn name(&self) -> String {
        EmbeddedNode::name(self).to_string()
    }

    fn peer_urls(&self) -> Vec<String> {
        EmbeddedNode::peer_urls(self).to_vec()
    }

    fn client_urls(&self) -> Vec<String> {
        EmbeddedNode::client_urls(self).to_vec()
    }

    async fn close(&mut self) {
        EmbeddedNode::close(self).await
    }
}

#[async_trait]
impl KvApi for Client {
    async fn put(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<()> {
        self.kv().put(key, value).await.map(|_| ())
    }

    async fn get(
        &self,
        key: Vec<u8>,
    ) -> Result<Option<Vec<u8>>> {
        self.kv().get(key).await
    }
}
