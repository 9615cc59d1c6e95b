use tracing::debug;

use super::ConnectionPool;
use crate::bytes_to_display;
use crate::proto::ClientRequest;
use crate::proto::ClientResponse;
use crate::ClientConfig;
use crate::Error;
use crate::Result;

/// Key-value operations against the cluster's client endpoints
#[derive(Clone)]
pub struct KvClient {
    pub(super) pool: ConnectionPool,
    pub(super) config: ClientConfig,
}

impl KvClient {
    pub(crate) fn new(
        pool: ConnectionPool,
        config: ClientConfig,
    ) -> Self {
        Self { pool, config }
    }

    /// Stores `value` under `key` and returns the revision it was
    /// committed at
    ///
    /// # Errors
    /// `Error::Write` when no endpoint acknowledges the write
    pub async fn put(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<u64> {
        let request = ClientRequest::Put {
            key: key.as_ref().to_vec(),
            value: value.as_ref().to_vec(),
        };

        match self.pool.send(&request).await.map_err(Error::Write)? {
            ClientResponse::PutAck { revision } => {
                debug!(key = %bytes_to_display(key.as_ref()), revision, "put acknowledged");
                Ok(revision)
            }
            ClientResponse::Failed { code, message } => Err(Error::Write(format!("{code:?}: {message}"))),
            other => Err(Error::Write(format!("unexpected response {other:?}"))),
        }
    }

    /// Fetches the value stored under `key`
    ///
    /// # Returns
    /// - `Ok(Some(value))` if key exists
    /// - `Ok(None)` if key not found
    ///
    /// # Errors
    /// `Error::Read` when no endpoint answers the read
    pub async fn get(
        &self,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<Vec<u8>>> {
        let request = ClientRequest::Get {
            key: key.as_ref().to_vec(),
        };

        match self.pool.send(&request).await.map_err(Error::Read)? {
            ClientResponse::GetResult { value } => Ok(value),
            ClientResponse::Failed { code, message } => Err(Error::Read(format!("{code:?}: {message}"))),
            other => Err(Error::Read(format!("unexpected response {other:?}"))),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
