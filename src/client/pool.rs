use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use crate::network::connect;
use crate::network::FramedStream;
use crate::proto::ClientRequest;
use crate::proto::ClientResponse;
use crate::url_to_host_port;
use crate::ClientConfig;
use crate::Error;
use crate::Result;

/// One dialed client endpoint
pub(crate) struct Connection {
    pub(crate) endpoint: String,
    address: String,
    stream: Mutex<Option<FramedStream>>,
}

impl Connection {
    /// One request/response exchange. The stream is only put back after a
    /// complete exchange, so a failed or cancelled call leaves the slot empty
    /// and the next call on this connection dials again.
    async fn call(
        &self,
        request: &ClientRequest,
        config: &ClientConfig,
    ) -> Result<ClientResponse> {
        let mut guard = self.stream.lock().await;
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => connect(&self.address, config.dial_timeout, config.max_frame_length).await?,
        };

        let response = crate::network::call(&mut stream, &self.address, request, config.request_timeout).await?;
        *guard = Some(stream);
        Ok(response)
    }
}

/// Connections to every client endpoint that answered the initial dial,
/// kept in the order the endpoints were given
#[derive(Clone)]
pub struct ConnectionPool {
    pub(super) connections: Arc<Vec<Connection>>,
    pub(super) config: ClientConfig,
}

impl ConnectionPool {
    /// Dials every endpoint concurrently
    ///
    /// # Errors
    /// `Error::Dial` when not a single endpoint connects
    pub(crate) async fn create(
        endpoints: Vec<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let dials = endpoints.iter().map(|endpoint| Self::dial(endpoint, &config));
        let results = join_all(dials).await;

        let mut connections = Vec::new();
        let mut last_error = None;
        for (endpoint, result) in endpoints.iter().zip(results) {
            match result {
                Ok(connection) => connections.push(connection),
                Err(e) => {
                    warn!(%endpoint, "dial failed: {}", e);
                    last_error = Some(e.to_string());
                }
            }
        }

        if connections.is_empty() {
            return Err(Error::Dial {
                endpoints,
                reason: last_error.unwrap_or_else(|| "no endpoints given".to_string()),
            });
        }

        debug!(connected = connections.len(), total = endpoints.len(), "connection pool ready");
        Ok(Self {
            connections: Arc::new(connections),
            config,
        })
    }

    async fn dial(
        endpoint: &str,
        config: &ClientConfig,
    ) -> Result<Connection> {
        let address = url_to_host_port(endpoint)?;
        let stream = connect(&address, config.dial_timeout, config.max_frame_length).await?;
        Ok(Connection {
            endpoint: endpoint.to_string(),
            address,
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Endpoints that answered the initial dial
    pub fn connected_endpoints(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.endpoint.clone()).collect()
    }

    /// Sends `request` on the first connection whose transport works.
    ///
    /// Only transport failures move on to the next connection. A response,
    /// including an error response, ends the attempt. The whole attempt,
    /// failover included, is bounded by one `request_timeout`.
    pub(crate) async fn send(
        &self,
        request: &ClientRequest,
    ) -> std::result::Result<ClientResponse, String> {
        let deadline = self.config.request_timeout;
        let mut failures = Vec::new();
        let attempt = async {
            for connection in self.connections.iter() {
                match connection.call(request, &self.config).await {
                    Ok(response) => return Ok(response),
                    Err(e) => {
                        debug!(endpoint = %connection.endpoint, "request failed, trying next endpoint: {}", e);
                        failures.push(format!("{}: {}", connection.endpoint, e));
                    }
                }
            }
            Err(())
        };

        let outcome = timeout(deadline, attempt).await;
        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(())) => Err(failures.join("; ")),
            Err(_) => {
                failures.push(format!("no response within {deadline:?}"));
                Err(failures.join("; "))
            }
        }
    }
}
