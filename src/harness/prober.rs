use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::url_to_host_port;
use crate::Error;
use crate::Result;

/// Transport-level liveness check of advertised endpoints
#[derive(Debug, Clone, Copy)]
pub struct EndpointProber {
    timeout: Duration,
}

impl EndpointProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Opens and immediately closes one TCP connection to the `host:port`
    /// of `url`
    ///
    /// # Errors
    /// `Error::Unreachable` if no connection is established within the
    /// probe timeout
    pub async fn probe(
        &self,
        url: &str,
    ) -> Result<()> {
        let unreachable = |reason: String| Error::Unreachable {
            address: url.to_string(),
            reason,
        };

        let address = url_to_host_port(url).map_err(|e| unreachable(e.to_string()))?;
        match timeout(self.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                debug!(%url, "endpoint reachable");
                Ok(())
            }
            Ok(Err(e)) => Err(unreachable(e.to_string())),
            Err(_) => Err(unreachable(format!("no connection within {:?}", self.timeout))),
        }
    }

    /// Probes `urls` in order and stops at the first unreachable one
    pub async fn probe_all(
        &self,
        urls: &[String],
    ) -> Result<()> {
        for url in urls {
            self.probe(url).await?;
        }
        Ok(())
    }
}
