use std::fmt;

use crate::Error;
use crate::Result;

/// A `scheme://host:port` URL advertised for peer or client traffic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// accept host either like 127.0.0.1, [::1] or a host name like node1
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |why: &str| Error::InvalidConfig(format!("invalid URL {url:?}: {why}"));

        let (scheme, rest) = url.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if scheme != "http" && scheme != "https" {
            return Err(invalid("scheme must be http or https"));
        }

        let authority = rest.strip_suffix('/').unwrap_or(rest);
        if authority.contains('/') {
            return Err(invalid("paths are not allowed"));
        }

        let (host, port) = authority.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }

        Ok(Self::new(scheme, host, port))
    }

    /// Address suitable for `TcpStream::connect`
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Strips a leading `http://` or `https://` and returns `host:port`
pub fn url_to_host_port(url: &str) -> Result<String> {
    Ok(Endpoint::parse(url)?.host_port())
}
