use std::path::PathBuf;

use crate::ClusterMembership;
use crate::Endpoint;
use crate::Error;
use crate::LogOutput;
use crate::ReservedSocket;
use crate::Result;
use crate::SUPPORTED_SCHEME;

/// Everything one store node needs to start.
///
/// Built once per node, validated once, then consumed by
/// [`crate::EmbeddedNode::start`], which takes ownership of both reserved
/// sockets.
#[derive(Debug, Default)]
pub struct NodeConfig {
    /// Unique within the cluster; must appear in `initial_cluster`
    pub name: String,

    /// Data directory; the database lives in `<dir>/member`
    pub dir: PathBuf,

    pub listen_peer_urls: Vec<String>,
    pub advertise_peer_urls: Vec<String>,
    pub listen_client_urls: Vec<String>,
    pub advertise_client_urls: Vec<String>,

    /// Pre-bound socket behind `listen_peer_urls`
    pub peer_socket: Option<ReservedSocket>,

    /// Pre-bound socket behind `listen_client_urls`
    pub client_socket: Option<ReservedSocket>,

    /// Shared membership descriptor, identical on every node
    pub initial_cluster: String,

    /// A member only accepts joins carrying the same token
    pub cluster_token: String,

    /// Sinks this node's logs are meant for. Nodes share the process-wide
    /// tracing subscriber installed by the binary, so this is validated and
    /// reported but does not install a sink of its own.
    pub log_outputs: Vec<LogOutput>,

    /// Trace every handled request
    pub debug: bool,
}

impl NodeConfig {
    /// Validates required fields and their mutual consistency
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['=', ',']) {
            return Err(Error::InvalidConfig(format!(
                "node name {:?} must be non-empty and free of '=' and ','",
                self.name
            )));
        }

        if self.dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(format!("node {} has no data directory", self.name)));
        }

        let listen_peer = parse_url_set("listen peer", &self.listen_peer_urls)?;
        let advertise_peer = parse_url_set("advertise peer", &self.advertise_peer_urls)?;
        let listen_client = parse_url_set("listen client", &self.listen_client_urls)?;
        let advertise_client = parse_url_set("advertise client", &self.advertise_client_urls)?;

        check_same_scheme("peer", &listen_peer, &advertise_peer)?;
        check_same_scheme("client", &listen_client, &advertise_client)?;
        check_supported_scheme(&listen_peer)?;
        check_supported_scheme(&listen_client)?;

        self.check_socket("peer", self.peer_socket.as_ref(), &listen_peer)?;
        self.check_socket("client", self.client_socket.as_ref(), &listen_client)?;

        let membership = ClusterMembership::parse(&self.initial_cluster)?;
        let own = membership.member(&self.name).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "node {} not found in initial cluster {:?}",
                self.name, self.initial_cluster
            ))
        })?;
        if !self.advertise_peer_urls.iter().any(|url| url == &own.peer_url) {
            return Err(Error::InvalidConfig(format!(
                "initial cluster advertises {} for node {} but its advertise peer URLs are {:?}",
                own.peer_url, self.name, self.advertise_peer_urls
            )));
        }

        if self.cluster_token.is_empty() {
            return Err(Error::InvalidConfig("cluster token cannot be empty".into()));
        }

        if self.log_outputs.is_empty() {
            return Err(Error::InvalidConfig(format!("node {} has no log output", self.name)));
        }

        Ok(())
    }

    /// One reserved socket backs exactly one listen URL on the same port
    fn check_socket(
        &self,
        kind: &str,
        socket: Option<&ReservedSocket>,
        listen: &[Endpoint],
    ) -> Result<()> {
        let socket = socket.ok_or_else(|| {
            Error::InvalidConfig(format!("node {} is missing its pre-bound {kind} socket", self.name))
        })?;

        match listen {
            [endpoint] if endpoint.port == socket.port() => Ok(()),
            [endpoint] => Err(Error::InvalidConfig(format!(
                "{kind} listen URL {endpoint} does not match pre-bound port {}",
                socket.port()
            ))),
            _ => Err(Error::InvalidConfig(format!(
                "node {} has one pre-bound {kind} socket but {} listen URLs",
                self.name,
                listen.len()
            ))),
        }
    }
}

fn parse_url_set(
    kind: &str,
    urls: &[String],
) -> Result<Vec<Endpoint>> {
    if urls.is_empty() {
        return Err(Error::InvalidConfig(format!("{kind} URL set cannot be empty")));
    }

    urls.iter().map(|url| Endpoint::parse(url)).collect()
}

fn check_supported_scheme(endpoints: &[Endpoint]) -> Result<()> {
    match endpoints.iter().find(|e| e.scheme != SUPPORTED_SCHEME) {
        Some(endpoint) => Err(Error::InvalidConfig(format!(
            "URL {endpoint} uses unsupported scheme {}, only {SUPPORTED_SCHEME} is served",
            endpoint.scheme
        ))),
        None => Ok(()),
    }
}

fn check_same_scheme(
    kind: &str,
    listen: &[Endpoint],
    advertise: &[Endpoint],
) -> Result<()> {
    let mismatch = listen
        .iter()
        .flat_map(|l| advertise.iter().map(move |a| (l, a)))
        .find(|(l, a)| l.scheme != a.scheme);

    match mismatch {
        Some((l, a)) => Err(Error::InvalidConfig(format!(
            "{kind} listen URL {l} and advertise URL {a} use different schemes"
        ))),
        None => Ok(()),
    }
}
