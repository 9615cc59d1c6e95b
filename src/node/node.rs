//! A single store node running inside the current process.
//!
//! ## Lifecycle
//! 1. [`EmbeddedNode::start`] opens the data directory, turns both reserved
//!    sockets into listeners and announces itself to every member that is
//!    already serving.
//! 2. The node answers peer and client traffic on background tasks.
//! 3. [`EmbeddedNode::close`] cancels those tasks, waits for them to drain
//!    and flushes the store. The reserved ports are free again afterwards.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;

use super::accept_loop;
use super::Listener;
use super::NodeConfig;
use super::NodeState;
use crate::constants::MEMBER_DIR;
use crate::ensure_writable_dir;
use crate::proto::PeerRequest;
use crate::proto::PeerResponse;
use crate::ClusterMembership;
use crate::Error;
use crate::KvStore;
use crate::LogOutput;
use crate::NetworkConfig;
use crate::PeerChannels;
use crate::Result;
use crate::StartupError;

pub struct EmbeddedNode {
    name: String,
    peer_urls: Vec<String>,
    client_urls: Vec<String>,
    log_outputs: Vec<LogOutput>,

    state: Option<Arc<NodeState>>,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl std::fmt::Debug for EmbeddedNode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("EmbeddedNode")
            .field("name", &self.name)
            .field("peer_urls", &self.peer_urls)
            .field("client_urls", &self.client_urls)
            .field("running", &self.state.is_some())
            .finish()
    }
}

impl EmbeddedNode {
    /// Starts a node from a validated configuration.
    ///
    /// Returns once both listeners accept connections and every reachable
    /// member has accepted this node's view of the cluster. Members that do
    /// not serve yet are skipped; they check this node when they start.
    ///
    /// # Errors
    /// `Error::Startup` for any failure. Nothing keeps running on error.
    pub async fn start(
        mut config: NodeConfig,
        network: &NetworkConfig,
    ) -> Result<Self> {
        let name = config.name.clone();
        let span = info_span!("node", name = %name);

        let membership = ClusterMembership::parse(&config.initial_cluster)
            .map_err(|e| StartupError::Membership(e.to_string()))?;

        let peer_socket = config.peer_socket.take().ok_or_else(|| StartupError::MissingSocket {
            name: name.clone(),
            kind: "peer",
        })?;
        let client_socket = config.client_socket.take().ok_or_else(|| StartupError::MissingSocket {
            name: name.clone(),
            kind: "client",
        })?;

        let store = open_store(&config.dir)?;
        let peers = PeerChannels::new(&name, &membership, network)
            .map_err(|e| StartupError::Membership(e.to_string()))?;
        let state = Arc::new(
            NodeState::new(
                name.clone(),
                config.cluster_token.clone(),
                membership,
                store,
                peers,
                network.clone(),
                config.debug,
            )
            .map_err(|e| StartupError::Storage {
                path: config.dir.clone(),
                reason: e.to_string(),
            })?,
        );

        let peer_address = peer_socket.local_addr().to_string();
        let peer_listener = peer_socket
            .into_listener(network.listen_backlog)
            .map_err(|source| StartupError::Listen {
                address: peer_address,
                source,
            })?;
        let client_address = client_socket.local_addr().to_string();
        let client_listener = client_socket
            .into_listener(network.listen_backlog)
            .map_err(|source| StartupError::Listen {
                address: client_address,
                source,
            })?;

        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        tracker.spawn(
            accept_loop(
                Listener::Peer,
                peer_listener,
                state.clone(),
                token.clone(),
                tracker.clone(),
            )
            .instrument(span.clone()),
        );
        tracker.spawn(
            accept_loop(
                Listener::Client,
                client_listener,
                state.clone(),
                token.clone(),
                tracker.clone(),
            )
            .instrument(span.clone()),
        );

        let mut node = Self {
            name,
            peer_urls: config.advertise_peer_urls,
            client_urls: config.advertise_client_urls,
            log_outputs: config.log_outputs,
            state: Some(state.clone()),
            token,
            tracker,
        };

        if let Err(e) = join_cluster(&state).instrument(span.clone()).await {
            node.close().await;
            return Err(e);
        }

        state.set_ready(true);
        span.in_scope(|| {
            info!(
                peer_urls = ?node.peer_urls,
                client_urls = ?node.client_urls,
                log_outputs = ?node.log_outputs,
                "node started"
            )
        });
        Ok(node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peer_urls(&self) -> &[String] {
        &self.peer_urls
    }

    pub fn client_urls(&self) -> &[String] {
        &self.client_urls
    }

    /// The configured log sinks. Output goes through the process-wide
    /// subscriber; records carry this node's name in the `node` span.
    pub fn log_outputs(&self) -> &[LogOutput] {
        &self.log_outputs
    }

    pub fn is_ready(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_ready())
    }

    /// Stops serving, waits for every connection task and flushes the
    /// store. Calling it again is a no-op.
    pub async fn close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };

        state.set_ready(false);
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        state.peers.clear();
        if let Err(e) = state.store.flush().await {
            warn!(node = %self.name, "flush on close failed: {}", e);
        }
        info!(node = %self.name, "node closed");
    }
}

fn open_store(dir: &Path) -> Result<KvStore> {
    let storage_error = |e: Error| StartupError::Storage {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    ensure_writable_dir(dir).map_err(storage_error)?;
    Ok(KvStore::open(dir.join(MEMBER_DIR)).map_err(storage_error)?)
}

/// Announces this node to every other member.
///
/// Members are started in descriptor order, so every member listed ahead of
/// this node must be serving and must accept the join. Members listed after
/// it may not be up yet and are skipped when unreachable; they check this
/// node when they start.
async fn join_cluster(state: &NodeState) -> Result<()> {
    let own_position = state.membership.position(&state.name).ok_or_else(|| {
        StartupError::Membership(format!("{} is not listed in {}", state.name, state.membership.descriptor()))
    })?;
    let request = PeerRequest::Join {
        name: state.name.clone(),
        cluster_token: state.cluster_token.clone(),
        initial_cluster: state.membership.descriptor().to_string(),
    };

    for (position, peer) in state.membership.members().iter().enumerate() {
        if position == own_position {
            continue;
        }

        match state.peers.call(&peer.name, &request, state.network.request_timeout()).await {
            Ok(PeerResponse::JoinAccepted { .. }) => {
                debug!(peer = %peer.name, "join accepted");
            }
            Ok(PeerResponse::JoinRejected { reason, .. }) => {
                return Err(StartupError::JoinRejected {
                    name: state.name.clone(),
                    peer: peer.name.clone(),
                    reason,
                }
                .into());
            }
            Ok(other) => {
                return Err(StartupError::JoinRejected {
                    name: state.name.clone(),
                    peer: peer.name.clone(),
                    reason: format!("unexpected response {other:?}"),
                }
                .into());
            }
            Err(e) if position < own_position => {
                warn!(peer = %peer.name, url = %peer.peer_url, "earlier member unreachable: {}", e);
                return Err(StartupError::PeerUnreachable {
                    name: state.name.clone(),
                    peer: peer.name.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
            Err(e) => {
                debug!(peer = %peer.name, "peer not serving yet: {}", e);
            }
        }
    }

    Ok(())
}
