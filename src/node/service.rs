//! Request handling for one store node.
//!
//! The first member of the membership descriptor is the primary: it orders
//! every write, replicates it to all other members and commits once a
//! majority (itself included) has acknowledged. Reads are served by the
//! primary too, so a read issued after an acknowledged write observes it.
//! Non-primaries forward both kinds of client request over their peer
//! channel to the primary.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::proto::ClientRequest;
use crate::proto::ClientResponse;
use crate::proto::ErrorCode;
use crate::proto::PeerRequest;
use crate::proto::PeerResponse;
use crate::is_majority;
use crate::ClusterMembership;
use crate::KvStore;
use crate::NetworkConfig;
use crate::PeerChannels;

/// A failure reported back over the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServiceError {
    pub(crate) code: ErrorCode,
    pub(crate) message: String,
}

impl ServiceError {
    fn new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn storage(e: crate::Error) -> Self {
        Self::new(ErrorCode::StorageFailure, e.to_string())
    }
}

type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// State shared by a node's listeners and connection tasks
pub(crate) struct NodeState {
    pub(crate) name: String,
    pub(crate) cluster_token: String,
    pub(crate) membership: ClusterMembership,
    pub(crate) store: KvStore,
    pub(crate) peers: PeerChannels,
    pub(crate) network: NetworkConfig,
    pub(crate) debug: bool,

    next_revision: AtomicU64,
    write_lock: Mutex<()>,
    ready: AtomicBool,
}

impl NodeState {
    pub(crate) fn new(
        name: String,
        cluster_token: String,
        membership: ClusterMembership,
        store: KvStore,
        peers: PeerChannels,
        network: NetworkConfig,
        debug: bool,
    ) -> crate::Result<Self> {
        let next_revision = store.last_revision()? + 1;
        Ok(Self {
            name,
            cluster_token,
            membership,
            store,
            peers,
            network,
            debug,
            next_revision: AtomicU64::new(next_revision),
            write_lock: Mutex::new(()),
            ready: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_ready(
        &self,
        is_ready: bool,
    ) {
        self.ready.store(is_ready, Ordering::SeqCst);
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn is_primary(&self) -> bool {
        self.membership.is_primary(&self.name)
    }

    fn trace_request(
        &self,
        request: &dyn std::fmt::Debug,
    ) {
        if self.debug {
            debug!(node = %self.name, ?request, "handle request");
        } else {
            trace!(node = %self.name, ?request, "handle request");
        }
    }

    //-------------------------------------------------------------------
    // Peer traffic

    pub(crate) async fn handle_peer_request(
        &self,
        request: PeerRequest,
    ) -> PeerResponse {
        self.trace_request(&request);

        match request {
            PeerRequest::Join {
                name,
                cluster_token,
                initial_cluster,
            } => self.handle_join(name, cluster_token, initial_cluster),
            PeerRequest::Propose { key, value } => {
                if !self.is_primary() {
                    return PeerResponse::failed(
                        ErrorCode::InvalidRequest,
                        format!("{} is not the primary", self.name),
                    );
                }
                match self.commit_write(key, value).await {
                    Ok(revision) => PeerResponse::Proposed { revision },
                    Err(e) => PeerResponse::failed(e.code, e.message),
                }
            }
            PeerRequest::Read { key } => match self.store.get(&key) {
                Ok(value) => PeerResponse::Value { value },
                Err(e) => PeerResponse::failed(ErrorCode::StorageFailure, e.to_string()),
            },
            PeerRequest::Replicate { revision, key, value } => {
                match self.store.apply(revision, &key, &value).await {
                    Ok(_) => PeerResponse::Replicated { revision },
                    Err(e) => PeerResponse::failed(ErrorCode::StorageFailure, e.to_string()),
                }
            }
        }
    }

    /// Accepts a joining member only if it was given the exact same
    /// descriptor and token as this one
    fn handle_join(
        &self,
        name: String,
        cluster_token: String,
        initial_cluster: String,
    ) -> PeerResponse {
        let reason = if cluster_token != self.cluster_token {
            Some(format!(
                "cluster token {cluster_token:?} differs from {:?}",
                self.cluster_token
            ))
        } else if initial_cluster != self.membership.descriptor() {
            Some(format!(
                "initial cluster {initial_cluster:?} differs from {:?}",
                self.membership.descriptor()
            ))
        } else if self.membership.member(&name).is_none() {
            Some(format!("{name} is not a member"))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(node = %self.name, joining = %name, %reason, "reject join");
                PeerResponse::JoinRejected {
                    name: self.name.clone(),
                    reason,
                }
            }
            None => {
                debug!(node = %self.name, joining = %name, "accept join");
                PeerResponse::JoinAccepted {
                    name: self.name.clone(),
                }
            }
        }
    }

    /// Orders, replicates and commits one write. Primary only.
    async fn commit_write(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> ServiceResult<u64> {
        let _guard = self.write_lock.lock().await;
        let revision = self.next_revision.fetch_add(1, Ordering::SeqCst);

        let request = PeerRequest::Replicate {
            revision,
            key: key.clone(),
            value: value.clone(),
        };
        let deadline = self.network.request_timeout();
        let peers = &self.peers;
        let request = &request;
        let calls = peers.peer_names().into_iter().map(|peer| async move {
            let result = peers.call(&peer, request, deadline).await;
            (peer, result)
        });

        let mut acks = 1;
        for (peer, result) in join_all(calls).await {
            match result {
                Ok(PeerResponse::Replicated { .. }) => acks += 1,
                Ok(other) => warn!(node = %self.name, %peer, ?other, "replication refused"),
                Err(e) => warn!(node = %self.name, %peer, "replication failed: {}", e),
            }
        }

        if !is_majority(acks, self.membership.len()) {
            return Err(ServiceError::new(
                ErrorCode::QuorumNotReached,
                format!(
                    "revision {revision} acknowledged by {acks} of {} members, {} required",
                    self.membership.len(),
                    self.membership.quorum()
                ),
            ));
        }

        self.store
            .apply(revision, &key, &value)
            .await
            .map_err(ServiceError::storage)?;
        debug!(node = %self.name, revision, acks, "write committed");
        Ok(revision)
    }

    //-------------------------------------------------------------------
    // Client traffic

    pub(crate) async fn handle_client_request(
        &self,
        request: ClientRequest,
    ) -> ClientResponse {
        self.trace_request(&request);

        let result = match request {
            ClientRequest::Put { key, value } => self
                .put(key, value)
                .await
                .map(|revision| ClientResponse::PutAck { revision }),
            ClientRequest::Get { key } => self.get(key).await.map(|value| ClientResponse::GetResult { value }),
        };

        result.unwrap_or_else(|e| ClientResponse::failed(e.code, e.message))
    }

    async fn put(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> ServiceResult<u64> {
        if self.is_primary() {
            return self.commit_write(key, value).await;
        }

        match self.forward(PeerRequest::Propose { key, value }).await? {
            PeerResponse::Proposed { revision } => Ok(revision),
            PeerResponse::Failed { code, message } => Err(ServiceError::new(code, message)),
            other => Err(ServiceError::new(
                ErrorCode::PrimaryUnavailable,
                format!("unexpected primary response {other:?}"),
            )),
        }
    }

    async fn get(
        &self,
        key: Vec<u8>,
    ) -> ServiceResult<Option<Vec<u8>>> {
        if self.is_primary() {
            return self.store.get(&key).map_err(ServiceError::storage);
        }

        match self.forward(PeerRequest::Read { key }).await? {
            PeerResponse::Value { value } => Ok(value),
            PeerResponse::Failed { code, message } => Err(ServiceError::new(code, message)),
            other => Err(ServiceError::new(
                ErrorCode::PrimaryUnavailable,
                format!("unexpected primary response {other:?}"),
            )),
        }
    }

    async fn forward(
        &self,
        request: PeerRequest,
    ) -> ServiceResult<PeerResponse> {
        let primary = &self.membership.primary().name;
        self.peers
            .call(primary, &request, self.network.request_timeout())
            .await
            .map_err(|e| ServiceError::new(ErrorCode::PrimaryUnavailable, format!("primary {primary}: {e}")))
    }
}
