use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::call;
use super::connect;
use super::FramedStream;
use crate::proto::PeerRequest;
use crate::proto::PeerResponse;
use crate::ClusterMembership;
use crate::NetworkConfig;
use crate::NetworkError;
use crate::Result;

type ChannelSlot = Arc<Mutex<Option<FramedStream>>>;

/// Lazily connected outbound channels from one member to every other one.
///
/// A channel is (re)established on first use and dropped after any failed
/// exchange, so the next call dials again. Calls to the same peer are
/// serialized; calls to different peers run concurrently.
pub struct PeerChannels {
    node_name: String,
    addresses: HashMap<String, String>,
    channels: DashMap<String, ChannelSlot>,
    connect_timeout: Duration,
    max_frame_length: usize,
}

impl PeerChannels {
    pub fn new(
        node_name: &str,
        membership: &ClusterMembership,
        network: &NetworkConfig,
    ) -> Result<Self> {
        let mut addresses = HashMap::new();
        for peer in membership.peers_of(node_name) {
            addresses.insert(peer.name.clone(), peer.peer_address()?);
        }

        Ok(Self {
            node_name: node_name.to_string(),
            addresses,
            channels: DashMap::new(),
            connect_timeout: network.peer_connect_timeout(),
            max_frame_length: network.max_frame_length,
        })
    }

    /// Names of every peer this member can talk to
    pub fn peer_names(&self) -> Vec<String> {
        self.addresses.keys().cloned().collect()
    }

    pub async fn call(
        &self,
        peer: &str,
        request: &PeerRequest,
        deadline: Duration,
    ) -> Result<PeerResponse> {
        let address = self
            .addresses
            .get(peer)
            .ok_or_else(|| NetworkError::NoPeerFound(peer.to_string()))?;

        // Clone the slot out so the map shard is not locked across awaits
        let slot = self
            .channels
            .entry(peer.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut guard = slot.lock().await;
        if guard.is_none() {
            debug!(node = %self.node_name, %peer, %address, "connecting peer channel");
            *guard = Some(connect(address, self.connect_timeout, self.max_frame_length).await?);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(NetworkError::ConnectionClosed(address.clone()).into());
        };

        let result = call(stream, address, request, deadline).await;
        if result.is_err() {
            *guard = None;
        }
        result
    }

    /// Drops every open channel
    pub fn clear(&self) {
        self.channels.clear();
    }
}
