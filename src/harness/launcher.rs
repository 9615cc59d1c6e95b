use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use super::NodeSockets;
use super::PortAllocator;
use crate::build_descriptor;
use crate::Endpoint;
use crate::Error;
use crate::LogOutput;
use crate::NodeConfig;
use crate::Result;
use crate::Settings;

/// A node whose identity and sockets are allocated but whose
/// configuration has not been handed out yet
#[derive(Debug)]
struct PlannedNode {
    name: String,
    dir: PathBuf,
    peer_url: String,
    client_url: String,
    sockets: Option<NodeSockets>,
}

/// Allocates every node's identity and sockets up front, then hands out
/// one [`NodeConfig`] per node in the same order.
///
/// Entry `i` of the membership descriptor is always built from the name and
/// peer socket allocated for node `i`, so positions can never drift apart.
#[derive(Debug)]
pub struct NodeLauncher {
    nodes: Vec<PlannedNode>,
    descriptor: String,
    cluster_token: String,
    scheme: String,
    log_outputs: Vec<LogOutput>,
    debug: bool,
}

impl NodeLauncher {
    /// Reserves `2 * settings.cluster.size` sockets and builds the shared
    /// descriptor. Node data directories live under `data_root`.
    ///
    /// # Errors
    /// `Error::Bind` from the first failing allocation
    pub fn allocate(
        settings: &Settings,
        data_root: &Path,
    ) -> Result<Self> {
        let cluster = &settings.cluster;
        let allocator = PortAllocator::new(cluster.host.clone());

        let mut nodes = Vec::with_capacity(cluster.size);
        for i in 0..cluster.size {
            let name = cluster.node_name(i);
            let sockets = allocator.allocate_node()?;
            let peer_url = Endpoint::new(&cluster.scheme, &cluster.host, sockets.peer.port()).to_string();
            let client_url = Endpoint::new(&cluster.scheme, &cluster.host, sockets.client.port()).to_string();
            debug!(%name, %peer_url, %client_url, "allocated node endpoints");

            nodes.push(PlannedNode {
                dir: data_root.join(&name),
                name,
                peer_url,
                client_url,
                sockets: Some(sockets),
            });
        }

        let descriptor = build_descriptor(
            &nodes
                .iter()
                .map(|n| (n.name.as_str(), n.peer_url.as_str()))
                .collect::<Vec<_>>(),
        );

        Ok(Self {
            nodes,
            descriptor,
            cluster_token: cluster.cluster_token.clone(),
            scheme: cluster.scheme.clone(),
            log_outputs: settings.logging.log_outputs()?,
            debug: settings.logging.debug,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The membership descriptor shared verbatim by every node
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Peer URLs in allocation order
    pub fn peer_urls(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.peer_url.clone()).collect()
    }

    /// Client URLs in allocation order
    pub fn client_urls(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.client_url.clone()).collect()
    }

    /// Assembles the configuration of node `index`, moving its reserved
    /// sockets into it. No I/O happens here.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `index` is out of range or the node was
    /// already prepared
    pub fn prepare(
        &mut self,
        index: usize,
    ) -> Result<NodeConfig> {
        let node = self
            .nodes
            .get_mut(index)
            .ok_or_else(|| Error::InvalidConfig(format!("no node at position {index}")))?;
        let sockets = node
            .sockets
            .take()
            .ok_or_else(|| Error::InvalidConfig(format!("node {} was already prepared", node.name)))?;

        Ok(NodeConfig {
            name: node.name.clone(),
            dir: node.dir.clone(),
            listen_peer_urls: vec![node.peer_url.clone()],
            advertise_peer_urls: vec![node.peer_url.clone()],
            listen_client_urls: vec![node.client_url.clone()],
            advertise_client_urls: vec![node.client_url.clone()],
            peer_socket: Some(sockets.peer),
            client_socket: Some(sockets.client),
            initial_cluster: self.descriptor.clone(),
            cluster_token: self.cluster_token.clone(),
            log_outputs: self.log_outputs.clone(),
            debug: self.debug,
        })
    }
}
