use std::net::SocketAddr;
use std::path::Path;

use crate::build_descriptor;
use crate::LogOutput;
use crate::NetworkConfig;
use crate::NodeConfig;
use crate::ReservedSocket;

pub(crate) const TEST_CLUSTER_TOKEN: &str = "test-cluster";

/// Binds an ephemeral loopback port and returns it with its URL
pub(crate) fn reserve_local() -> (ReservedSocket, String) {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let socket = ReservedSocket::bind(addr).unwrap();
    let url = format!("http://127.0.0.1:{}", socket.port());
    (socket, url)
}

/// Short timeouts so unreachable members fail fast in tests
pub(crate) fn test_network_config() -> NetworkConfig {
    NetworkConfig {
        dial_timeout_in_ms: 2_000,
        request_timeout_in_ms: 2_000,
        probe_timeout_in_ms: 500,
        peer_connect_timeout_in_ms: 300,
        ..NetworkConfig::default()
    }
}

/// Complete, valid configurations for an `n` member cluster whose data
/// directories live under `root`
pub(crate) fn cluster_node_configs(
    n: usize,
    root: &Path,
) -> Vec<NodeConfig> {
    let mut reserved = Vec::with_capacity(n);
    for i in 0..n {
        let (peer_socket, peer_url) = reserve_local();
        let (client_socket, client_url) = reserve_local();
        reserved.push((format!("node{i}"), peer_socket, peer_url, client_socket, client_url));
    }

    let descriptor = build_descriptor(
        &reserved
            .iter()
            .map(|(name, _, peer_url, _, _)| (name.clone(), peer_url.clone()))
            .collect::<Vec<_>>(),
    );

    reserved
        .into_iter()
        .map(|(name, peer_socket, peer_url, client_socket, client_url)| NodeConfig {
            dir: root.join(format!("{name}.data")),
            name,
            listen_peer_urls: vec![peer_url.clone()],
            advertise_peer_urls: vec![peer_url],
            listen_client_urls: vec![client_url.clone()],
            advertise_client_urls: vec![client_url],
            peer_socket: Some(peer_socket),
            client_socket: Some(client_socket),
            initial_cluster: descriptor.clone(),
            cluster_token: TEST_CLUSTER_TOKEN.to_string(),
            log_outputs: vec![LogOutput::Default],
            debug: false,
        })
        .collect()
}
