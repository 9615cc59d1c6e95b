use std::time::Duration;

use tokio::net::TcpStream;
use tracing_test::traced_test;

use crate::network::connect;
use crate::network::url_to_host_port;
use crate::network::call;
use crate::proto::ClientRequest;
use crate::proto::ClientResponse;
use crate::proto::ErrorCode;
use crate::test_utils::cluster_node_configs;
use crate::test_utils::test_network_config;
use crate::EmbeddedNode;
use crate::Error;
use crate::StartupError;

const DEADLINE: Duration = Duration::from_secs(2);

async fn client_call(
    url: &str,
    request: ClientRequest,
) -> ClientResponse {
    let address = url_to_host_port(url).unwrap();
    let mut stream = connect(&address, DEADLINE, 1024 * 1024).await.unwrap();
    call(&mut stream, &address, &request, DEADLINE).await.unwrap()
}

async fn start_all(configs: Vec<crate::NodeConfig>) -> Vec<EmbeddedNode> {
    let network = test_network_config();
    let mut nodes = Vec::new();
    for config in configs {
        nodes.push(EmbeddedNode::start(config, &network).await.unwrap());
    }
    nodes
}

#[tokio::test]
#[traced_test]
async fn start_serves_both_endpoints_until_close() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut nodes = start_all(cluster_node_configs(1, temp_dir.path())).await;
    let node = &mut nodes[0];
    assert!(node.is_ready());
    assert_eq!(node.log_outputs(), &[crate::LogOutput::Default]);
    assert!(logs_contain("log_outputs"));

    let peer = url_to_host_port(&node.peer_urls()[0]).unwrap();
    let client = url_to_host_port(&node.client_urls()[0]).unwrap();
    assert!(TcpStream::connect(&peer).await.is_ok());
    assert!(TcpStream::connect(&client).await.is_ok());

    node.close().await;
    assert!(!node.is_ready());
    assert!(TcpStream::connect(&peer).await.is_err());
    assert!(TcpStream::connect(&client).await.is_err());

    // Second close is a no-op
    node.close().await;
}

#[tokio::test]
async fn reserved_sockets_refuse_connections_before_start() {
    let temp_dir = tempfile::tempdir().unwrap();
    let configs = cluster_node_configs(1, temp_dir.path());
    let client = url_to_host_port(&configs[0].listen_client_urls[0]).unwrap();

    assert!(TcpStream::connect(&client).await.is_err());
    drop(configs);
}

#[tokio::test]
async fn single_member_cluster_reads_its_own_write() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut nodes = start_all(cluster_node_configs(1, temp_dir.path())).await;
    let url = nodes[0].client_urls()[0].clone();

    let put = client_call(
        &url,
        ClientRequest::Put {
            key: b"foo".to_vec(),
            value: b"bar".to_vec(),
        },
    )
    .await;
    assert_eq!(put, ClientResponse::PutAck { revision: 1 });

    let get = client_call(&url, ClientRequest::Get { key: b"foo".to_vec() }).await;
    assert_eq!(
        get,
        ClientResponse::GetResult {
            value: Some(b"bar".to_vec())
        }
    );

    nodes[0].close().await;
}

#[tokio::test]
#[traced_test]
async fn write_through_follower_is_visible_on_every_member() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut nodes = start_all(cluster_node_configs(3, temp_dir.path())).await;

    let follower_url = nodes[2].client_urls()[0].clone();
    let put = client_call(
        &follower_url,
        ClientRequest::Put {
            key: b"foo".to_vec(),
            value: b"bar".to_vec(),
        },
    )
    .await;
    assert!(matches!(put, ClientResponse::PutAck { .. }));

    for node in &nodes {
        let get = client_call(&node.client_urls()[0], ClientRequest::Get { key: b"foo".to_vec() }).await;
        assert_eq!(
            get,
            ClientResponse::GetResult {
                value: Some(b"bar".to_vec())
            }
        );
    }

    for node in nodes.iter_mut() {
        node.close().await;
    }
}

#[tokio::test]
async fn write_without_quorum_is_refused() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut configs = cluster_node_configs(3, temp_dir.path());
    let primary = configs.remove(0);
    let mut nodes = start_all(vec![primary]).await;

    let put = client_call(
        &nodes[0].client_urls()[0],
        ClientRequest::Put {
            key: b"foo".to_vec(),
            value: b"bar".to_vec(),
        },
    )
    .await;
    assert!(matches!(
        put,
        ClientResponse::Failed {
            code: ErrorCode::QuorumNotReached,
            ..
        }
    ));

    let get = client_call(&nodes[0].client_urls()[0], ClientRequest::Get { key: b"foo".to_vec() }).await;
    assert_eq!(get, ClientResponse::GetResult { value: None });

    nodes[0].close().await;
}

#[tokio::test]
#[traced_test]
async fn start_fails_when_running_member_holds_a_different_descriptor() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut configs = cluster_node_configs(2, temp_dir.path());
    let mut second = configs.remove(1);
    second.initial_cluster = format!("{},bogus=http://127.0.0.1:1", second.initial_cluster);
    assert!(second.validate().is_ok());

    let mut nodes = start_all(configs).await;
    let result = EmbeddedNode::start(second, &test_network_config()).await;
    assert!(matches!(
        result,
        Err(Error::Startup(StartupError::JoinRejected { .. }))
    ));
    assert!(logs_contain("reject join"));

    nodes[0].close().await;
}

#[tokio::test]
async fn start_fails_when_token_differs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut configs = cluster_node_configs(2, temp_dir.path());
    let mut second = configs.remove(1);
    second.cluster_token = "another-cluster".into();

    let mut nodes = start_all(configs).await;
    let result = EmbeddedNode::start(second, &test_network_config()).await;
    assert!(result.as_ref().is_err_and(|e| e.is_startup()));

    nodes[0].close().await;
}

#[tokio::test]
#[traced_test]
async fn start_fails_when_earlier_member_is_unreachable() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut configs = cluster_node_configs(2, temp_dir.path());
    let mut second = configs.remove(1);
    let first_entry = second.initial_cluster.split(',').next().unwrap().to_string();
    let (name, _) = first_entry.split_once('=').unwrap();
    second.initial_cluster = second
        .initial_cluster
        .replacen(&first_entry, &format!("{name}=http://127.0.0.1:1"), 1);
    assert!(second.validate().is_ok());

    let mut nodes = start_all(configs).await;
    let result = EmbeddedNode::start(second, &test_network_config()).await;
    assert!(matches!(
        result,
        Err(Error::Startup(StartupError::PeerUnreachable { ref peer, .. })) if peer == name
    ));
    assert!(logs_contain("earlier member unreachable"));

    nodes[0].close().await;
}

#[tokio::test]
async fn first_member_starts_while_later_members_are_down() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut configs = cluster_node_configs(3, temp_dir.path());
    let first = configs.remove(0);

    let mut node = EmbeddedNode::start(first, &test_network_config()).await.unwrap();
    assert!(node.is_ready());
    node.close().await;
}

#[tokio::test]
async fn start_without_socket_is_a_startup_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = cluster_node_configs(1, temp_dir.path()).remove(0);
    config.peer_socket = None;

    let result = EmbeddedNode::start(config, &test_network_config()).await;
    assert!(matches!(
        result,
        Err(Error::Startup(StartupError::MissingSocket { kind: "peer", .. }))
    ));
}

#[tokio::test]
async fn start_on_unusable_dir_is_a_storage_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = cluster_node_configs(1, temp_dir.path()).remove(0);
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    config.dir = blocker;

    let result = EmbeddedNode::start(config, &test_network_config()).await;
    assert!(matches!(result, Err(Error::Startup(StartupError::Storage { .. }))));
}

#[tokio::test]
async fn ports_can_be_bound_again_after_close() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut nodes = start_all(cluster_node_configs(1, temp_dir.path())).await;
    let url = nodes[0].client_urls()[0].clone();
    let _ = client_call(&url, ClientRequest::Get { key: b"foo".to_vec() }).await;
    nodes[0].close().await;

    let address: std::net::SocketAddr = url_to_host_port(&url).unwrap().parse().unwrap();
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.set_reuseaddr(true).unwrap();
    assert!(socket.bind(address).is_ok());
}
