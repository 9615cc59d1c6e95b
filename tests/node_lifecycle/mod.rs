use std::net::SocketAddr;

use d_embed::url_to_host_port;
use d_embed::ClusterHarness;
use d_embed::Error;
use d_embed::PortAllocator;
use tokio::net::TcpListener;

use crate::common::runtime_for;
use crate::common::test_settings;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ports_can_be_rebound_after_close() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));

    let mut cluster = harness.bootstrap().await.unwrap();
    harness.verify(&cluster).await.unwrap();
    let mut urls = cluster.peer_urls();
    urls.extend(cluster.client_urls());
    cluster.close_all().await;

    for url in urls {
        let address: SocketAddr = url_to_host_port(&url).unwrap().parse().unwrap();
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.set_reuseaddr(true).unwrap();
        socket.bind(address).unwrap();
        let listener: TcpListener = socket.listen(16).unwrap();
        drop(listener);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn closing_twice_is_harmless() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(1, data_root.path());
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));

    let mut cluster = harness.bootstrap().await.unwrap();
    for handle in cluster.handles_mut() {
        handle.close().await;
    }
    cluster.close_all().await;
    assert!(cluster.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bind_failure_is_reported() {
    let data_root = tempfile::tempdir().unwrap();
    let mut settings = test_settings(1, data_root.path());
    settings.cluster.host = "192.0.2.1".into();
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));

    assert!(matches!(harness.bootstrap().await, Err(Error::Bind { .. })));
    assert!(matches!(PortAllocator::new("192.0.2.1").allocate(), Err(Error::Bind { .. })));
}
