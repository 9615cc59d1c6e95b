use std::time::Duration;

use d_embed::Client;
use d_embed::ClusterHarness;
use d_embed::EndpointProber;
use d_embed::NodeLauncher;
use d_embed::StoreRuntime;
use tokio::sync::watch;
use tracing_test::traced_test;

use crate::common::runtime_for;
use crate::common::test_settings;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[traced_test]
async fn three_nodes_read_their_own_write() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));

    let mut cluster = harness.bootstrap().await.unwrap();
    assert_eq!(cluster.node_names(), vec!["server0", "server1", "server2"]);

    let client = Client::builder(cluster.client_urls())
        .dial_timeout(Duration::from_secs(10))
        .build()
        .await
        .unwrap();
    client.kv().put("foo", "bar").await.unwrap();
    assert_eq!(client.kv().get("foo").await.unwrap(), Some(b"bar".to_vec()));

    assert!(harness.verify(&cluster).await.is_ok());
    cluster.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_node_cluster_verifies() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(1, data_root.path());
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));

    let mut cluster = harness.bootstrap().await.unwrap();
    assert!(harness.verify(&cluster).await.is_ok());
    cluster.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn endpoints_are_unreachable_before_start_and_reachable_after() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let runtime = runtime_for(&settings);
    let prober = EndpointProber::new(Duration::from_millis(500));

    let mut launcher = NodeLauncher::allocate(&settings, data_root.path()).unwrap();
    let mut urls = launcher.peer_urls();
    urls.extend(launcher.client_urls());
    assert_eq!(urls.len(), 6);

    // Reserved but not yet serving
    for url in &urls {
        assert!(prober.probe(url).await.is_err(), "{url} should refuse connections");
    }

    let mut handles = Vec::new();
    for i in 0..launcher.len() {
        let config = launcher.prepare(i).unwrap();
        runtime.validate(&config).unwrap();
        handles.push(runtime.start(config).await.unwrap());
    }

    assert!(prober.probe_all(&urls).await.is_ok());

    for handle in handles.iter_mut() {
        handle.close().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_returns_after_shutdown_signal() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let harness = ClusterHarness::new(settings.clone(), runtime_for(&settings));
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let run = tokio::spawn(async move { harness.run(shutdown_rx).await });
    // Give bootstrap and verification time to finish before signalling
    tokio::time::sleep(Duration::from_secs(2)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(30), run).await.unwrap().unwrap();
    assert!(result.is_ok());
}
