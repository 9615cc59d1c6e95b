use d_embed::EmbeddedNode;
use d_embed::Error;
use d_embed::NodeLauncher;
use d_embed::StartupError;

use crate::common::test_settings;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn node_with_corrupted_descriptor_fails_to_start() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let mut launcher = NodeLauncher::allocate(&settings, data_root.path()).unwrap();

    let first = launcher.prepare(0).unwrap();
    let mut second = launcher.prepare(1).unwrap();
    // Same own entry, extra member: still a valid config on its own
    second.initial_cluster = format!("{},intruder=http://127.0.0.1:1", second.initial_cluster);
    assert!(second.validate().is_ok());

    let mut node0 = EmbeddedNode::start(first, &settings.network).await.unwrap();
    let result = EmbeddedNode::start(second, &settings.network).await;

    assert!(matches!(
        result,
        Err(Error::Startup(StartupError::JoinRejected { .. }))
    ));
    node0.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reordered_descriptor_is_rejected_too() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(2, data_root.path());
    let mut launcher = NodeLauncher::allocate(&settings, data_root.path()).unwrap();

    let first = launcher.prepare(0).unwrap();
    let mut second = launcher.prepare(1).unwrap();
    let mut entries: Vec<&str> = second.initial_cluster.split(',').collect();
    entries.reverse();
    second.initial_cluster = entries.join(",");

    let mut node0 = EmbeddedNode::start(first, &settings.network).await.unwrap();
    let result = EmbeddedNode::start(second, &settings.network).await;

    assert!(result.is_err_and(|e| e.is_startup()));
    node0.close().await;
}
