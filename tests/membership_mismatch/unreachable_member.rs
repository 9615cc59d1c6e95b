use d_embed::EmbeddedNode;
use d_embed::Error;
use d_embed::NodeLauncher;
use d_embed::StartupError;

use crate::common::test_settings;

/// Points the first descriptor entry at an address nothing listens on
fn with_dead_first_member(descriptor: &str) -> String {
    let mut entries: Vec<String> = descriptor.split(',').map(str::to_string).collect();
    let (name, _) = entries[0].split_once('=').unwrap();
    entries[0] = format!("{name}=http://127.0.0.1:1");
    entries.join(",")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn earlier_member_at_dead_address_fails_start() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(2, data_root.path());
    let mut launcher = NodeLauncher::allocate(&settings, data_root.path()).unwrap();

    let first = launcher.prepare(0).unwrap();
    let mut second = launcher.prepare(1).unwrap();
    second.initial_cluster = with_dead_first_member(&second.initial_cluster);
    assert!(second.validate().is_ok());

    let mut node0 = EmbeddedNode::start(first, &settings.network).await.unwrap();
    let result = EmbeddedNode::start(second, &settings.network).await;

    assert!(matches!(
        result,
        Err(Error::Startup(StartupError::PeerUnreachable { .. }))
    ));
    node0.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn members_listed_later_are_skipped_until_they_start() {
    let data_root = tempfile::tempdir().unwrap();
    let settings = test_settings(3, data_root.path());
    let mut launcher = NodeLauncher::allocate(&settings, data_root.path()).unwrap();

    let mut nodes = Vec::new();
    for i in 0..launcher.len() {
        let config = launcher.prepare(i).unwrap();
        nodes.push(EmbeddedNode::start(config, &settings.network).await.unwrap());
    }
    assert!(nodes.iter().all(|n| n.is_ready()));

    for node in nodes.iter_mut() {
        node.close().await;
    }
}
