use std::path::Path;

use d_embed::EmbeddedRuntime;
use d_embed::NetworkConfig;
use d_embed::Settings;

/// Settings for an `n` node cluster rooted at `data_root`, with deadlines
/// short enough that failure cases finish quickly
pub fn test_settings(
    n: usize,
    data_root: &Path,
) -> Settings {
    let mut settings = Settings::default();
    settings.cluster.size = n;
    settings.cluster.data_root_dir = Some(data_root.to_path_buf());
    settings.network = NetworkConfig {
        dial_timeout_in_ms: 3_000,
        request_timeout_in_ms: 3_000,
        probe_timeout_in_ms: 1_000,
        peer_connect_timeout_in_ms: 500,
        ..NetworkConfig::default()
    };
    settings
}

pub fn runtime_for(settings: &Settings) -> EmbeddedRuntime {
    EmbeddedRuntime::new(settings.network.clone())
}
