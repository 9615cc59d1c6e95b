//! Bootstraps an in-process cluster and proves it works.
//!
//! ```text
//! allocate 2N sockets -> build descriptor -> per node: prepare, validate, start
//!     -> put/get through every client endpoint -> probe every endpoint
//! ```
//!
//! Every step is fail-fast: the first error closes whatever already runs
//! and is returned as is.

mod launcher;
mod ports;
mod prober;
mod runtime;
mod validator;

pub use launcher::*;
pub use ports::*;
pub use prober::*;
pub use runtime::*;
pub use validator::*;


use std::path::Path;
use std::path::PathBuf;

use tokio::sync::watch;
use tracing::info;
use tracing::warn;

use crate::Result;
use crate::Settings;

/// Nodes started by one harness run, in start order
pub struct RunningCluster {
    descriptor: String,
    data_root: PathBuf,
    remove_data_root: bool,
    handles: Vec<Box<dyn NodeHandle>>,
}

impl RunningCluster {
    fn new(
        descriptor: String,
        data_root: PathBuf,
        remove_data_root: bool,
    ) -> Self {
        Self {
            descriptor,
            data_root,
            remove_data_root,
            handles: Vec::new(),
        }
    }

    fn register(
        &mut self,
        handle: Box<dyn NodeHandle>,
    ) {
        self.handles.push(handle);
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn node_names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    pub fn peer_urls(&self) -> Vec<String> {
        self.handles.iter().flat_map(|h| h.peer_urls()).collect()
    }

    pub fn client_urls(&self) -> Vec<String> {
        self.handles.iter().flat_map(|h| h.client_urls()).collect()
    }

    pub fn handles_mut(&mut self) -> &mut [Box<dyn NodeHandle>] {
        &mut self.handles
    }

    /// Closes every registered node, each exactly once, most recently
    /// started first. A data root the harness created itself is removed
    /// afterwards.
    pub async fn close_all(&mut self) {
        while let Some(mut handle) = self.handles.pop() {
            info!(node = %handle.name(), "closing node");
            handle.close().await;
        }

        if self.remove_data_root {
            self.remove_data_root = false;
            if let Err(e) = tokio::fs::remove_dir_all(&self.data_root).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.data_root.display(), "failed to remove data root: {}", e);
                }
            }
        }
    }
}

pub struct ClusterHarness<R: StoreRuntime> {
    settings: Settings,
    runtime: R,
}

impl<R: StoreRuntime> ClusterHarness<R> {
    pub fn new(
        settings: Settings,
        runtime: R,
    ) -> Self {
        Self { settings, runtime }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Allocates, configures and starts every node in allocation order.
    ///
    /// Settings are validated first, so an unusable cluster size is an
    /// `InvalidConfig` error before any port is taken.
    /// Each handle is registered the moment `start` returns it. On the
    /// first failure every registered node is closed and the error is
    /// returned.
    pub async fn bootstrap(&self) -> Result<RunningCluster> {
        self.settings.validate()?;
        let data_root = self.settings.cluster.resolve_data_root();
        let remove_data_root = self.settings.cluster.data_root_dir.is_none();

        let mut launcher = NodeLauncher::allocate(&self.settings, &data_root)?;
        info!(descriptor = %launcher.descriptor(), data_root = %data_root.display(), "cluster allocated");

        let mut cluster = RunningCluster::new(launcher.descriptor().to_string(), data_root, remove_data_root);
        for index in 0..launcher.len() {
            match self.launch(&mut launcher, index).await {
                Ok(handle) => cluster.register(handle),
                Err(e) => {
                    warn!(index, "node failed to start: {}", e);
                    cluster.close_all().await;
                    return Err(e);
                }
            }
        }

        info!(nodes = ?cluster.node_names(), "all nodes started");
        Ok(cluster)
    }

    async fn launch(
        &self,
        launcher: &mut NodeLauncher,
        index: usize,
    ) -> Result<Box<dyn NodeHandle>> {
        let config = launcher.prepare(index)?;
        self.runtime.validate(&config)?;
        self.runtime.start(config).await
    }

    /// Read-after-write through every client endpoint, then a reachability
    /// sweep over every peer and client URL
    pub async fn verify(
        &self,
        cluster: &RunningCluster,
    ) -> Result<()> {
        let network = &self.settings.network;

        let client = self
            .runtime
            .connect(cluster.client_urls(), network.dial_timeout())
            .await?;
        let checked = verify_read_after_write(client.as_ref(), &self.settings.validation).await;
        drop(client);
        checked?;

        let mut urls = cluster.peer_urls();
        urls.extend(cluster.client_urls());
        EndpointProber::new(network.probe_timeout()).probe_all(&urls).await?;
        info!(endpoints = urls.len(), "every endpoint reachable");
        Ok(())
    }

    /// Bootstraps and verifies the cluster, then keeps it running until
    /// `shutdown` fires or its sender is dropped
    pub async fn run(
        &self,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<()> {
        let mut cluster = self.bootstrap().await?;

        if let Err(e) = self.verify(&cluster).await {
            cluster.close_all().await;
            return Err(e);
        }

        info!("cluster verified, waiting for shutdown signal");
        let _ = shutdown.changed().await;

        info!("shutdown signal received, closing cluster");
        cluster.close_all().await;
        Ok(())
    }
}
