//! Launches several store nodes inside one process, joins them through a
//! static membership descriptor and verifies the result.
//!
//! ```rust,no_run
//! use d_embed::ClusterHarness;
//! use d_embed::EmbeddedRuntime;
//! use d_embed::Settings;
//! use tokio::sync::watch;
//!
//! # async fn demo() -> d_embed::Result<()> {
//! let settings = Settings::load(None)?;
//! let runtime = EmbeddedRuntime::new(settings.network.clone());
//! let (_shutdown_tx, shutdown_rx) = watch::channel(());
//! ClusterHarness::new(settings, runtime).run(shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod errors;
mod harness;
mod membership;
mod node;
mod storage;

pub mod network;
pub mod proto;
pub mod utils;

pub(crate) mod constants;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use harness::*;
pub use membership::*;
pub use network::*;
pub use node::*;
pub use storage::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
