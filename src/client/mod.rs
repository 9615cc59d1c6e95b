//! Client for the store's client endpoints
//!
//! - [`Client`] - Main entry point
//! - [`ClientBuilder`] - Configurable client construction
//! - [`KvClient`] - Key-value store operations
//! - [`ConnectionPool`] - Underlying connection management
//!
//! # Basic Usage
//! ```no_run
//! use std::time::Duration;
//!
//! use d_embed::Client;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = Client::builder(vec![
//!         "http://127.0.0.1:9081".into(),
//!         "http://127.0.0.1:9082".into(),
//!     ])
//!     .dial_timeout(Duration::from_secs(10))
//!     .request_timeout(Duration::from_secs(5))
//!     .build()
//!     .await
//!     .unwrap();
//!
//!     client.kv().put("foo", "bar").await.unwrap();
//!     let value = client.kv().get("foo").await.unwrap();
//!     println!("foo = {:?}", value);
//! }
//! ```

mod builder;
mod config;
mod kv;
mod pool;

pub use builder::*;
pub use config::*;
pub use kv::*;
pub use pool::*;

#[cfg(test)]
mod pool_test;

/// Main entry point for talking to the cluster
///
/// Created through the [`builder()`](Client::builder) method
#[derive(Clone)]
pub struct Client {
    pub(super) kv: KvClient,
    pub(super) endpoints: Vec<String>,
}

impl Client {
    /// Access the key-value operations client
    pub fn kv(&self) -> &KvClient {
        &self.kv
    }

    /// Endpoints the client was built with
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Create a configured client builder
    ///
    /// Chain configuration methods before calling
    /// [`build()`](ClientBuilder::build).
    pub fn builder(endpoints: Vec<String>) -> ClientBuilder {
        ClientBuilder::new(endpoints)
    }
}
