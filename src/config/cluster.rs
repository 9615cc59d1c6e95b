use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

pub const SUPPORTED_SCHEME: &str = "http";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    /// Number of nodes launched in this process
    #[serde(default = "default_size")]
    pub size: usize,

    /// Node `i` is named `{name_prefix}{i}`
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Host every ephemeral socket is bound to and advertised as
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Parent of every node's data directory. A fresh temp directory is
    /// used when unset.
    #[serde(default)]
    pub data_root_dir: Option<PathBuf>,

    /// Shared by every member; a join with another token is refused
    #[serde(default = "default_cluster_token")]
    pub cluster_token: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            name_prefix: default_name_prefix(),
            host: default_host(),
            scheme: default_scheme(),
            data_root_dir: None,
            cluster_token: default_cluster_token(),
        }
    }
}

impl ClusterConfig {
    /// Validates cluster configuration consistency
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("cluster size must be at least 1".into()));
        }

        if self.name_prefix.is_empty() || self.name_prefix.contains(['=', ',']) {
            return Err(Error::InvalidConfig(format!(
                "name_prefix {:?} must be non-empty and free of '=' and ','",
                self.name_prefix
            )));
        }

        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host cannot be empty".into()));
        }

        if self.scheme != SUPPORTED_SCHEME {
            return Err(Error::InvalidConfig(format!(
                "scheme {:?} is not supported, only {:?}",
                self.scheme, SUPPORTED_SCHEME
            )));
        }

        if self.cluster_token.is_empty() {
            return Err(Error::InvalidConfig("cluster_token cannot be empty".into()));
        }

        if let Some(dir) = &self.data_root_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("data_root_dir path cannot be empty".into()));
            }
        }

        Ok(())
    }

    /// Name of the node at `index`
    pub fn node_name(
        &self,
        index: usize,
    ) -> String {
        format!("{}{}", self.name_prefix, index)
    }

    /// Configured data root, or a unique directory under the OS temp dir
    pub fn resolve_data_root(&self) -> PathBuf {
        self.data_root_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(format!("d-embed-{}", nanoid::nanoid!(10))))
    }
}

fn default_size() -> usize {
    3
}
fn default_name_prefix() -> String {
    "server".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_scheme() -> String {
    SUPPORTED_SCHEME.to_string()
}
fn default_cluster_token() -> String {
    "d-embed-cluster".to_string()
}
