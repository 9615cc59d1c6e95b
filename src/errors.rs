//! Error hierarchy for the embedded cluster harness
//!
//! Every error below is fatal to a harness run. Retries, where they exist at
//! all, belong to the store runtime's own protocol and never to the harness.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operating system refused an ephemeral bind
    #[error("Failed to bind ephemeral socket on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be loaded or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A node or harness configuration is missing fields or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A node failed to come up
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// No client endpoint could be dialed
    #[error("Failed to dial any of {endpoints:?}: {reason}")]
    Dial { endpoints: Vec<String>, reason: String },

    /// A put was not acknowledged
    #[error("Write failed: {0}")]
    Write(String),

    /// A get did not return a value
    #[error("Read failed: {0}")]
    Read(String),

    /// The value read back differs from the one just written
    #[error("Read-after-write mismatch for key {key:?}: expected {expected:?}, observed {observed:?}")]
    ValueMismatch {
        key: String,
        expected: String,
        observed: String,
    },

    /// An advertised endpoint did not accept a connection
    #[error("Endpoint {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// Infrastructure-level failures (network, storage, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Data directory could not be opened as a store
    #[error("Storage directory {path} unusable: {reason}")]
    Storage { path: PathBuf, reason: String },

    /// A pre-bound socket was not handed to the node
    #[error("Missing pre-bound {kind} socket for node {name}")]
    MissingSocket { name: String, kind: &'static str },

    /// A pre-bound socket could not be turned into a listener
    #[error("Failed to listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A running member refused this node's view of the cluster
    #[error("Peer {peer} rejected join of {name}: {reason}")]
    JoinRejected {
        name: String,
        peer: String,
        reason: String,
    },

    /// A member listed ahead of this node, and so already started, did not answer
    #[error("Peer {peer} unreachable while {name} joined: {reason}")]
    PeerUnreachable {
        name: String,
        peer: String,
        reason: String,
    },

    /// The membership descriptor could not be used at startup
    #[error("Membership descriptor unusable: {0}")]
    Membership(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// TCP connect refused or reset
    #[error("Connect to {address} failed: {source}")]
    ConnectError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Peer or client communication timeout
    #[error("Request to {address} timed out after {duration:?}")]
    Timeout { address: String, duration: Duration },

    /// Stream closed before a response frame arrived
    #[error("Connection to {0} closed")]
    ConnectionClosed(String),

    /// Unknown member name
    #[error("No peer channel for member {0}")]
    NoPeerFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    /// Error type for value conversion operations
    #[error("Value convert failed")]
    Convert(#[from] ConvertError),
}

/// Error type for value conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// This occurs when the input byte slice length doesn't match the required 8 bytes.
    #[error("invalid byte length: expected 8 bytes, received {0} bytes")]
    InvalidLength(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

// Serialization is classified separately (across protocol layers and system layers)
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

// ============== Conversion Implementations ============== //
impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::System(SystemError::Network(e))
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<ConvertError> for Error {
    fn from(e: ConvertError) -> Self {
        Error::System(SystemError::Storage(StorageError::Convert(e)))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        SerializationError::Bincode(e).into()
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        StorageError::DbError(err.to_string()).into()
    }
}

impl Error {
    /// True when the error belongs to the startup family
    pub fn is_startup(&self) -> bool {
        matches!(self, Error::Startup(_))
    }
}
