//! Wire messages exchanged between members and between clients and members.
//!
//! Every message travels as one length-delimited frame holding its
//! `bincode` encoding. A connection carries strictly alternating
//! request/response frames.

use serde::Deserialize;
use serde::Serialize;

/// Failure classes a member reports back over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Write could not gather a majority of acknowledgements
    QuorumNotReached,
    /// The primary could not be reached to order or serve a request
    PrimaryUnavailable,
    /// Local storage failed while applying or reading
    StorageFailure,
    /// The request was not valid for this member
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRequest {
    /// Sent once by a starting member to every reachable member
    Join {
        name: String,
        cluster_token: String,
        initial_cluster: String,
    },
    /// A non-primary hands a client write to the primary
    Propose { key: Vec<u8>, value: Vec<u8> },
    /// A non-primary hands a client read to the primary
    Read { key: Vec<u8> },
    /// The primary pushes an ordered write to a member
    Replicate {
        revision: u64,
        key: Vec<u8>,
        value: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerResponse {
    JoinAccepted { name: String },
    JoinRejected { name: String, reason: String },
    Proposed { revision: u64 },
    Value { value: Option<Vec<u8>> },
    Replicated { revision: u64 },
    Failed { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientRequest {
    Put { key: Vec<u8>, value: Vec<u8> },
    Get { key: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientResponse {
    PutAck { revision: u64 },
    GetResult { value: Option<Vec<u8>> },
    Failed { code: ErrorCode, message: String },
}

impl ClientResponse {
    pub fn failed(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        ClientResponse::Failed {
            code,
            message: message.into(),
        }
    }
}

impl PeerResponse {
    pub fn failed(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        PeerResponse::Failed {
            code,
            message: message.into(),
        }
    }
}
