use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;
use tracing::error;
use tracing::warn;
use tracing::Instrument;

use super::NodeState;
use crate::network::framed;
use crate::network::recv_message;
use crate::network::send_message;
use crate::network::FramedStream;
use crate::proto::ClientRequest;
use crate::proto::PeerRequest;

/// Pause after a failed accept before trying again
pub(crate) const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Which of a node's two listeners a connection arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listener {
    Peer,
    Client,
}

impl Listener {
    fn as_str(&self) -> &'static str {
        match self {
            Listener::Peer => "peer",
            Listener::Client => "client",
        }
    }
}

/// Accepts connections until `token` is cancelled. Every accepted
/// connection is served on its own task, tracked by `tracker` so that
/// shutdown can wait for all of them.
pub(crate) async fn accept_loop(
    kind: Listener,
    listener: TcpListener,
    state: Arc<NodeState>,
    token: CancellationToken,
    tracker: TaskTracker,
) {
    let local_addr = listener.local_addr().map(|a| a.to_string()).unwrap_or_default();
    debug!(listener = kind.as_str(), %local_addr, "accepting connections");

    loop {
        let accepted = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, remote)) => {
                let stream = framed(stream, state.network.max_frame_length);
                let state = state.clone();
                let token = token.clone();
                tracker.spawn(
                    async move {
                        match kind {
                            Listener::Peer => {
                                serve_connection(stream, remote, token, |req: PeerRequest| {
                                    let state = state.clone();
                                    async move { state.handle_peer_request(req).await }
                                })
                                .await
                            }
                            Listener::Client => {
                                serve_connection(stream, remote, token, |req: ClientRequest| {
                                    let state = state.clone();
                                    async move { state.handle_client_request(req).await }
                                })
                                .await
                            }
                        }
                    }
                    .in_current_span(),
                );
            }
            Err(e) => {
                // Transient accept errors (e.g. EMFILE) must not stop the listener
                warn!(listener = kind.as_str(), %local_addr, "accept failed: {}", e);
                if !pause_before_retry(&token).await {
                    break;
                }
            }
        }
    }

    debug!(listener = kind.as_str(), %local_addr, "listener stopped");
}

/// Waits `ACCEPT_RETRY_DELAY` after a failed accept. Returns `false` when
/// `token` is cancelled first.
pub(crate) async fn pause_before_retry(token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_RETRY_DELAY) => true,
    }
}

/// Serves request/response exchanges on one connection until the remote
/// side hangs up, a frame fails to decode or `token` is cancelled.
async fn serve_connection<Req, Resp, F, Fut>(
    mut stream: FramedStream,
    remote: SocketAddr,
    token: CancellationToken,
    handler: F,
) where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: Fn(Req) -> Fut,
    Fut: Future<Output = Resp>,
{
    loop {
        let received = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            received = recv_message::<Req>(&mut stream) => received,
        };

        let request = match received {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                debug!(%remote, "dropping connection: {}", e);
                return;
            }
        };

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            response = handler(request) => response,
        };

        if let Err(e) = send_message(&mut stream, &response).await {
            error!(%remote, "failed to send response: {}", e);
            return;
        }
    }
}

