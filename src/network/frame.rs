use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::codec::LengthDelimitedCodec;

use crate::NetworkError;
use crate::Result;

pub type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Wraps an established stream in the length-delimited codec
pub fn framed(
    stream: TcpStream,
    max_frame_length: usize,
) -> FramedStream {
    let _ = stream.set_nodelay(true);
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_length)
        .new_framed(stream)
}

/// Opens a framed connection, bounded by `connect_timeout`
pub async fn connect(
    address: &str,
    connect_timeout: Duration,
    max_frame_length: usize,
) -> Result<FramedStream> {
    match timeout(connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => Ok(framed(stream, max_frame_length)),
        Ok(Err(source)) => Err(NetworkError::ConnectError {
            address: address.to_string(),
            source,
        }
        .into()),
        Err(_) => Err(NetworkError::Timeout {
            address: address.to_string(),
            duration: connect_timeout,
        }
        .into()),
    }
}

pub async fn send_message<T: Serialize>(
    stream: &mut FramedStream,
    message: &T,
) -> Result<()> {
    let payload = bincode::serialize(message)?;
    stream.send(Bytes::from(payload)).await.map_err(NetworkError::Io)?;
    Ok(())
}

/// `Ok(None)` when the remote side closed the stream cleanly
pub async fn recv_message<T: DeserializeOwned>(stream: &mut FramedStream) -> Result<Option<T>> {
    match stream.next().await {
        None => Ok(None),
        Some(Ok(frame)) => Ok(Some(bincode::deserialize(&frame)?)),
        Some(Err(e)) => Err(NetworkError::Io(e).into()),
    }
}

/// One request/response exchange, bounded by `deadline`
pub async fn call<Req, Resp>(
    stream: &mut FramedStream,
    address: &str,
    request: &Req,
    deadline: Duration,
) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let exchange = async {
        send_message(stream, request).await?;
        match recv_message(stream).await? {
            Some(response) => Ok(response),
            None => Err(NetworkError::ConnectionClosed(address.to_string()).into()),
        }
    };

    match timeout(deadline, exchange).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Timeout {
            address: address.to_string(),
            duration: deadline,
        }
        .into()),
    }
}
