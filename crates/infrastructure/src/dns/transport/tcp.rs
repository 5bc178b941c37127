//! TCP Transport for DNS queries (RFC 1035 §4.2.2, RFC 7766)
//!
//! Each message is prefixed with its length as a big-endian u16. A new
//! connection is opened for every query and closed once the response is read.

use super::{DnsTransport, TransportOptions, TransportResponse};
use crate::dns::wire::response_matches;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use stubdns_domain::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tracing::debug;

pub struct TcpTransport {
    server_addr: SocketAddr,
    bind_addr: Option<SocketAddr>,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr, options: &TransportOptions) -> Self {
        let bind_addr = options
            .has_local_addr(server_addr)
            .then(|| options.bind_addr(server_addr));
        Self {
            server_addr,
            bind_addr,
        }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut stream = connect(self.server_addr, self.bind_addr).await?;

        send_with_length_prefix(&mut stream, message_bytes)
            .await
            .map_err(|e| TransportError::from_io(self.server_addr, &e))?;

        debug!(
            server = %self.server_addr,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes = read_matching_response(&mut stream, message_bytes, self.server_addr)
            .await
            .map_err(|e| TransportError::from_io(self.server_addr, &e))?;

        debug!(
            server = %self.server_addr,
            response_len = response_bytes.len(),
            "TCP response received"
        );

        Ok(response_bytes)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| TransportError::Timeout {
                server: self.server_addr.to_string(),
            })??;

        Ok(TransportResponse {
            bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Opens a TCP connection with Nagle disabled, optionally from a fixed
/// local address.
pub(crate) async fn connect(
    server_addr: SocketAddr,
    bind_addr: Option<SocketAddr>,
) -> Result<TcpStream, TransportError> {
    let io_err = |e: std::io::Error| TransportError::from_io(server_addr, &e);

    let stream = match bind_addr {
        Some(local) => {
            let socket = if server_addr.is_ipv4() {
                TcpSocket::new_v4()
            } else {
                TcpSocket::new_v6()
            }
            .map_err(io_err)?;
            socket.bind(local).map_err(io_err)?;
            socket.connect(server_addr).await.map_err(io_err)?
        }
        None => TcpStream::connect(server_addr).await.map_err(io_err)?,
    };

    stream.set_nodelay(true).map_err(io_err)?;
    Ok(stream)
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("DNS message of {} bytes cannot be framed", message_bytes.len()),
        )
    })?;

    let mut framed = Vec::with_capacity(message_bytes.len() + 2);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let response_len = u16::from_be_bytes(len_buf) as usize;

    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await?;

    Ok(response)
}

/// Reads frames until one answers `sent`. Frames that do not match are
/// dropped; the caller's timeout bounds the wait.
pub(crate) async fn read_matching_response<S>(
    stream: &mut S,
    sent: &[u8],
    server_addr: SocketAddr,
) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    loop {
        let frame = read_with_length_prefix(stream).await?;
        if response_matches(sent, &frame) {
            return Ok(frame);
        }
        debug!(
            server = %server_addr,
            frame_len = frame.len(),
            "Discarding frame that does not answer the query"
        );
    }
}
