//! # Transport
//!
//! Purpose: Move whole commands and whole replies over a byte stream.
//!
//! ## Design Principles
//! 1. **Seam, Not Policy**: [`Transport`] is the only I/O the client does;
//!    tests swap in scripted transports, and embedders can bring their own.
//! 2. **Whole Replies**: [`TcpTransport::recv`] reads the header line and
//!    then exactly the announced body, so the parser never sees a partial
//!    reply.
//! 3. **No Retry**: Timeouts and resets surface as I/O errors; recovery is
//!    the caller's decision.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bstalk_proto::declared_body_len;

use crate::error::{ClientError, ClientResult};

/// Byte-stream connection used by [`Client`](crate::Client).
pub trait Transport {
    /// Opens the connection.
    fn connect(&mut self) -> ClientResult<()>;

    /// Reports whether the connection is live.
    fn is_connected(&self) -> bool;

    /// Writes one encoded command.
    fn send(&mut self, bytes: &[u8]) -> ClientResult<()>;

    /// Reads one complete reply.
    fn recv(&mut self) -> ClientResult<Vec<u8>>;

    /// Closes the connection. Closing twice is a no-op.
    fn close(&mut self);
}

/// Default cap on reply bodies (64 MiB).
pub const DEFAULT_MAX_BODY_LEN: usize = 64 * 1024 * 1024;

/// Configuration for the client and its TCP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, e.g. "127.0.0.1:11300". Host names are resolved.
    pub addr: String,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Optional TCP read timeout. `reserve` blocks on reads, so leave this
    /// unset unless every reserve uses a shorter server-side timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
    /// Largest reply body accepted. A reply announcing more closes the
    /// connection with an `InvalidData` error.
    pub max_body_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:11300".to_string(),
            connect_timeout: Some(Duration::from_secs(1)),
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }
}

/// Blocking TCP transport.
pub struct TcpTransport {
    config: ClientConfig,
    // Buffered reader reduces syscalls while still allowing direct writes.
    reader: Option<BufReader<TcpStream>>,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        TcpTransport {
            config,
            reader: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn read_reply(reader: &mut BufReader<TcpStream>, max_body_len: usize) -> io::Result<Vec<u8>> {
        let mut reply = Vec::with_capacity(128);
        let bytes = reader.read_until(b'\n', &mut reply)?;
        if bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        if let Some(len) = declared_body_len(&reply) {
            if len > max_body_len {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reply body of {len} bytes exceeds limit of {max_body_len}"),
                ));
            }
            let header_len = reply.len();
            // Body plus its CRLF terminator.
            let total = len
                .checked_add(2)
                .and_then(|body| body.checked_add(header_len))
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "reply body too large"))?;
            reply.resize(total, 0);
            reader.read_exact(&mut reply[header_len..])?;
        }
        Ok(reply)
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> ClientResult<()> {
        self.close();
        let stream = connect_stream(&self.config)?;
        if let Some(timeout) = self.config.read_timeout {
            stream.set_read_timeout(Some(timeout))?;
        }
        if let Some(timeout) = self.config.write_timeout {
            stream.set_write_timeout(Some(timeout))?;
        }
        stream.set_nodelay(self.config.nodelay)?;
        tracing::debug!(addr = %self.config.addr, "connected");
        self.reader = Some(BufReader::new(stream));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> ClientResult<()> {
        let reader = self.reader.as_mut().ok_or(ClientError::NotConnected)?;
        let stream = reader.get_mut();
        let written = stream.write_all(bytes).and_then(|()| stream.flush());
        if let Err(err) = written {
            self.close();
            return Err(err.into());
        }
        Ok(())
    }

    fn recv(&mut self) -> ClientResult<Vec<u8>> {
        let reader = self.reader.as_mut().ok_or(ClientError::NotConnected)?;
        match Self::read_reply(reader, self.config.max_body_len) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                // The stream position is unknown after a failed read.
                self.close();
                Err(err.into())
            }
        }
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            let _ = reader.get_ref().shutdown(std::net::Shutdown::Both);
            tracing::debug!(addr = %self.config.addr, "connection closed");
        }
    }
}

fn connect_stream(config: &ClientConfig) -> ClientResult<TcpStream> {
    let addr = resolve(&config.addr)?;
    let stream = match config.connect_timeout {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
        None => TcpStream::connect(addr)?,
    };
    Ok(stream)
}

fn resolve(addr: &str) -> ClientResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|_| ClientError::InvalidAddress(addr.to_string()))?
        .next()
        .ok_or_else(|| ClientError::InvalidAddress(addr.to_string()))
}
