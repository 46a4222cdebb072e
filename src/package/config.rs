//! Chunk-size policy shared by transports.
//!
//! Connection-oriented transports chunk at their internal I/O buffer size.
//! Datagram transports chunk so that a packed head still fits in a datagram
//! that no IPv6 path needs to fragment.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::codec::HEAD_OVERHEAD;

/// Internal I/O buffer size of stream and web-socket transports.
pub const STREAM_IO_BUFFER_SIZE: usize = 8192;

/// Largest UDP payload delivered unfragmented on any IPv6 path
/// (1280-byte minimum MTU less 40 bytes of IPv6 and 8 bytes of UDP header).
pub const SAFE_DATAGRAM_SIZE: usize = 1232;

/// Default chunk size for datagram transports.
pub const DEFAULT_DATAGRAM_CHUNK_SIZE: usize = SAFE_DATAGRAM_SIZE - HEAD_OVERHEAD;

const fn non_zero(value: usize) -> NonZeroUsize {
    match NonZeroUsize::new(value) {
        Some(value) => value,
        None => panic!("chunk size constants must be non-zero"),
    }
}

pub(crate) const STREAM_CHUNK: NonZeroUsize = non_zero(STREAM_IO_BUFFER_SIZE);
pub(crate) const DATAGRAM_CHUNK: NonZeroUsize = non_zero(DEFAULT_DATAGRAM_CHUNK_SIZE);

/// Transport families that carry packages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Connection-oriented byte stream, such as TCP.
    Stream,
    /// Unordered, possibly lossy datagrams, such as UDP.
    Datagram,
    /// Web-socket binary frames.
    WebSocket,
}

/// Settings applied when building and receiving packages.
///
/// # Examples
///
/// ```
/// use wirepack::{PackageConfig, TransportKind};
/// let config = PackageConfig::for_transport(TransportKind::Datagram);
/// assert_eq!(config.chunk_size.get(), wirepack::DEFAULT_DATAGRAM_CHUNK_SIZE);
/// assert!(config.verify_checksum);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Maximum payload bytes carried by one package.
    pub chunk_size: NonZeroUsize,
    /// Compare the reassembled payload against the head's checksum before
    /// handing it to the application.
    #[serde(default = "default_verify")]
    pub verify_checksum: bool,
}

const fn default_verify() -> bool { true }

impl PackageConfig {
    /// Configuration for a connection-oriented transport whose I/O buffer
    /// holds `io_buffer_size` bytes.
    #[must_use]
    pub const fn stream(io_buffer_size: NonZeroUsize) -> Self {
        Self {
            chunk_size: io_buffer_size,
            verify_checksum: true,
        }
    }

    /// Configuration for a datagram transport.
    #[must_use]
    pub const fn datagram() -> Self {
        Self {
            chunk_size: DATAGRAM_CHUNK,
            verify_checksum: true,
        }
    }

    /// Default configuration for `kind`.
    #[must_use]
    pub const fn for_transport(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Stream | TransportKind::WebSocket => Self::stream(STREAM_CHUNK),
            TransportKind::Datagram => Self::datagram(),
        }
    }

    /// Return a copy with checksum verification switched on or off.
    #[must_use]
    pub const fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Largest transport unit produced under this configuration.
    #[must_use]
    pub const fn max_unit_size(&self) -> usize { self.chunk_size.get() + HEAD_OVERHEAD }
}

impl Default for PackageConfig {
    fn default() -> Self { Self::for_transport(TransportKind::Stream) }
}
