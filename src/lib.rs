#![doc(html_root_url = "https://docs.rs/wirepack/latest")]
//! Public API for the `wirepack` library.
//!
//! This crate provides a thread-safe staging buffer that only becomes
//! readable once full, and a transport-agnostic scheme for splitting such a
//! payload into identified, sequenced packages and rebuilding it on the far
//! side regardless of arrival order.

pub mod buffer;
pub mod checksum;
pub mod metrics;
pub mod package;
pub mod transport;

pub use buffer::{BufferError, StagedBuffer};
pub use checksum::{CHECKSUM_LEN, Checksum};
pub use metrics::{
    Direction,
    PACKAGES_PROCESSED,
    PACKAGES_REJECTED,
    RejectReason,
    TRANSMISSIONS_COMPLETED,
};
pub use package::{
    BuildError,
    CONTINUATION_OVERHEAD,
    DEFAULT_DATAGRAM_CHUNK_SIZE,
    DecodeError,
    HEAD_OVERHEAD,
    Package,
    PackageBuilder,
    PackageChain,
    PackageConfig,
    PackageHeader,
    PackageKind,
    PackageReassembler,
    ParseOutcome,
    ReassemblyError,
    ReassemblyState,
    Rejection,
    SAFE_DATAGRAM_SIZE,
    STREAM_IO_BUFFER_SIZE,
    TransmissionId,
    TransportKind,
};
pub use transport::{InboundAssembler, InboundError, outbound_units};
