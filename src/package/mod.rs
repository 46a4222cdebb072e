//! Transport-agnostic fragmentation of staged payloads.
//!
//! A payload is split into a *chain* of packages. The head package carries
//! the transmission identifier, the package count and a checksum of the whole
//! payload; each continuation carries the identifier and its sequence index.
//! Packages may be delivered in any order, duplicated, or interleaved with
//! other transmissions. [`PackageReassembler`] restores the payload once
//! every index has arrived.
//!
//! Integrity checking is left to the caller: compare
//! [`PackageReassembler::checksum`] with the checksum of the rebuilt buffer,
//! or let [`crate::transport::InboundAssembler`] do it.

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod id;
pub mod reassembler;

pub use builder::{Package, PackageBuilder, PackageChain};
pub use codec::{CONTINUATION_OVERHEAD, HEAD_OVERHEAD, decode_package, encode_package};
pub use config::{
    DEFAULT_DATAGRAM_CHUNK_SIZE,
    PackageConfig,
    SAFE_DATAGRAM_SIZE,
    STREAM_IO_BUFFER_SIZE,
    TransportKind,
};
pub use error::{BuildError, DecodeError, ReassemblyError};
pub use header::{PackageHeader, PackageKind};
pub use id::{ID_LEN, TransmissionId};
pub use reassembler::{
    DEFAULT_PARKING_LIMIT,
    PackageReassembler,
    ParseOutcome,
    ReassemblyState,
    Rejection,
};
