//! Error types emitted by package building, decoding and reassembly.
//!
//! Protocol rejections (a package from another transmission, a continuation
//! before any head) are not errors; they are reported through
//! [`ParseOutcome`](crate::package::ParseOutcome). The enums here cover
//! genuine failures: bad arguments, corrupt input and misuse.

use bincode::error::EncodeError;
use thiserror::Error;

use crate::buffer::BufferError;

/// Errors produced while building a package chain.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The chunk size was zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The payload needs more packages than the count field can express.
    #[error("payload requires {count} packages, exceeding u32::MAX")]
    TooManyPackages { count: usize },
    /// The source buffer could not be read.
    #[error("source buffer unavailable: {0}")]
    Buffer(#[from] BufferError),
    /// A package header failed to encode.
    #[error("failed to encode package header: {0}")]
    Encode(#[from] EncodeError),
}

/// Errors produced while decoding a transport unit into a package.
///
/// These indicate corruption or a version mismatch, never an ordering
/// artefact.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The unit is shorter than the fixed header for its kind.
    #[error("package truncated: {length} bytes, header requires {required}")]
    Truncated { length: usize, required: usize },
    /// The kind marker is not recognised.
    #[error("unknown package kind marker {0:#04x}")]
    UnknownKind(u8),
    /// A head announced a transmission of zero packages.
    #[error("head package announces zero packages")]
    InvalidPackageCount,
    /// The header fields could not be decoded.
    #[error("failed to decode package header: {0}")]
    Header(#[from] bincode::error::DecodeError),
    /// The header decoder consumed an unexpected number of bytes.
    #[error("package header length mismatch: expected {expected}, consumed {found}")]
    HeaderLength { expected: usize, found: usize },
}

/// Errors produced when extracting a payload from a reassembler.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// Not every package of the bound transmission has arrived.
    #[error("transmission incomplete: {received} of {expected} packages received")]
    Incomplete { received: usize, expected: u32 },
}
