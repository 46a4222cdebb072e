//! Errors raised by [`StagedBuffer`](crate::buffer::StagedBuffer).

use thiserror::Error;

/// Failures reported by staged buffer operations.
///
/// Every variant is surfaced to the immediate caller; the buffer never
/// truncates a write or serves partially written data silently.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// A write would exceed the declared capacity.
    #[error("buffer overflow: attempted to write {attempted} bytes with {remaining} remaining")]
    CapacityExceeded { attempted: usize, remaining: usize },
    /// The caller supplied unusable input.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A sub-range lies outside the source slice.
    #[error("range {offset}..{offset}+{length} is outside a source of {available} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },
    /// Reading or repositioning was attempted before every byte was written.
    #[error("buffer not readable until complete: {written} of {capacity} bytes written")]
    NotReadable { written: usize, capacity: usize },
    /// The buffer has been released.
    #[error("buffer has been released")]
    Disposed,
}
