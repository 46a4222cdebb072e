//! Inbound helper that rebuilds one transmission from its packages.
//!
//! [`PackageReassembler`] binds to the first head it sees and then stores
//! chunks by sequence index, so arrival order and duplicates do not matter.
//! Packages from any other transmission are rejected without touching the
//! bound state. Continuations that arrive before their head are parked (up
//! to a fixed limit) and adopted once the head binds the reassembler.
//!
//! One reassembler handles one transmission. It is not synchronised; callers
//! feeding it from several threads must serialise access themselves.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::{debug, trace};

use super::{
    DecodeError,
    PackageHeader,
    ReassemblyError,
    TransmissionId,
    codec::decode_package,
};
use crate::{buffer::StagedBuffer, checksum::Checksum};

/// Continuations held while no head has been seen, by default.
pub const DEFAULT_PARKING_LIMIT: usize = 1024;

/// Lifecycle of a [`PackageReassembler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReassemblyState {
    /// No head has been accepted yet.
    Unbound,
    /// Bound to a transmission, waiting for more chunks.
    Bound,
    /// Every chunk of the bound transmission has arrived.
    Complete,
}

/// Reason a package was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The package belongs to a transmission other than the bound one.
    ForeignTransmission {
        expected: TransmissionId,
        found: TransmissionId,
    },
    /// A continuation arrived before any head and could not be parked.
    Orphan,
    /// The sequence index lies outside the bound transmission.
    SequenceOutOfRange { sequence: u32, package_count: u32 },
}

/// Result of feeding one unit into a [`PackageReassembler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A head bound the reassembler; more packages are expected.
    Bound,
    /// The chunk was stored; more packages are expected.
    Accepted,
    /// The chunk completed the transmission.
    Completed,
    /// A continuation arrived before any head and was set aside.
    Parked,
    /// The package was ignored.
    Rejected(Rejection),
}

impl ParseOutcome {
    /// Whether the package was taken into the bound transmission.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Bound | Self::Accepted | Self::Completed)
    }
}

#[derive(Debug)]
struct Binding {
    id: TransmissionId,
    package_count: u32,
    checksum: Checksum,
    chunks: BTreeMap<u32, Bytes>,
}

impl Binding {
    fn is_complete(&self) -> bool {
        u32::try_from(self.chunks.len()).is_ok_and(|received| received == self.package_count)
    }
}

#[derive(Debug)]
struct ParkedChunk {
    id: TransmissionId,
    sequence: u32,
    chunk: Bytes,
}

/// Receiving-side state machine for a single transmission.
///
/// # Examples
///
/// ```
/// use wirepack::{PackageBuilder, PackageReassembler, StagedBuffer};
///
/// let payload = StagedBuffer::from_bytes(b"Hello World.");
/// let chain = PackageBuilder::with_chunk_size(5)
///     .expect("non-zero chunk size")
///     .build(&payload)
///     .expect("build chain");
///
/// let mut reassembler = PackageReassembler::new();
/// for unit in chain.packed().collect::<Vec<_>>().into_iter().rev() {
///     reassembler.parse(&unit).expect("well-formed unit");
/// }
/// assert!(reassembler.is_complete());
///
/// let rebuilt = reassembler.to_buffer().expect("complete transmission");
/// assert_eq!(rebuilt.checksum().ok(), reassembler.checksum());
/// ```
#[derive(Debug)]
pub struct PackageReassembler {
    binding: Option<Binding>,
    parked: Vec<ParkedChunk>,
    parking_limit: usize,
}

impl Default for PackageReassembler {
    fn default() -> Self { Self::new() }
}

impl PackageReassembler {
    /// Create an unbound reassembler.
    #[must_use]
    pub const fn new() -> Self { Self::with_parking_limit(DEFAULT_PARKING_LIMIT) }

    /// Create an unbound reassembler that parks at most `limit` early
    /// continuations.
    #[must_use]
    pub const fn with_parking_limit(limit: usize) -> Self {
        Self {
            binding: None,
            parked: Vec::new(),
            parking_limit: limit,
        }
    }

    /// Feed one transport unit, returning whether it was accepted into the
    /// bound transmission.
    ///
    /// `false` is a routine outcome: the unit belongs to another
    /// transmission, or it is a continuation that arrived before any head.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the unit is malformed.
    pub fn parse(&mut self, packed: impl AsRef<[u8]>) -> Result<bool, DecodeError> {
        self.accept(packed).map(ParseOutcome::is_accepted)
    }

    /// Feed one transport unit, returning a detailed outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the unit is malformed. A malformed unit
    /// never changes the reassembler's state.
    pub fn accept(&mut self, packed: impl AsRef<[u8]>) -> Result<ParseOutcome, DecodeError> {
        let (header, chunk) = decode_package(packed.as_ref())?;
        if let Some(binding) = self.binding.as_mut() {
            return Ok(Self::store(binding, header, chunk));
        }
        let outcome = match header {
            PackageHeader::Head {
                id,
                package_count,
                checksum,
            } => self.bind(id, package_count, checksum, chunk),
            PackageHeader::Continuation { id, sequence } => self.park(id, sequence, chunk),
        };
        Ok(outcome)
    }

    fn bind(
        &mut self,
        id: TransmissionId,
        package_count: u32,
        checksum: Checksum,
        chunk: &[u8],
    ) -> ParseOutcome {
        let mut chunks = BTreeMap::new();
        chunks.insert(0, Bytes::copy_from_slice(chunk));
        for parked in self.parked.drain(..) {
            if parked.id == id && (1..package_count).contains(&parked.sequence) {
                chunks.insert(parked.sequence, parked.chunk);
            } else {
                trace!(
                    found = %parked.id,
                    sequence = parked.sequence,
                    "discarding parked package"
                );
            }
        }
        let binding = Binding {
            id,
            package_count,
            checksum,
            chunks,
        };
        debug!(
            %id,
            package_count,
            received = binding.chunks.len(),
            "reassembler bound to transmission"
        );
        let complete = binding.is_complete();
        self.binding = Some(binding);
        if complete {
            debug!(%id, "transmission complete");
            ParseOutcome::Completed
        } else {
            ParseOutcome::Bound
        }
    }

    fn park(&mut self, id: TransmissionId, sequence: u32, chunk: &[u8]) -> ParseOutcome {
        if self.parked.len() >= self.parking_limit {
            debug!(%id, sequence, "dropping continuation received before any head");
            return ParseOutcome::Rejected(Rejection::Orphan);
        }
        trace!(%id, sequence, "parking continuation until its head arrives");
        self.parked.push(ParkedChunk {
            id,
            sequence,
            chunk: Bytes::copy_from_slice(chunk),
        });
        ParseOutcome::Parked
    }

    fn store(binding: &mut Binding, header: PackageHeader, chunk: &[u8]) -> ParseOutcome {
        let found = header.id();
        if found != binding.id {
            debug!(
                expected = %binding.id,
                %found,
                "rejecting package from foreign transmission"
            );
            return ParseOutcome::Rejected(Rejection::ForeignTransmission {
                expected: binding.id,
                found,
            });
        }

        let sequence = header.sequence();
        let in_range = if header.is_head() {
            true
        } else {
            (1..binding.package_count).contains(&sequence)
        };
        if !in_range {
            debug!(
                id = %found,
                sequence,
                package_count = binding.package_count,
                "rejecting package with out-of-range sequence"
            );
            return ParseOutcome::Rejected(Rejection::SequenceOutOfRange {
                sequence,
                package_count: binding.package_count,
            });
        }

        let was_complete = binding.is_complete();
        binding.chunks.insert(sequence, Bytes::copy_from_slice(chunk));
        trace!(
            id = %found,
            sequence,
            received = binding.chunks.len(),
            "stored package"
        );
        if binding.is_complete() && !was_complete {
            debug!(id = %found, "transmission complete");
            ParseOutcome::Completed
        } else {
            ParseOutcome::Accepted
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReassemblyState {
        match &self.binding {
            None => ReassemblyState::Unbound,
            Some(binding) if binding.is_complete() => ReassemblyState::Complete,
            Some(_) => ReassemblyState::Bound,
        }
    }

    /// Whether every chunk of the bound transmission has arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.state() == ReassemblyState::Complete }

    /// Checksum announced by the bound head, or `None` before binding.
    ///
    /// Compare it with [`StagedBuffer::checksum`] on the result of
    /// [`to_buffer`](Self::to_buffer); the reassembler does not verify it.
    #[must_use]
    pub fn checksum(&self) -> Option<Checksum> { self.binding.as_ref().map(|b| b.checksum) }

    /// Identifier of the bound transmission.
    #[must_use]
    pub fn id(&self) -> Option<TransmissionId> { self.binding.as_ref().map(|b| b.id) }

    /// Package count announced by the bound head.
    #[must_use]
    pub fn package_count(&self) -> Option<u32> { self.binding.as_ref().map(|b| b.package_count) }

    /// Number of distinct chunks stored for the bound transmission.
    #[must_use]
    pub fn received(&self) -> usize { self.binding.as_ref().map_or(0, |b| b.chunks.len()) }

    /// Number of continuations waiting for their head.
    #[must_use]
    pub fn parked(&self) -> usize { self.parked.len() }

    /// Concatenate the chunks in sequence order into a new buffer.
    ///
    /// The buffer's capacity equals the payload length, so it is complete and
    /// readable unless the payload is empty. The caller owns the result.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Incomplete`] until every chunk has arrived.
    pub fn to_buffer(&self) -> Result<StagedBuffer, ReassemblyError> {
        let binding = match &self.binding {
            Some(binding) if binding.is_complete() => binding,
            other => {
                return Err(ReassemblyError::Incomplete {
                    received: self.received(),
                    expected: other.as_ref().map_or(0, |b| b.package_count),
                });
            }
        };
        let total = binding.chunks.values().map(Bytes::len).sum();
        let mut payload = Vec::with_capacity(total);
        for chunk in binding.chunks.values() {
            payload.extend_from_slice(chunk);
        }
        Ok(StagedBuffer::from_vec(payload))
    }
}
