//! Glue between package chains and the transports that carry them.
//!
//! Transports stay outside this crate. On the sending side they call
//! [`outbound_units`] and write each returned unit in order. On the receiving
//! side they feed every unit to an [`InboundAssembler`], which yields a
//! [`StagedBuffer`] once a transmission is complete and verified.

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    buffer::{BufferError, StagedBuffer},
    checksum::Checksum,
    metrics::{self, Direction, RejectReason},
    package::{
        BuildError,
        DecodeError,
        PackageBuilder,
        PackageConfig,
        PackageReassembler,
        ParseOutcome,
        Rejection,
    },
};

/// Build the chain for `buffer` and return its packed units in chain order.
///
/// Each unit is meant for exactly one transport write.
///
/// # Errors
///
/// Propagates any [`BuildError`] from [`PackageBuilder::build`].
pub fn outbound_units(
    buffer: &StagedBuffer,
    config: &PackageConfig,
) -> Result<Vec<Bytes>, BuildError> {
    let chain = PackageBuilder::from_config(config).build(buffer)?;
    let units: Vec<Bytes> = chain.packed().collect();
    metrics::inc_packages(
        Direction::Outbound,
        u64::try_from(units.len()).unwrap_or(u64::MAX),
    );
    Ok(units)
}

/// Failures surfaced by [`InboundAssembler::receive`].
#[derive(Debug, Error)]
pub enum InboundError {
    /// The unit was not a well-formed package.
    #[error("malformed unit: {0}")]
    Decode(#[from] DecodeError),
    /// The rebuilt payload does not match the head's checksum.
    #[error("checksum mismatch: head announced {expected}, payload digests to {actual}")]
    Integrity { expected: Checksum, actual: Checksum },
    /// The rebuilt buffer could not be read.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Receiving-side driver that turns a stream of units into payloads.
///
/// The assembler owns one [`PackageReassembler`] at a time. After a
/// transmission completes, or fails its integrity check, a fresh reassembler
/// takes over so the next transmission can bind.
///
/// # Examples
///
/// ```
/// use wirepack::{InboundAssembler, PackageConfig, StagedBuffer, transport::outbound_units};
///
/// let config = PackageConfig::datagram();
/// let units = outbound_units(&StagedBuffer::from_bytes(b"Hello World."), &config)
///     .expect("build units");
///
/// let mut inbound = InboundAssembler::new(config);
/// let payload = units
///     .iter()
///     .find_map(|unit| inbound.receive(unit).expect("valid unit"))
///     .expect("transmission completes");
/// assert_eq!(payload.to_vec().expect("live buffer"), b"Hello World.");
/// ```
#[derive(Debug)]
pub struct InboundAssembler {
    config: PackageConfig,
    reassembler: PackageReassembler,
}

impl InboundAssembler {
    /// Create an assembler applying `config`.
    #[must_use]
    pub fn new(config: PackageConfig) -> Self {
        Self {
            config,
            reassembler: PackageReassembler::new(),
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &PackageConfig { &self.config }

    /// Reassembler for the transmission currently in progress.
    #[must_use]
    pub const fn current(&self) -> &PackageReassembler { &self.reassembler }

    /// Feed one unit received from the transport.
    ///
    /// Returns `Ok(Some(buffer))` when the unit completes a transmission and
    /// `Ok(None)` when more units are needed or the unit was rejected.
    ///
    /// # Errors
    ///
    /// Returns [`InboundError::Decode`] for malformed units, which leave the
    /// transmission in progress untouched, and [`InboundError::Integrity`]
    /// when checksum verification is enabled and the payload does not match.
    pub fn receive(
        &mut self,
        unit: impl AsRef<[u8]>,
    ) -> Result<Option<StagedBuffer>, InboundError> {
        let outcome = match self.reassembler.accept(unit) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "discarding malformed unit");
                metrics::inc_rejected(RejectReason::Malformed);
                return Err(err.into());
            }
        };
        metrics::inc_packages(Direction::Inbound, 1);
        match outcome {
            ParseOutcome::Completed => self.finish(),
            ParseOutcome::Rejected(rejection) => {
                debug!(?rejection, "unit did not join the current transmission");
                metrics::inc_rejected(reject_reason(rejection));
                Ok(None)
            }
            ParseOutcome::Bound | ParseOutcome::Accepted | ParseOutcome::Parked => Ok(None),
        }
    }

    fn finish(&mut self) -> Result<Option<StagedBuffer>, InboundError> {
        let buffer = match self.reassembler.to_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                debug!(error = %err, "transmission not ready for delivery");
                return Ok(None);
            }
        };
        let reassembler = std::mem::take(&mut self.reassembler);
        if self.config.verify_checksum {
            let actual = buffer.checksum()?;
            match reassembler.checksum() {
                Some(expected) if expected != actual => {
                    warn!(
                        id = ?reassembler.id(),
                        %expected,
                        %actual,
                        "rebuilt payload failed checksum verification"
                    );
                    metrics::inc_rejected(RejectReason::Integrity);
                    return Err(InboundError::Integrity { expected, actual });
                }
                _ => {}
            }
        }
        debug!(
            id = ?reassembler.id(),
            len = buffer.written(),
            "transmission delivered"
        );
        metrics::inc_completed();
        Ok(Some(buffer))
    }
}

fn reject_reason(rejection: Rejection) -> RejectReason {
    match rejection {
        Rejection::ForeignTransmission { .. } => RejectReason::Foreign,
        Rejection::Orphan => RejectReason::Orphan,
        Rejection::SequenceOutOfRange { .. } => RejectReason::Malformed,
    }
}
