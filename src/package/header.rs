//! Per-package metadata carried ahead of each chunk.

use super::{DecodeError, TransmissionId};
use crate::checksum::Checksum;

/// Marker byte distinguishing head packages from continuations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PackageKind {
    /// First package of a transmission, carrying its metadata.
    Head = 0x01,
    /// Any later package, carrying a sequence index.
    Continuation = 0x02,
}

impl PackageKind {
    /// Return the on-wire marker byte.
    #[must_use]
    pub const fn marker(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for PackageKind {
    type Error = DecodeError;

    fn try_from(marker: u8) -> Result<Self, Self::Error> {
        match marker {
            0x01 => Ok(Self::Head),
            0x02 => Ok(Self::Continuation),
            other => Err(DecodeError::UnknownKind(other)),
        }
    }
}

/// Metadata describing a single package.
///
/// # Examples
///
/// ```
/// use wirepack::{Checksum, PackageHeader, PackageKind, TransmissionId};
/// let id = TransmissionId::new(*b"abcde");
/// let head = PackageHeader::Head {
///     id,
///     package_count: 3,
///     checksum: Checksum::of(b"payload"),
/// };
/// assert_eq!(head.kind(), PackageKind::Head);
/// assert_eq!(head.sequence(), 0);
///
/// let next = PackageHeader::Continuation { id, sequence: 2 };
/// assert_eq!(next.id(), id);
/// assert_eq!(next.sequence(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackageHeader {
    /// Head package metadata.
    Head {
        id: TransmissionId,
        /// Number of packages in the transmission, head included.
        package_count: u32,
        /// Digest of the whole, unfragmented payload.
        checksum: Checksum,
    },
    /// Continuation package metadata.
    Continuation {
        id: TransmissionId,
        /// Zero-based position of the chunk; never zero for a continuation.
        sequence: u32,
    },
}

impl PackageHeader {
    /// Kind marker for this header.
    #[must_use]
    pub const fn kind(&self) -> PackageKind {
        match self {
            Self::Head { .. } => PackageKind::Head,
            Self::Continuation { .. } => PackageKind::Continuation,
        }
    }

    /// Transmission the package belongs to.
    #[must_use]
    pub const fn id(&self) -> TransmissionId {
        match self {
            Self::Head { id, .. } | Self::Continuation { id, .. } => *id,
        }
    }

    /// Position of the package's chunk; the head always holds index zero.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        match self {
            Self::Head { .. } => 0,
            Self::Continuation { sequence, .. } => *sequence,
        }
    }

    /// Whether this is a head package.
    #[must_use]
    pub const fn is_head(&self) -> bool { matches!(self, Self::Head { .. }) }
}
