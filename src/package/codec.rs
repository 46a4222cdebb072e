//! Wire encoding for packages.
//!
//! Every package is laid out as:
//!
//! ```text
//! Head:         [0x01][id: 5][package_count: u32 BE][checksum: 16][chunk ..]
//! Continuation: [0x02][id: 5][sequence: u32 BE][chunk ..]
//! ```
//!
//! The fixed header fields after the marker byte are encoded with `bincode`
//! using big-endian, fixed-width integers so the layout above holds byte for
//! byte. Everything after the header is the chunk.

use bincode::{
    Decode,
    Encode,
    config::{self, Config},
    decode_from_slice,
    encode_into_slice,
    error::EncodeError,
};
use bytes::{BufMut, Bytes, BytesMut};

use super::{DecodeError, PackageHeader, PackageKind, TransmissionId, id::ID_LEN};
use crate::checksum::{CHECKSUM_LEN, Checksum};

/// Bytes used by the kind marker.
pub const KIND_LEN: usize = 1;
/// Bytes used by the package count or sequence field.
pub const COUNTER_LEN: usize = std::mem::size_of::<u32>();
/// Fixed bytes preceding the chunk of a head package.
pub const HEAD_OVERHEAD: usize = KIND_LEN + ID_LEN + COUNTER_LEN + CHECKSUM_LEN;
/// Fixed bytes preceding the chunk of a continuation package.
pub const CONTINUATION_OVERHEAD: usize = KIND_LEN + ID_LEN + COUNTER_LEN;

impl PackageKind {
    /// Fixed header length, marker included, for packages of this kind.
    #[must_use]
    pub const fn overhead(self) -> usize {
        match self {
            Self::Head => HEAD_OVERHEAD,
            Self::Continuation => CONTINUATION_OVERHEAD,
        }
    }
}

#[derive(Encode, Decode)]
struct HeadFields {
    id: TransmissionId,
    package_count: u32,
    checksum: Checksum,
}

#[derive(Encode, Decode)]
struct ContinuationFields {
    id: TransmissionId,
    sequence: u32,
}

fn wire_config() -> impl Config {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

/// Serialise `header` followed by `chunk` into one transport unit.
///
/// # Errors
///
/// Returns an [`EncodeError`] if the header fields cannot be encoded.
pub fn encode_package(header: &PackageHeader, chunk: &[u8]) -> Result<Bytes, EncodeError> {
    let kind = header.kind();
    let mut fields = [0_u8; HEAD_OVERHEAD];
    let field_len = match *header {
        PackageHeader::Head {
            id,
            package_count,
            checksum,
        } => encode_into_slice(
            HeadFields {
                id,
                package_count,
                checksum,
            },
            &mut fields,
            wire_config(),
        )?,
        PackageHeader::Continuation { id, sequence } => encode_into_slice(
            ContinuationFields { id, sequence },
            &mut fields,
            wire_config(),
        )?,
    };
    if field_len != kind.overhead() - KIND_LEN {
        return Err(EncodeError::Other("package header length does not match wire layout"));
    }

    let mut packed = BytesMut::with_capacity(kind.overhead() + chunk.len());
    packed.put_u8(kind.marker());
    packed.put_slice(&fields[..field_len]);
    packed.put_slice(chunk);
    Ok(packed.freeze())
}

/// Split a transport unit into its header and chunk.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when `packed` is shorter than the
/// fixed header, [`DecodeError::UnknownKind`] for an unrecognised marker,
/// [`DecodeError::InvalidPackageCount`] for a head announcing zero packages,
/// and [`DecodeError::Header`] when the header fields are unreadable.
pub fn decode_package(packed: &[u8]) -> Result<(PackageHeader, &[u8]), DecodeError> {
    let Some((&marker, rest)) = packed.split_first() else {
        return Err(DecodeError::Truncated {
            length: 0,
            required: KIND_LEN,
        });
    };
    let kind = PackageKind::try_from(marker)?;
    let required = kind.overhead();
    if packed.len() < required {
        return Err(DecodeError::Truncated {
            length: packed.len(),
            required,
        });
    }

    let fields = &rest[..required - KIND_LEN];
    let (header, consumed) = match kind {
        PackageKind::Head => {
            let (fields, consumed) = decode_from_slice::<HeadFields, _>(fields, wire_config())?;
            if fields.package_count == 0 {
                return Err(DecodeError::InvalidPackageCount);
            }
            let header = PackageHeader::Head {
                id: fields.id,
                package_count: fields.package_count,
                checksum: fields.checksum,
            };
            (header, consumed)
        }
        PackageKind::Continuation => {
            let (fields, consumed) =
                decode_from_slice::<ContinuationFields, _>(fields, wire_config())?;
            let header = PackageHeader::Continuation {
                id: fields.id,
                sequence: fields.sequence,
            };
            (header, consumed)
        }
    };
    if consumed != required - KIND_LEN {
        return Err(DecodeError::HeaderLength {
            expected: required - KIND_LEN,
            found: consumed,
        });
    }

    Ok((header, &rest[consumed..]))
}
