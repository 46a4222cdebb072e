//! Whole-payload integrity digests.
//!
//! A [`Checksum`] is the 16-byte MD5 digest carried by every head package.
//! It detects corruption across an entire reassembled payload; it is not a
//! per-chunk check and offers no protection against a deliberate forger.

use std::fmt;

use bincode::{Decode, Encode};
use md5::{Digest, Md5};

/// Length in bytes of an encoded [`Checksum`].
pub const CHECKSUM_LEN: usize = 16;

/// Digest of the bytes written into a buffer.
///
/// # Examples
///
/// ```
/// use wirepack::Checksum;
/// let a = Checksum::of(b"Hello World.");
/// let b = Checksum::of(b"Hello World.");
/// assert_eq!(a, b);
/// assert_ne!(a, Checksum::of(b"Hello World!"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    /// Compute the digest of `data`.
    #[must_use]
    pub fn of(data: impl AsRef<[u8]>) -> Self { Self(Md5::digest(data.as_ref()).into()) }

    /// Wrap raw digest bytes, typically decoded from a head package.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHECKSUM_LEN]) -> Self { Self(bytes) }

    /// Borrow the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] { &self.0 }
}

impl AsRef<[u8]> for Checksum {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({self})")
    }
}
