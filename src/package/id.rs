//! Short identifiers binding the packages of one transmission.

use std::fmt;

use bincode::{Decode, Encode};
use derive_more::{From, Into};
use rand::{Rng, distributions::Alphanumeric};

/// Encoded length of a [`TransmissionId`].
pub const ID_LEN: usize = 5;

/// Opaque identifier shared by every package of one transmission.
///
/// Identifiers are drawn from the ASCII alphanumeric alphabet and compared
/// byte for byte.
///
/// # Examples
///
/// ```
/// use wirepack::TransmissionId;
/// let id = TransmissionId::new(*b"Ab3xZ");
/// assert_eq!(id.to_string(), "Ab3xZ");
/// assert_eq!(id, "Ab3xZ");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, From, Into)]
pub struct TransmissionId([u8; ID_LEN]);

impl TransmissionId {
    /// Wrap raw identifier bytes.
    #[must_use]
    pub const fn new(bytes: [u8; ID_LEN]) -> Self { Self(bytes) }

    /// Generate a fresh identifier from the thread-local generator.
    #[must_use]
    pub fn generate() -> Self { Self::generate_with(&mut rand::thread_rng()) }

    /// Generate a fresh identifier from `rng`.
    ///
    /// Supplying a seeded generator makes identifiers reproducible.
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        let mut bytes = [0_u8; ID_LEN];
        for byte in &mut bytes {
            *byte = rng.sample(Alphanumeric);
        }
        Self(bytes)
    }

    /// Borrow the identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] { &self.0 }
}

impl fmt::Display for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", char::from(byte).escape_default())?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransmissionId({self})")
    }
}

impl PartialEq<[u8]> for TransmissionId {
    fn eq(&self, other: &[u8]) -> bool { self.0.as_slice() == other }
}

impl PartialEq<&str> for TransmissionId {
    fn eq(&self, other: &&str) -> bool { self.0.as_slice() == other.as_bytes() }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn generated_ids_are_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let id = TransmissionId::generate_with(&mut rng);
            assert!(id.as_bytes().iter().all(u8::is_ascii_alphanumeric));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let first = TransmissionId::generate_with(&mut StdRng::seed_from_u64(42));
        let second = TransmissionId::generate_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn compares_against_raw_bytes() {
        let id = TransmissionId::new(*b"abcde");
        assert!(id == *b"abcde".as_slice());
        assert!(id != *b"abcdf".as_slice());
    }
}
