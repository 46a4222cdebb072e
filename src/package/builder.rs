//! Outbound helper that splits a staged payload into a package chain.
//!
//! [`PackageBuilder`] snapshots a [`StagedBuffer`], digests it once, and cuts
//! it into chunks of at most the configured size. The first chunk travels in
//! a head package alongside the transmission metadata; every later chunk
//! travels in a continuation carrying its sequence index. Each package is
//! packed eagerly, so handing it to a transport is a cheap [`Bytes`] clone.

use std::num::NonZeroUsize;

use bytes::Bytes;
use rand::Rng;
use tracing::debug;

use super::{
    BuildError,
    PackageConfig,
    PackageHeader,
    TransmissionId,
    codec::encode_package,
    config::DATAGRAM_CHUNK,
};
use crate::{buffer::StagedBuffer, checksum::Checksum};

/// Splits staged payloads into package chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackageBuilder {
    chunk_size: NonZeroUsize,
}

impl PackageBuilder {
    /// Create a builder that caps each chunk at `chunk_size` bytes.
    #[must_use]
    pub const fn new(chunk_size: NonZeroUsize) -> Self { Self { chunk_size } }

    /// Create a builder from a raw chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidChunkSize`] when `chunk_size` is zero.
    pub fn with_chunk_size(chunk_size: usize) -> Result<Self, BuildError> {
        NonZeroUsize::new(chunk_size)
            .map(Self::new)
            .ok_or(BuildError::InvalidChunkSize)
    }

    /// Create a builder using the default datagram chunk size.
    #[must_use]
    pub const fn datagram() -> Self { Self::new(DATAGRAM_CHUNK) }

    /// Create a builder from transport configuration.
    #[must_use]
    pub const fn from_config(config: &PackageConfig) -> Self { Self::new(config.chunk_size) }

    /// Maximum chunk length in bytes.
    #[must_use]
    pub const fn chunk_size(&self) -> NonZeroUsize { self.chunk_size }

    /// Build a chain for the bytes written to `source`, under a fresh
    /// identifier.
    ///
    /// The source is read through a snapshot; its cursor and contents are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Buffer`] if `source` was released,
    /// [`BuildError::TooManyPackages`] if the package count overflows `u32`,
    /// and [`BuildError::Encode`] if a header fails to encode.
    pub fn build(&self, source: &StagedBuffer) -> Result<PackageChain, BuildError> {
        self.build_with_id(source, TransmissionId::generate())
    }

    /// Build a chain, drawing the identifier from `rng`.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_rng<R: Rng>(
        &self,
        source: &StagedBuffer,
        rng: &mut R,
    ) -> Result<PackageChain, BuildError> {
        self.build_with_id(source, TransmissionId::generate_with(rng))
    }

    /// Build a chain tagged with `id`.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_id(
        &self,
        source: &StagedBuffer,
        id: TransmissionId,
    ) -> Result<PackageChain, BuildError> {
        let payload = source.snapshot()?;
        self.build_payload(id, payload)
    }

    fn build_payload(&self, id: TransmissionId, payload: Bytes) -> Result<PackageChain, BuildError> {
        let chunk_size = self.chunk_size.get();
        let count = payload.len().div_ceil(chunk_size).max(1);
        let package_count =
            u32::try_from(count).map_err(|_| BuildError::TooManyPackages { count })?;
        let checksum = Checksum::of(&payload);

        let mut packages = Vec::with_capacity(count);
        for sequence in 0..package_count {
            let start = chunk_size * packages.len();
            let end = (start + chunk_size).min(payload.len());
            let chunk = payload.slice(start.min(end)..end);
            let header = if sequence == 0 {
                PackageHeader::Head {
                    id,
                    package_count,
                    checksum,
                }
            } else {
                PackageHeader::Continuation { id, sequence }
            };
            packages.push(Package::new(header, chunk)?);
        }

        debug!(
            %id,
            package_count,
            chunk_size,
            payload_len = payload.len(),
            "built package chain"
        );
        Ok(PackageChain::new(id, checksum, packages))
    }
}

/// One wire-ready package: a header plus a chunk of the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    header: PackageHeader,
    chunk: Bytes,
    packed: Bytes,
}

impl Package {
    /// Encode `header` and `chunk` into a package.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Encode`] if the header fails to encode.
    pub fn new(header: PackageHeader, chunk: Bytes) -> Result<Self, BuildError> {
        let packed = encode_package(&header, &chunk)?;
        Ok(Self {
            header,
            chunk,
            packed,
        })
    }

    /// Package metadata.
    #[must_use]
    pub const fn header(&self) -> &PackageHeader { &self.header }

    /// Transmission this package belongs to.
    #[must_use]
    pub const fn id(&self) -> TransmissionId { self.header.id() }

    /// Position of this package's chunk in the payload.
    #[must_use]
    pub const fn sequence(&self) -> u32 { self.header.sequence() }

    /// Whether this is the head package.
    #[must_use]
    pub const fn is_head(&self) -> bool { self.header.is_head() }

    /// Payload bytes carried by this package.
    #[must_use]
    pub fn chunk(&self) -> &[u8] { &self.chunk }

    /// Serialised bytes to hand to a transport as one unit.
    #[must_use]
    pub fn pack(&self) -> Bytes { self.packed.clone() }
}

/// Ordered packages of one transmission, head first.
///
/// The chain stands in for a linked list: [`next_of`](Self::next_of)
/// follows the build order and returns `None` after the last package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageChain {
    id: TransmissionId,
    checksum: Checksum,
    packages: Vec<Package>,
}

impl PackageChain {
    fn new(id: TransmissionId, checksum: Checksum, packages: Vec<Package>) -> Self {
        debug_assert!(!packages.is_empty(), "package chains must hold a head");
        Self {
            id,
            checksum,
            packages,
        }
    }

    /// Identifier shared by every package in the chain.
    #[must_use]
    pub const fn id(&self) -> TransmissionId { self.id }

    /// Digest of the whole payload, as carried by the head.
    #[must_use]
    pub const fn checksum(&self) -> Checksum { self.checksum }

    /// Number of packages, head included.
    #[expect(
        clippy::len_without_is_empty,
        reason = "chains always contain a head package"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.packages.len() }

    /// The head package.
    #[must_use]
    pub fn head(&self) -> &Package { &self.packages[0] }

    /// Package at `sequence`, if any.
    #[must_use]
    pub fn get(&self, sequence: u32) -> Option<&Package> {
        usize::try_from(sequence)
            .ok()
            .and_then(|index| self.packages.get(index))
    }

    /// Package following `package` in build order, or `None` at the end.
    #[must_use]
    pub fn next_of(&self, package: &Package) -> Option<&Package> {
        package
            .sequence()
            .checked_add(1)
            .and_then(|next| self.get(next))
    }

    /// Iterate over packages in build order.
    pub fn iter(&self) -> std::slice::Iter<'_, Package> { self.packages.iter() }

    /// Iterate over packed transport units in build order.
    pub fn packed(&self) -> impl Iterator<Item = Bytes> + '_ { self.packages.iter().map(Package::pack) }

    /// Consume the chain, returning its packages.
    #[must_use]
    pub fn into_packages(self) -> Vec<Package> { self.packages }
}

impl IntoIterator for PackageChain {
    type Item = Package;
    type IntoIter = std::vec::IntoIter<Package>;

    fn into_iter(self) -> Self::IntoIter { self.packages.into_iter() }
}

impl<'a> IntoIterator for &'a PackageChain {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter { self.packages.iter() }
}
