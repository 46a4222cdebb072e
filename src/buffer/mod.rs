//! Fixed-capacity staging buffer with a completion gate.
//!
//! [`StagedBuffer`] accumulates bytes until its declared capacity is reached.
//! Only then does it become readable: the forward-only read cursor can be
//! advanced with [`StagedBuffer::read`] or rewound with
//! [`StagedBuffer::reset_position`]. Writer and reader share a single store,
//! so a buffer completed by a transport callback is immediately readable by an
//! application thread.
//!
//! All state sits behind one mutex. Every method holds it only for the span
//! of a memory copy, never across I/O.

mod error;

#[cfg(not(loom))]
use std::sync::{Mutex, MutexGuard};
use std::sync::PoisonError;

use bytes::Bytes;
#[cfg(loom)]
use loom::sync::{Mutex, MutexGuard};
use tracing::trace;

pub use self::error::BufferError;
use crate::checksum::Checksum;

#[derive(Debug, Default)]
struct Stage {
    store: Vec<u8>,
    capacity: usize,
    cursor: usize,
    released: bool,
}

impl Stage {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Vec::new(),
            capacity,
            cursor: 0,
            released: false,
        }
    }

    fn written(&self) -> usize { self.store.len() }

    fn remaining(&self) -> usize { self.capacity - self.store.len() }

    fn is_completed(&self) -> bool { self.capacity > 0 && self.store.len() == self.capacity }

    fn ensure_readable(&self) -> Result<(), BufferError> {
        if self.is_completed() {
            Ok(())
        } else {
            Err(BufferError::NotReadable {
                written: self.written(),
                capacity: self.capacity,
            })
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let remaining = self.remaining();
        if data.len() > remaining {
            return Err(BufferError::CapacityExceeded {
                attempted: data.len(),
                remaining,
            });
        }
        self.store.extend_from_slice(data);
        if self.is_completed() {
            self.cursor = 0;
            trace!(capacity = self.capacity, "staged buffer completed");
        }
        Ok(())
    }
}

/// Thread-safe byte store that only becomes readable once full.
///
/// # Examples
///
/// ```
/// use wirepack::StagedBuffer;
///
/// let buffer = StagedBuffer::new(4);
/// buffer.append([1_u8, 2]).expect("room for two bytes");
/// assert!(buffer.read(2).is_err());
///
/// buffer.append([3_u8, 4]).expect("room for two more");
/// assert!(buffer.is_completed());
/// assert_eq!(buffer.read(3).expect("readable").as_deref(), Some(&[1, 2, 3][..]));
/// assert_eq!(buffer.read(3).expect("readable").as_deref(), Some(&[4][..]));
/// assert_eq!(buffer.read(3).expect("readable"), None);
/// ```
#[derive(Debug)]
pub struct StagedBuffer {
    stage: Mutex<Stage>,
}

impl StagedBuffer {
    /// Create an empty buffer that completes after `capacity` bytes.
    ///
    /// Storage grows as bytes are written, so the declared capacity is never
    /// allocated up front. A zero-capacity buffer is legal but can never
    /// become complete.
    #[must_use]
    pub fn new(capacity: usize) -> Self { Self::from_stage(Stage::with_capacity(capacity)) }

    /// Create a buffer of `capacity` bytes seeded with `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::CapacityExceeded`] when `initial` is longer than
    /// `capacity`.
    pub fn with_initial(capacity: usize, initial: impl AsRef<[u8]>) -> Result<Self, BufferError> {
        let mut stage = Stage::with_capacity(capacity);
        stage.write(initial.as_ref())?;
        Ok(Self::from_stage(stage))
    }

    /// Wrap bytes that already form a complete payload.
    ///
    /// The resulting capacity equals `bytes.len()`, so any non-empty input
    /// yields a buffer that is complete and readable from the start.
    #[must_use]
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self { Self::from_vec(bytes.as_ref().to_vec()) }

    /// Take ownership of `bytes` as a complete payload without copying.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::from_stage(Stage {
            capacity: bytes.len(),
            store: bytes,
            cursor: 0,
            released: false,
        })
    }

    fn from_stage(stage: Stage) -> Self {
        Self {
            stage: Mutex::new(stage),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Stage> {
        // Stage fields are only assigned after a copy succeeds.
        self.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self) -> Result<MutexGuard<'_, Stage>, BufferError> {
        let stage = self.lock();
        if stage.released {
            return Err(BufferError::Disposed);
        }
        Ok(stage)
    }

    /// Declared total size of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize { self.lock().capacity }

    /// Number of bytes written so far.
    #[must_use]
    pub fn written(&self) -> usize { self.lock().written() }

    /// Bytes that may still be written before the buffer completes.
    #[must_use]
    pub fn remaining(&self) -> usize { self.lock().remaining() }

    /// Whether every declared byte has been written.
    #[must_use]
    pub fn is_completed(&self) -> bool { self.lock().is_completed() }

    /// Whether [`release`](Self::release) has been called.
    #[must_use]
    pub fn is_released(&self) -> bool { self.lock().released }

    /// Copy `data` after the bytes already written.
    ///
    /// When this write completes the buffer, the read cursor is reset so the
    /// payload can be read immediately.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::CapacityExceeded`] when `data` does not fit in the
    /// remaining room, leaving the buffer untouched, or
    /// [`BufferError::Disposed`] once released.
    pub fn append(&self, data: impl AsRef<[u8]>) -> Result<(), BufferError> {
        self.live()?.write(data.as_ref())
    }

    /// Copy `data[offset..offset + length]` after the bytes already written.
    ///
    /// When `length` is `None` the rest of `data` from `offset` is copied.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for empty `data`,
    /// [`BufferError::OutOfBounds`] when the range does not lie within `data`,
    /// [`BufferError::CapacityExceeded`] when the range does not fit, and
    /// [`BufferError::Disposed`] once released.
    pub fn append_constrained(
        &self,
        data: impl AsRef<[u8]>,
        offset: usize,
        length: Option<usize>,
    ) -> Result<(), BufferError> {
        let mut stage = self.live()?;
        let data = data.as_ref();
        if data.is_empty() {
            return Err(BufferError::InvalidArgument("data must not be empty"));
        }
        let length = length.unwrap_or_else(|| data.len().saturating_sub(offset));
        let Some(range) = offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
        else {
            return Err(BufferError::OutOfBounds {
                offset,
                length,
                available: data.len(),
            });
        };
        stage.write(range)
    }

    /// Copy out every byte written so far, complete or not.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] once released.
    pub fn to_vec(&self) -> Result<Vec<u8>, BufferError> { Ok(self.live()?.store.clone()) }

    /// Snapshot the written bytes as an immutable [`Bytes`] handle.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] once released.
    pub fn snapshot(&self) -> Result<Bytes, BufferError> {
        Ok(Bytes::copy_from_slice(&self.live()?.store))
    }

    /// Read up to `length` bytes from the cursor, advancing it.
    ///
    /// Returns `Ok(None)` once the cursor has reached the end of the written
    /// data; call [`reset_position`](Self::reset_position) to read again.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotReadable`] before the buffer completes and
    /// [`BufferError::Disposed`] once released.
    pub fn read(&self, length: usize) -> Result<Option<Bytes>, BufferError> {
        let mut stage = self.live()?;
        stage.ensure_readable()?;
        let start = stage.cursor;
        let written = stage.written();
        if start >= written {
            return Ok(None);
        }
        let end = start + length.min(written - start);
        let chunk = Bytes::copy_from_slice(&stage.store[start..end]);
        stage.cursor = end;
        Ok(Some(chunk))
    }

    /// Rewind the read cursor to the first byte.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotReadable`] before the buffer completes and
    /// [`BufferError::Disposed`] once released.
    pub fn reset_position(&self) -> Result<(), BufferError> {
        let mut stage = self.live()?;
        stage.ensure_readable()?;
        stage.cursor = 0;
        Ok(())
    }

    /// Change the declared capacity.
    ///
    /// Shrinking below the written length truncates the payload and copies
    /// the retained bytes into a smaller store. Growing only raises the limit;
    /// the written bytes stay in place and the buffer reopens for writing. A
    /// resize that completes the buffer rewinds the cursor, so
    /// `resize(written())` turns a partial buffer into a readable one.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] once released.
    pub fn resize(&self, new_capacity: usize) -> Result<(), BufferError> {
        let mut stage = self.live()?;
        if new_capacity == stage.capacity {
            return Ok(());
        }
        let was_completed = stage.is_completed();
        if new_capacity < stage.written() {
            log::debug!(
                "truncating staged buffer from {} to {new_capacity} bytes",
                stage.written()
            );
            stage.store.truncate(new_capacity);
            stage.store.shrink_to(new_capacity);
        }
        stage.capacity = new_capacity;
        if stage.is_completed() && !was_completed {
            stage.cursor = 0;
        } else {
            stage.cursor = stage.cursor.min(stage.written());
        }
        Ok(())
    }

    /// Produce an independent copy with identical capacity and content.
    ///
    /// The copy starts with its cursor at the first byte.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] once released.
    pub fn try_clone(&self) -> Result<Self, BufferError> {
        let stage = self.live()?;
        Ok(Self::from_stage(Stage {
            store: stage.store.clone(),
            capacity: stage.capacity,
            cursor: 0,
            released: false,
        }))
    }

    /// Digest of exactly the bytes written so far.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] once released.
    pub fn checksum(&self) -> Result<Checksum, BufferError> {
        Ok(Checksum::of(&self.live()?.store))
    }

    /// Release the stored bytes. Every later operation reports
    /// [`BufferError::Disposed`]. Releasing twice is a no-op.
    pub fn release(&self) {
        let mut stage = self.lock();
        if !stage.released {
            *stage = Stage {
                released: true,
                ..Stage::default()
            };
        }
    }

    /// Consume the buffer, returning the written bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Disposed`] if the buffer was released.
    pub fn into_bytes(self) -> Result<Bytes, BufferError> {
        let mut stage = self.live()?;
        Ok(Bytes::from(std::mem::take(&mut stage.store)))
    }
}

#[cfg(all(test, not(loom)))]
mod tests;
