//! [`OutputLedger`], the append-only capture buffer with a consume cursor.

use crate::error::SeekError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    buffer: Vec<u8>,
    cursor: usize,
}

/// Everything a child has written so far, plus the boundary between bytes
/// already consumed by `expect` and bytes not yet examined.
///
/// Clones share the same buffer. Every operation takes the same lock, copies
/// what it needs and releases it, so a caller never observes a view that a
/// later append could change.
#[derive(Debug, Clone, Default)]
pub struct OutputLedger {
    inner: Arc<Mutex<Inner>>,
}

impl OutputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends and seeks are single statements, so a panic elsewhere cannot
    // leave the state half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append captured bytes to the end of the buffer.
    pub fn append(&self, data: &[u8]) {
        self.lock().buffer.extend_from_slice(data);
    }

    /// Copy of the unconsumed bytes, from the cursor to the end.
    pub fn peek(&self) -> Vec<u8> {
        let inner = self.lock();
        inner.buffer[inner.cursor..].to_vec()
    }

    /// Advance the cursor by exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// Fails without moving the cursor if `n` exceeds the unconsumed length.
    pub fn seek(&self, n: usize) -> Result<(), SeekError> {
        let mut inner = self.lock();
        let available = inner.buffer.len() - inner.cursor;
        if n > available {
            return Err(SeekError::OutOfRange {
                requested: n,
                available,
            });
        }
        inner.cursor += n;
        Ok(())
    }

    /// Copy of the entire buffer, consumed and unconsumed.
    pub fn dump(&self) -> Vec<u8> {
        self.lock().buffer.clone()
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }
}
