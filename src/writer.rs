use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::destination::Destination;
use crate::error::{Error, ErrorKind, Result};
use crate::lock::SharedLock;

/// Forwards only complete lines to its destination.
///
/// Every `write` appends to an internal buffer and then, while holding the
/// shared lock, hands everything up to the last `\n` to the destination in a
/// single `write_all`. The trailing partial line stays buffered until a later
/// write completes it or the writer is closed. Writers sharing one
/// [`SharedLock`] never tear each other's lines on a common destination.
///
/// Dropping a writer without calling [`close`](Self::close) discards the
/// buffered partial line.
pub struct LineFlushWriter<D: Destination> {
    lock: SharedLock,
    // Only ever locked while `lock` is held.
    state: Mutex<State<D>>,
    ensure_newline: bool,
}

struct State<D> {
    buffer: Vec<u8>,
    destination: D,
}

impl<D: Destination> LineFlushWriter<D> {
    pub fn new(destination: D, lock: SharedLock, ensure_newline: bool) -> Self {
        Self {
            lock,
            state: Mutex::new(State {
                buffer: Vec::new(),
                destination,
            }),
            ensure_newline,
        }
    }

    pub fn with_own_lock(destination: D, ensure_newline: bool) -> Self {
        Self::new(destination, SharedLock::new(), ensure_newline)
    }

    #[inline]
    pub fn ensure_newline(&self) -> bool {
        self.ensure_newline
    }

    #[inline]
    pub fn lock(&self) -> &SharedLock {
        &self.lock
    }

    /// Number of bytes of the pending partial line.
    pub fn buffered(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.buffer.len(),
            Err(poisoned) => poisoned.into_inner().buffer.len(),
        }
    }

    /// Accepts `data` in full and forwards every line it completes.
    ///
    /// Returns `data.len()` on success. Empty input is a no-op that does not
    /// touch the lock or the destination.
    ///
    /// The completed lines go out through a single `write_all`, so a
    /// destination that accepts short writes may see several `write` calls
    /// for them, all made while the lock is still held.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock.acquire()?;
        let mut state = self.state()?;

        state.append(data)?;
        state.forward_complete_lines()?;

        Ok(data.len())
    }

    /// Flushes the destination. The pending partial line is not forwarded.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.lock.acquire()?;
        let mut state = self.state()?;

        state
            .destination
            .flush()
            .map_err(|e| Error::with_source(ErrorKind::Write, "failed to flush destination", e))
    }

    /// Forwards the pending partial line, if any, and closes the destination.
    ///
    /// With `ensure_newline` set, a pending line that lacks a trailing `\n`
    /// gets one. The destination is closed even when the final write fails;
    /// the write error is the one returned in that case.
    pub fn close(mut self) -> Result<()> {
        let _guard = self.lock.acquire()?;
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(_) => return Err(Error::new(ErrorKind::Lock, "writer state is poisoned")),
        };

        debug!(
            pending = state.buffer.len(),
            ensure_newline = self.ensure_newline,
            "closing line flush writer"
        );

        let flushed = state.forward_remainder(self.ensure_newline);
        let closed = state
            .destination
            .close()
            .map_err(|e| Error::with_source(ErrorKind::Close, "failed to close destination", e));

        match (flushed, closed) {
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "destination close failed after final write failure");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), closed) => closed,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State<D>>> {
        self.state
            .lock()
            .map_err(|_| Error::new(ErrorKind::Lock, "writer state is poisoned"))
    }
}

impl<D: Destination> State<D> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.buffer
            .try_reserve(data.len())
            .map_err(|e| Error::with_source(ErrorKind::Buffer, "failed to grow line buffer", e))?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn forward_complete_lines(&mut self) -> Result<()> {
        match self.buffer.iter().rposition(|&b| b == b'\n') {
            Some(last) => self.forward(last + 1),
            None => Ok(()),
        }
    }

    fn forward_remainder(&mut self, ensure_newline: bool) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        if ensure_newline && !self.buffer.ends_with(b"\n") {
            self.append(b"\n")?;
        }

        self.forward(self.buffer.len())
    }

    // On failure the bytes stay in the buffer; nothing is retried.
    fn forward(&mut self, end: usize) -> Result<()> {
        self.destination
            .write_all(&self.buffer[..end])
            .map_err(|e| Error::with_source(ErrorKind::Write, "failed to write to destination", e))?;
        self.buffer.drain(..end);

        trace!(bytes = end, pending = self.buffer.len(), "forwarded lines");
        Ok(())
    }
}

impl<D: Destination> Drop for LineFlushWriter<D> {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if !state.buffer.is_empty() {
                debug!(
                    discarded = state.buffer.len(),
                    "line flush writer dropped without close"
                );
            }
        }
    }
}

impl<D: Destination> Write for LineFlushWriter<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(LineFlushWriter::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(LineFlushWriter::flush(self)?)
    }
}

impl<D: Destination> Write for &LineFlushWriter<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(LineFlushWriter::write(*self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(LineFlushWriter::flush(*self)?)
    }
}
