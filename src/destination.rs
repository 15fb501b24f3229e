use std::fs::File;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// A sink that accepts bytes and can be closed explicitly.
///
/// Most std writers release their resources on drop, so the default `close`
/// only flushes. Implement it for sinks that need an explicit shutdown.
pub trait Destination: Write {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Destination for io::Stdout {}

impl Destination for io::Stderr {}

impl Destination for io::Sink {}

impl Destination for File {}

impl Destination for &File {}

impl Destination for Vec<u8> {}

impl<D: Destination + ?Sized> Destination for Box<D> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<D: Destination + ?Sized> Destination for &mut D {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// In-memory destination whose clones all append to the same buffer.
///
/// Besides the bytes themselves it remembers every individual write call and
/// how many times it was closed, which is what callers capturing the output
/// of several writers usually want to inspect.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Recorded>>,
}

#[derive(Debug, Default)]
struct Recorded {
    writes: Vec<Vec<u8>>,
    closed: usize,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bytes received so far, in arrival order.
    pub fn contents(&self) -> Vec<u8> {
        self.recorded().writes.concat()
    }

    /// The individual write calls received so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.recorded().writes.clone()
    }

    pub fn close_count(&self) -> usize {
        self.recorded().closed
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        // A panic while holding this mutex cannot leave `Recorded` half-updated.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.recorded().writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Destination for SharedBuffer {
    fn close(&mut self) -> io::Result<()> {
        self.recorded().closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_buffer_clones_see_the_same_writes() {
        let buffer = SharedBuffer::new();
        let mut a = buffer.clone();
        let mut b = buffer.clone();

        a.write_all(b"one\n").unwrap();
        b.write_all(b"two\n").unwrap();
        a.close().unwrap();

        assert_eq!(buffer.contents(), b"one\ntwo\n");
        assert_eq!(buffer.writes(), vec![b"one\n".to_vec(), b"two\n".to_vec()]);
        assert_eq!(buffer.close_count(), 1);
    }

    #[test]
    fn boxed_destination_forwards_close() {
        let buffer = SharedBuffer::new();
        let mut boxed: Box<dyn Destination> = Box::new(buffer.clone());

        boxed.close().unwrap();
        assert_eq!(buffer.close_count(), 1);
    }
}
