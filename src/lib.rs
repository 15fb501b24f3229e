//! Line-flushing writers.
//!
//! [`LineFlushWriter`] wraps a [`Destination`] and forwards only complete,
//! `\n`-terminated lines to it. Several writers can share one [`SharedLock`]
//! to multiplex producers onto a single sink without tearing lines.
//!
//! ```
//! use lineflush::{LineFlushWriter, SharedBuffer, SharedLock};
//!
//! let sink = SharedBuffer::new();
//! let lock = SharedLock::new();
//!
//! let writer = LineFlushWriter::new(sink.clone(), lock.clone(), true);
//! writer.write(b"hello, ").unwrap();
//! assert!(sink.contents().is_empty());
//!
//! writer.write(b"world\nbye").unwrap();
//! assert_eq!(sink.contents(), b"hello, world\n");
//!
//! writer.close().unwrap();
//! assert_eq!(sink.contents(), b"hello, world\nbye\n");
//! ```

pub mod cliopt;
mod destination;
mod error;
mod lock;
pub mod runner;
mod writer;

pub use destination::{Destination, SharedBuffer};
pub use error::{Error, ErrorKind, Result};
pub use lock::{LockGuard, SharedLock};
pub use writer::LineFlushWriter;
