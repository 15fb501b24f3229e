use std::io;
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion};

use lineflush::{LineFlushWriter, SharedLock};

const THREADS: usize = 4;
const WRITES_PER_THREAD: usize = 256;

/// Several threads hammering one writer with chunks that complete one line
/// and start the next.
fn bench_parallel_write(c: &mut Criterion) {
    let data = b"partial\nwrite";

    c.bench_function("parallel_write", |b| {
        b.iter(|| {
            let writer = Arc::new(LineFlushWriter::with_own_lock(io::sink(), true));
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let writer = Arc::clone(&writer);
                    thread::spawn(move || {
                        for _ in 0..WRITES_PER_THREAD {
                            writer.write(data).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

/// One writer per producer, all sharing a lock, each emitting a line in two
/// halves.
fn bench_atomic_lines(c: &mut Criterion) {
    c.bench_function("atomic_lines", |b| {
        b.iter(|| {
            let lock = SharedLock::new();
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let writer = LineFlushWriter::new(io::sink(), lock.clone(), true);
                    thread::spawn(move || {
                        for _ in 0..WRITES_PER_THREAD {
                            writer.write(b"12345").unwrap();
                            writer.write(b"6789\n").unwrap();
                        }
                        writer.close().unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_parallel_write, bench_atomic_lines);
criterion_main!(benches);
