use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, warn};

use crate::cliopt::CliOpt;
use crate::destination::Destination;
use crate::error::{Error, ErrorKind, Result};
use crate::lock::SharedLock;
use crate::writer::LineFlushWriter;

// input 1 -> LineFlushWriter --\
// input 2 -> LineFlushWriter ---+-- SharedLock --> destination
// input N -> LineFlushWriter --/
//
// Every input is pumped by its own thread. Lines from different inputs may
// interleave, bytes within a line never do.

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn open(&self) -> Result<Box<dyn Read + Send>> {
        match self {
            Input::Stdin => Ok(Box::new(io::stdin())),
            Input::File(path) => match File::open(path) {
                Ok(file) => Ok(Box::new(file)),
                Err(e) => Err(Error::with_source(
                    ErrorKind::Input,
                    format!("cannot open input {}", path.display()),
                    e,
                )),
            },
        }
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        if path == Path::new("-") {
            Input::Stdin
        } else {
            Input::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Input::Stdin => write!(f, "<stdin>"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct Runner {
    inputs: Vec<Input>,
    ensure_newline: bool,
    chunk_size: usize,
}

impl Runner {
    /// Repeated stdin inputs collapse into the first one: two producers
    /// reading the same stdin would split its lines between two writers.
    pub fn new(inputs: Vec<Input>, ensure_newline: bool, chunk_size: usize) -> Self {
        let inputs = if inputs.is_empty() {
            vec![Input::Stdin]
        } else {
            dedup_stdin(inputs)
        };

        Self {
            inputs,
            ensure_newline,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_opt(opt: &CliOpt) -> Self {
        Self::new(
            opt.inputs.iter().map(|p| Input::from(p.as_path())).collect(),
            opt.ensure_newline,
            opt.chunk_size,
        )
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Pumps every input into its own writer. `destination` is called once
    /// per input and must hand out handles to the same physical sink.
    ///
    /// All producers run to completion; the first error encountered is
    /// returned.
    pub fn run<F, D>(&self, destination: F) -> Result<()>
    where
        F: Fn() -> D,
        D: Destination + Send,
    {
        let lock = SharedLock::new();

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .inputs
                .iter()
                .map(|input| {
                    let writer =
                        LineFlushWriter::new(destination(), lock.clone(), self.ensure_newline);
                    scope.spawn(move || pump(input, writer, self.chunk_size))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(Error::new(ErrorKind::Other, "producer thread panicked")),
                })
                .collect()
        });

        let mut first = None;
        for err in results.into_iter().filter_map(|r| r.err()) {
            if first.is_none() {
                first = Some(err);
            } else {
                warn!(error = %err, "producer failed");
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn dedup_stdin(inputs: Vec<Input>) -> Vec<Input> {
    let mut seen_stdin = false;
    let total = inputs.len();

    let inputs: Vec<_> = inputs
        .into_iter()
        .filter(|input| match input {
            Input::Stdin if seen_stdin => false,
            Input::Stdin => {
                seen_stdin = true;
                true
            }
            Input::File(_) => true,
        })
        .collect();

    if inputs.len() < total {
        debug!(dropped = total - inputs.len(), "ignoring repeated stdin inputs");
    }
    inputs
}

fn pump<D: Destination>(input: &Input, writer: LineFlushWriter<D>, chunk_size: usize) -> Result<()> {
    debug!(input = %input, "producer started");

    let copied = copy(input, &writer, chunk_size);
    let closed = writer.close();

    match copied {
        Ok(bytes) => {
            debug!(input = %input, bytes, "producer finished");
            closed
        }
        Err(err) => {
            if let Err(close_err) = closed {
                warn!(input = %input, error = %close_err, "writer close failed after input error");
            }
            Err(err)
        }
    }
}

fn copy<D: Destination>(
    input: &Input,
    writer: &LineFlushWriter<D>,
    chunk_size: usize,
) -> Result<usize> {
    let mut reader = input.open()?;
    let mut chunk = vec![0; chunk_size];
    let mut total = 0;

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break, // EOF
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::with_source(
                    ErrorKind::Input,
                    format!("cannot read input {}", input),
                    e,
                ))
            }
        };

        total += writer.write(&chunk[..n])?;
    }

    Ok(total)
}
