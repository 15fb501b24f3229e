use std::path::PathBuf;

use structopt::StructOpt;

use crate::error::{Error, Result};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "lineflush",
    about = "Copy inputs concurrently into one output without tearing lines"
)]
pub struct CliOpt {
    /// Input files; `-` (or no input at all) reads stdin.
    #[structopt(parse(from_os_str))]
    pub inputs: Vec<PathBuf>,

    /// Output file; stdout when omitted.
    #[structopt(long = "output", short = "o", parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Terminate a trailing partial line with a newline.
    #[structopt(long = "ensure-newline", short = "n")]
    pub ensure_newline: bool,

    /// Size of the chunks read from every input.
    #[structopt(
        long = "chunk-size",
        short = "c",
        default_value = "4096",
        parse(try_from_str = parse_chunk_size)
    )]
    pub chunk_size: usize,

    #[structopt(long = "verbose", short = "v")]
    pub verbose: bool,
}

fn parse_chunk_size(s: &str) -> Result<usize> {
    match s.parse::<usize>() {
        Ok(0) => Err(Error::from("chunk size must be positive")),
        Ok(size) => Ok(size),
        Err(e) => Err(("chunk size parsing failed", e).into()),
    }
}
