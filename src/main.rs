use std::fs::File;
use std::io;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use lineflush::cliopt::CliOpt;
use lineflush::runner::Runner;
use lineflush::Error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = CliOpt::from_args();

    init_logging(opt.verbose);

    let runner = Runner::from_opt(&opt);

    match &opt.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::from((format!("cannot create output {}", path.display()), e))
            })?;
            runner.run(|| &file)?;
        }
        None => runner.run(io::stdout)?,
    }

    Ok(())
}

// RUST_LOG wins over --verbose.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
