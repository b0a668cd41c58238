#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{error, process, time::Duration};

mod app;
mod commands;
mod interact;

use commands::Commands;

use clap::{Args, Parser};
use log::trace;
use shelf::FetchConfig;

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{}", err);
        process::exit(2);
    }
}

fn try_main() -> Result<(), Box<dyn error::Error>> {
    let Cli {
        command,
        global_opts:
            GlobalOpts {
                endpoint,
                timeout,
                verbosity,
                quiet,
            },
    } = Cli::parse();

    setup_errlog(verbosity as usize, quiet)?;

    let config = FetchConfig {
        endpoint,
        timeout: Duration::from_secs(timeout),
        ..FetchConfig::default()
    };
    trace!("Using {config:?}");

    let message = command.execute(config)?;
    if !message.is_empty() {
        println!("{message}");
    }
    Ok(())
}

fn setup_errlog(verbosity: usize, quiet: bool) -> Result<(), Box<dyn error::Error>> {
    // if quiet then ignore verbosity but still show errors
    let verbosity = if quiet { 0 } else { verbosity + 1 };

    stderrlog::new().verbosity(verbosity).init()?;
    Ok(())
}

#[derive(Parser)]
#[clap(name = "shelf")]
#[clap(about = "Fetch, browse, edit and export book metadata from a public catalog")]
#[clap(version, author)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    global_opts: GlobalOpts,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Base URL of the subject catalog
    #[clap(
        long,
        global = true,
        default_value = "https://openlibrary.org/subjects"
    )]
    endpoint: String,

    /// Seconds to wait for a single catalog request
    #[clap(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbosity: u8,

    /// Only errors are logged, regardless of verbosity.
    #[clap(short, long, global = true)]
    quiet: bool,
}
