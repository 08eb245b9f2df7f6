// gminfo command line entry point
// Summarizes the strong-motion records found under a directory

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use groundmotion::summary::{
    render_concise, render_errors, render_verbose, summarize_files, walk_files, write_catalog,
};

#[derive(Parser, Debug)]
#[command(name = "gminfo")]
#[command(version)]
#[command(
    about = "Display summary information about directories of files containing strong motion data",
    long_about = "Display summary information about a directory of files containing strong motion data.\n\nUse --quiet-errors to hide files that could not be read.\nUse -s to save concise results and errors to CSV."
)]
struct Cli {
    /// Directory to inspect.
    dir: PathBuf,

    /// Print one row per channel: Filename, Format, Process Level, Start Time,
    /// End Time, Duration, Network, Station, Channel, Sampling Rate, Latitude,
    /// Longitude.
    #[arg(short, long)]
    concise: bool,

    /// Save concise results to a CSV file; errors go to <stem>_errors<ext>.
    #[arg(short, long, value_name = "OUTFILE")]
    save: Option<PathBuf>,

    /// Do not print the list of files that could not be read.
    #[arg(short, long)]
    quiet_errors: bool,

    /// Log level (overridden by RUST_LOG).
    #[arg(short, long, default_value = "warn", env = "GMINFO_LOG_LEVEL")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    let files = match walk_files(&cli.dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !cli.concise {
        if cli.save.is_some() {
            log::warn!("--save only applies to concise output; ignoring");
        }
        let (listing, errors) = render_verbose(&files);
        print!("{}", listing);
        if !cli.quiet_errors && !errors.is_empty() {
            println!();
            print!("{}", render_errors(&errors));
        }
        return ExitCode::SUCCESS;
    }

    let (rows, errors) = summarize_files(&files);

    match &cli.save {
        Some(outfile) => match write_catalog(outfile, &rows, &errors) {
            Ok(errfile) => {
                println!("Catalog written to {}.", outfile.display());
                println!("Errors written to {}.", errfile.display());
            }
            Err(e) => {
                eprintln!("Failed to write catalog: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            print!("{}", render_concise(&rows));
            if !cli.quiet_errors && !errors.is_empty() {
                println!();
                print!("{}", render_errors(&errors));
            }
        }
    }

    ExitCode::SUCCESS
}
