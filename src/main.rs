use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use epi_sft::runner::{application, RunSettings};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// path to the simulator's output directory for this run
    #[arg(short, long, default_value = "output")]
    output_directory: PathBuf,

    /// path to the test's config.json
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// optional path to a campaign.json overlay
    #[arg(short = 'C', long)]
    campaign: Option<PathBuf>,

    /// override the report file name from the config
    #[arg(short, long)]
    report_name: Option<String>,

    /// override the simulator stdout log consumed by log-capture checks
    #[arg(short, long)]
    stdout_filename: Option<PathBuf>,

    /// log at debug level
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let settings = RunSettings {
        output_directory: args.output_directory,
        config: args.config,
        campaign: args.campaign,
        report_name: args.report_name,
        stdout_filename: args.stdout_filename,
    };

    // The report, not the exit status, carries the scientific verdict; a
    // non-zero exit means the harness itself broke.
    match application(&settings) {
        Ok(success) => info!("run complete; Success={success}"),
        Err(e) => {
            eprintln!("Error running scientific feature test: {e}");
            std::process::exit(1);
        }
    }
}
