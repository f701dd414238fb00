use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mediathek_dl::config;
use mediathek_dl::error::MvdlError;
use mediathek_dl::mvweb::MvwebHttpClient;
use mediathek_dl::processor::{Disposition, RunMode};
use mediathek_dl::runner::JobRunner;
use mediathek_dl::transfer::{HttpTransferClient, format_bytes};

#[derive(Parser)]
#[command(name = "mediathek-dl")]
#[command(about = "Batch downloader for MediathekViewWeb saved queries")]
#[command(version, author)]
struct Cli {
    #[arg(long)]
    config: PathBuf,

    #[arg(long)]
    dry: bool,

    #[arg(long)]
    no_download: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<MvdlError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MvdlError) -> u8 {
    match error {
        MvdlError::ConfigRead(_) | MvdlError::ConfigParse(_) | MvdlError::ConfigFormat(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.dry {
        RunMode::DryRun
    } else if cli.no_download {
        RunMode::RecordOnly
    } else {
        RunMode::Download
    };

    let configs = config::load(&cli.config).into_diagnostic()?;
    let search = MvwebHttpClient::new().into_diagnostic()?;
    let transfer = HttpTransferClient::new().into_diagnostic()?;
    let runner = JobRunner::new(search, transfer, mode);

    for outcome in runner.run_all(&configs) {
        match outcome.result {
            Ok(report) => {
                let bytes: u64 = report
                    .items
                    .iter()
                    .filter_map(|item| match item.disposition {
                        Disposition::Downloaded { bytes, .. } => Some(bytes),
                        _ => None,
                    })
                    .sum();
                println!(
                    "{}: {} downloaded ({}), {} failed, {} results",
                    report.name,
                    report.downloaded(),
                    format_bytes(bytes),
                    report.failed(),
                    report.items.len()
                );
            }
            Err(_) => println!("{}: run failed (see log)", outcome.name),
        }
    }
    Ok(())
}
