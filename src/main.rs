use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use signoff::config::SignoffConfig;
use signoff::events::summarize_records;
use signoff::report::{write_report, ReportFlavor};
use signoff::source::export::ExportSource;
use signoff::source::remote::RemoteSource;
use signoff::source::EventSource;

#[derive(Parser)]
#[command(name = "signoff")]
#[command(about = "Approval-cycle latency and rework reports for tracked work items")]
#[command(long_about = "Signoff reconstructs the approval history of tracked work items from \
                       their review notices and reports first-approval latency, rejection \
                       counts, and rework per item. Point it at a tracker export with \
                       'signoff export' or at the tracker API with 'signoff remote'.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report from a pre-exported tracker dump
    Export {
        /// Path to the exported CSV dump
        #[arg(long, default_value = "cenpro.csv")]
        file: PathBuf,
        /// Only include events dated in this year
        #[arg(long, help = "Overrides report.target_year from configuration")]
        year: Option<i32>,
        /// Include the rework classification columns
        #[arg(long)]
        rework: bool,
        /// Write the report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Build the report straight from the tracker API
    Remote {
        /// Only include events dated in this year
        #[arg(long, help = "Overrides report.target_year from configuration")]
        year: Option<i32>,
        /// Include the rework classification columns
        #[arg(long)]
        rework: bool,
        /// Write the report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    signoff::init_telemetry()?;

    match cli.command {
        // Default behavior: no subcommand - explain how to get a report
        None => {
            show_usage();
            Ok(())
        }
        Some(Commands::Export {
            file,
            year,
            rework,
            output,
        }) => tokio::runtime::Runtime::new()?
            .block_on(async { export_command(file, year, rework, output).await }),
        Some(Commands::Remote {
            year,
            rework,
            output,
        }) => tokio::runtime::Runtime::new()?
            .block_on(async { remote_command(year, rework, output).await }),
    }
}

async fn export_command(
    file: PathBuf,
    year: Option<i32>,
    rework: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = signoff::config()?;
    let target_year = year.unwrap_or(config.report.target_year);
    let source = ExportSource::new(file, config.export.columns.clone(), target_year);
    run_report(&source, flavor(config, rework), output).await
}

async fn remote_command(year: Option<i32>, rework: bool, output: Option<PathBuf>) -> Result<()> {
    let config = signoff::config()?;
    let target_year = year.unwrap_or(config.report.target_year);
    let source = RemoteSource::new(&config.tracker, Some(target_year))?;
    run_report(&source, flavor(config, rework), output).await
}

fn flavor(config: &SignoffConfig, rework_flag: bool) -> ReportFlavor {
    if rework_flag || config.report.include_rework {
        ReportFlavor::Rework
    } else {
        ReportFlavor::Standard
    }
}

async fn run_report(
    source: &dyn EventSource,
    flavor: ReportFlavor,
    output: Option<PathBuf>,
) -> Result<()> {
    let records = source.fetch_all_raw_records().await?;
    let summaries = summarize_records(&records);

    match output {
        Some(path) => {
            let file = File::create(&path)?;
            write_report(file, &summaries, flavor)?;
            tracing::info!(rows = summaries.len(), path = %path.display(), "report written");
        }
        None => {
            write_report(io::stdout().lock(), &summaries, flavor)?;
            tracing::info!(rows = summaries.len(), "report written");
        }
    }
    Ok(())
}

fn show_usage() {
    println!("📋 Signoff - approval-cycle reporting");
    println!();
    println!("To build a report:");
    println!("  📄 signoff export --file dump.csv   # From a tracker export");
    println!("  🌐 signoff remote                   # Straight from the tracker API");
    println!();
    println!("Useful flags:");
    println!("  --rework          Include the rework classification columns");
    println!("  --year <YYYY>     Restrict to events dated in one year");
    println!("  --output <path>   Write somewhere other than stdout");
    println!();
    println!("💡 Start with 'signoff export --file <dump>' if you have an export handy!");
}
