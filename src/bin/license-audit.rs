//! CLI tool for auditing npm dependency licenses

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use license_audit::report::{
    render, render_summary, write_report, ReportFormat, STDOUT_OUTPUT,
};
use license_audit::{audit_project, find_config, load_config, AuditReport, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "license-audit")]
#[command(about = "Audit the licenses of a project's npm dependencies", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the project to audit (directory containing package-lock.json)
    #[arg(short = 'p', long, global = true, default_value = ".")]
    project_path: PathBuf,

    /// Path to the configuration file (default: <project>/.licenses.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Fall back to LICENSE files when package metadata has no license
    #[arg(long, global = true)]
    relaxed: bool,

    /// Packages to ignore (can be specified multiple times)
    #[arg(long = "ignore", global = true)]
    ignore_packages: Vec<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print failed packages and exit non-zero if there are any
    Check,

    /// Generate a machine-readable report
    Report {
        /// Output format: junit, csv or json
        #[arg(short = 'f', long, default_value = "junit")]
        format: ReportFormat,

        /// Output file, or `-` for stdout
        #[arg(short = 'o', long, default_value = STDOUT_OUTPUT)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Load configuration
    let mut config = match load_config(&cli.project_path, cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} Failed to load config: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    // Apply CLI overrides
    config.relaxed |= cli.relaxed;
    config.ignore.packages.extend(cli.ignore_packages.iter().cloned());

    let config_file = cli
        .config
        .clone()
        .or_else(|| find_config(&cli.project_path))
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    // Run audit
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Auditing licenses...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = audit_project(&cli.project_path, &config).await;

    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Audit failed: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    warn_skipped(&report);

    // Handle subcommand
    match cli.command {
        Commands::Check => {
            print!("{}", render_summary(&report.results, Some(&config_file)));
        }

        Commands::Report { format, output } => {
            let content = match render(&report, format) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("{} Failed to render report: {}", "Error:".red().bold(), e);
                    process::exit(1);
                }
            };

            if let Err(e) = write_report(&content, &output) {
                eprintln!("{} Failed to write report: {}", "Error:".red().bold(), e);
                process::exit(1);
            }
            if output.as_os_str() != STDOUT_OUTPUT {
                eprintln!("Report written to: {}", output.display());
            }
        }
    }

    if report.is_failure() {
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn warn_skipped(report: &AuditReport) {
    if report.skipped.is_empty() {
        return;
    }
    eprintln!(
        "{} {} packages could not be audited:",
        "Warning:".yellow().bold(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        eprintln!("  - {}: {}", skipped.key, skipped.reason);
    }
}
