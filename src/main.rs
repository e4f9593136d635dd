use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use report_dashboard::config::{Config, StopWordConfig};
use report_dashboard::logging;
use report_dashboard::pipeline::keywords::StopWords;
use report_dashboard::pipeline::{Pipeline, RunOutcome};

#[derive(Parser)]
#[command(name = "report_dashboard")]
#[command(about = "Build an HTML insights dashboard from submitted incident reports")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file (defaults to ./dashboard.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory containing the submitted report JSON files
    #[arg(long)]
    reports_dir: Option<PathBuf>,
    /// Where to write the dashboard HTML
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of entries in each ranked chart
    #[arg(long)]
    top_n: Option<usize>,
    /// Read the standard stop-word list from a file
    #[arg(long, conflicts_with = "stop_words_url")]
    stop_words_file: Option<PathBuf>,
    /// Download the standard stop-word list from a URL
    #[arg(long)]
    stop_words_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = self.reports_dir {
            config.reports_dir = dir;
        }
        if let Some(output) = self.output {
            config.output_file = output;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(path) = self.stop_words_file {
            config.stop_words = StopWordConfig::File { path };
        }
        if let Some(url) = self.stop_words_url {
            config.stop_words = StopWordConfig::Url { url };
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = Cli::parse().into_config()?;
    let stop_words = StopWords::from_config(&config);
    let pipeline = Pipeline::new(config, stop_words);

    match pipeline.run() {
        Ok(RunOutcome::Generated(result)) => {
            println!("\n📊 Dashboard Results:");
            println!("   Files seen: {}", result.files_seen);
            println!("   Reports loaded: {}", result.accepted);
            println!("   Skipped: {}", result.skipped.len());
            println!("   Output file: {}", result.output_file.display());
            println!("   Data fingerprint: {}", result.fingerprint);

            if !result.skipped.is_empty() {
                println!("\n⚠️  Skipped files:");
                for skipped in &result.skipped {
                    println!("   - {}", skipped.detail);
                }
            }
            println!("✅ Dashboard successfully generated");
        }
        Ok(RunOutcome::NoOutput(reason)) => {
            info!("No dashboard written: {}", reason);
            println!("⚠️  No valid data available to generate dashboard: {}", reason);
        }
        Err(e) => {
            error!("Dashboard run failed: {}", e);
            println!("❌ Dashboard run failed: {}", e);
            return Err(e.into());
        }
    }
    Ok(())
}
