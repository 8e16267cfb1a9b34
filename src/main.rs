mod config;
mod error;
mod fetch;
mod harvest;
mod output;
mod parser;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use config::Settings;
use output::CategoryRecord;
use parser::{Severity, Taxonomy};

#[derive(Parser)]
#[command(
    name = "template_harvester",
    about = "Export bug-bounty report templates to CSV, classified by severity"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download templates + taxonomy and write the CSV (default)
    Run {
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Harvest an already extracted templates directory
    Harvest {
        /// Directory holding one sub-directory per category
        dir: PathBuf,
        /// Local taxonomy JSON (omit to leave every category unclassified)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how one category path is classified
    Classify {
        /// Path fragment, e.g. server_security_misconfiguration/clickjacking
        path: String,
        /// Local taxonomy JSON (default: fetch the published one)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Run { output: None }) {
        Commands::Run { output } => {
            let settings = Settings::default().with_output(output);
            run(&settings).await
        }
        Commands::Harvest { dir, taxonomy, output } => {
            let settings = Settings::default().with_output(output);
            harvest_local(&dir, taxonomy.as_deref(), &settings)
        }
        Commands::Classify { path, taxonomy } => classify(&path, taxonomy.as_deref()).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Full pipeline: archive → extract → taxonomy → harvest → CSV.
///
/// The extraction directory is a `TempDir`, removed when this function
/// returns on any path. Nothing is written unless the harvest succeeds.
async fn run(settings: &Settings) -> anyhow::Result<()> {
    let client = fetch::client()?;

    let pb = spinner("Downloading templates archive");
    let archive = fetch::fetch_archive(&client, &settings.archive_url).await;
    pb.finish_and_clear();
    let archive = archive.context("Failed to download templates")?;

    let workdir = tempfile::Builder::new()
        .prefix(config::TEMP_PREFIX)
        .tempdir()
        .context("Failed to create temporary directory")?;
    let templates = fetch::extract_archive(&archive, workdir.path())
        .context("Failed to extract templates")?;
    drop(archive);

    let taxonomy = remote_taxonomy(&client, &settings.taxonomy_url).await;

    let records = harvest_with_spinner(&templates, taxonomy.as_ref())?;
    output::write_csv(&settings.output, &records)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    Summary::from_records(&records).print(&settings.output);
    Ok(())
}

fn harvest_local(dir: &Path, taxonomy: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    let taxonomy = taxonomy.map(load_taxonomy_file).transpose()?;
    let records = harvest_with_spinner(dir, taxonomy.as_ref())?;
    output::write_csv(&settings.output, &records)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;
    Summary::from_records(&records).print(&settings.output);
    Ok(())
}

async fn classify(path: &str, taxonomy: Option<&Path>) -> anyhow::Result<()> {
    let taxonomy = match taxonomy {
        Some(p) => Some(load_taxonomy_file(p)?),
        None => remote_taxonomy(&fetch::client()?, config::TAXONOMY_URL).await,
    };
    let c = parser::resolve(path, taxonomy.as_ref());
    println!("Severity:  {}", c.severity);
    println!("Hierarchy: {}", display_name(path, &c.hierarchy));
    Ok(())
}

/// Name the CSV would carry for `path`, flagged when it is path-derived.
fn display_name(path: &str, hierarchy: &[String]) -> String {
    if hierarchy.is_empty() {
        format!("(no match) -> {}", harvest::derive_name(&path_segments(path)))
    } else {
        hierarchy.join(harvest::NAME_SEPARATOR)
    }
}

/// Taxonomy failures never abort a run; categories just stay unclassified.
async fn remote_taxonomy(client: &reqwest::Client, url: &str) -> Option<Taxonomy> {
    match fetch::fetch_taxonomy(client, url).await {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("Taxonomy unavailable, every category will be unclassified: {}", e);
            None
        }
    }
}

fn load_taxonomy_file(path: &Path) -> anyhow::Result<Taxonomy> {
    Taxonomy::from_path(path).with_context(|| format!("Failed to load taxonomy {}", path.display()))
}

fn harvest_with_spinner(dir: &Path, taxonomy: Option<&Taxonomy>) -> anyhow::Result<Vec<CategoryRecord>> {
    let pb = spinner("Harvesting categories");
    let records = harvest::harvest(dir, taxonomy);
    pb.finish_and_clear();
    let records = records.with_context(|| format!("Failed to walk {}", dir.display()))?;
    info!("Harvested {} categories from {}", records.len(), dir.display());
    Ok(records)
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

struct Summary {
    total: usize,
    by_tier: BTreeMap<Severity, usize>,
}

impl Summary {
    fn from_records(records: &[CategoryRecord]) -> Self {
        let mut by_tier = BTreeMap::new();
        for r in records {
            *by_tier.entry(r.exploitation).or_insert(0) += 1;
        }
        Summary {
            total: records.len(),
            by_tier,
        }
    }

    fn print(&self, output: &Path) {
        println!("Saved {} categories to {}", self.total, output.display());
        for (tier, count) in &self.by_tier {
            println!("  {:<13} {:>4}", tier.as_str(), count);
        }
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
