use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kvbench_dash::chart::{ChartSpec, ColorTable};
use kvbench_dash::model::RecordSet;
use kvbench_dash::render::SvgSurface;
use kvbench_dash::section::{build_section, Dashboard, Section, SessionContext};
use kvbench_dash::store::{load_records_from_file, ApiClient, LoadError, OverviewSummary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kvbench-dash")]
#[command(about = "Renders charts and summaries from key-value store benchmark results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load results and render every dashboard section to SVG and text files
    Render {
        /// Base URL of the results API
        #[arg(long, default_value = "http://localhost:5002/api")]
        api: String,

        /// Read the results payload from a local file instead of the API
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Output directory for rendered files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Load results and export every section's chart specs as JSON
    ExportSpecs {
        /// Base URL of the results API
        #[arg(long, default_value = "http://localhost:5002/api")]
        api: String,

        /// Read the results payload from a local file instead of the API
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Output directory for spec files
        #[arg(short, long, default_value = "./specs")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            api,
            data_file,
            output,
        } => render_dashboard(&api, data_file.as_deref(), &output).await,
        Commands::ExportSpecs {
            api,
            data_file,
            output,
        } => export_specs(&api, data_file.as_deref(), &output).await,
    }
}

/// The session's one load: the record set, plus the server's precomputed
/// overview when fetching over the API. A missing overview is not a load
/// failure; the cards fall back to the client-side reduction.
async fn load_session(
    api: &str,
    data_file: Option<&Path>,
) -> Result<(RecordSet, Option<OverviewSummary>), LoadError> {
    match data_file {
        Some(path) => {
            println!("Loading results from {}", path.display());
            Ok((load_records_from_file(path)?, None))
        }
        None => {
            println!("Fetching results from {api}");
            let client = ApiClient::new(api);
            let records = client.fetch_records().await?;
            let overview = match client.fetch_overview().await {
                Ok(summary) => Some(summary),
                Err(err) => {
                    tracing::warn!(%err, "overview endpoint unavailable, using client-side winners");
                    None
                }
            };
            Ok((records, overview))
        }
    }
}

async fn render_dashboard(api: &str, data_file: Option<&Path>, output: &Path) -> Result<()> {
    let surface = SvgSurface::new(output)?;
    let mut dashboard = Dashboard::new(surface);

    match load_session(api, data_file).await {
        Ok((records, overview)) => {
            println!("Loaded {} benchmark records", records.len());
            let context = SessionContext::new(records, overview, ColorTable::defaults())?;
            dashboard.attach_data(context)?;
        }
        Err(err) => {
            dashboard.fail_load(&err.to_string());
            return Err(err).context("results load failed");
        }
    }

    for &section in Section::all() {
        dashboard.activate(section)?;
        println!("Rendered section: {}", section.name());
    }

    println!("\nDashboard rendered to {}", output.display());
    Ok(())
}

async fn export_specs(api: &str, data_file: Option<&Path>, output: &Path) -> Result<()> {
    let (records, overview) = load_session(api, data_file)
        .await
        .context("results load failed")?;
    println!("Loaded {} benchmark records", records.len());
    let context = SessionContext::new(records, overview, ColorTable::defaults())?;

    std::fs::create_dir_all(output).context("Failed to create output directory")?;

    for &section in Section::all() {
        let built = build_section(&context, section)?;
        let charts: BTreeMap<&String, &ChartSpec> =
            built.charts.iter().map(|(mount, spec)| (mount, spec)).collect();
        let texts: BTreeMap<&String, &String> =
            built.texts.iter().map(|(mount, text)| (mount, text)).collect();
        let payload = serde_json::json!({ "charts": charts, "texts": texts });

        let path = output.join(format!("{}.json", section.name()));
        std::fs::write(&path, serde_json::to_string_pretty(&payload)?)?;
        println!("Exported: {}", path.display());
    }

    println!("\nSpecs exported to {}", output.display());
    Ok(())
}
