use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use fleximart::catalog::{report, CatalogSession, DocumentStore, FileDocumentSource};
use fleximart::config::{Config, DEFAULT_CONFIG_FILE};
use fleximart::constants::METRICS_SNAPSHOT_FILE;
use fleximart::logging;
use fleximart::observability;
use fleximart::pipeline::ingestion::CsvRecordSource;
use fleximart::pipeline::storage::CsvRecordSink;
use fleximart::pipeline::EtlPipeline;

#[derive(Parser)]
#[command(name = "fleximart")]
#[command(about = "FlexiMart data engineering: ETL transform and product catalog operations")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Write a Prometheus metrics snapshot to the output directory on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw customer, product and sales CSV files
    Etl {
        /// Directory holding the raw CSV files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for cleaned files and the quality report
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run the product catalog operations
    Catalog {
        /// JSON product catalog to load
        #[arg(long)]
        file: Option<PathBuf>,
        /// Product that receives the new review
        #[arg(long)]
        product_id: Option<String>,
    },
    /// Run the ETL pipeline, then the catalog operations
    Run,
}

fn run_etl(config: &Config) -> Result<()> {
    println!("🔄 Running ETL pipeline...");
    let source = CsvRecordSource::new(&config.etl.data_dir);
    let mut sink = CsvRecordSink::new(&config.etl.output_dir);

    let result = EtlPipeline::new()
        .run(&source, &mut sink)
        .context("ETL pipeline failed")?;

    let summary = result.report.summary();
    println!("\n📊 ETL Results:");
    for (entity, counters) in result.report.entities() {
        println!(
            "   {:<10} processed {:>5}, duplicates {:>4}, missing fixed {:>4}, removed {:>4}, loaded {:>5}",
            entity.as_str(),
            counters.processed,
            counters.duplicates,
            counters.missing_fixed,
            counters.removed(),
            counters.loaded
        );
    }
    println!("   Total loaded: {} of {}", summary.total_loaded, summary.total_processed);
    if let Some(score) = summary.quality_score {
        println!("   Data quality score: {:.1}%", score);
    }
    println!("   Report: {}", sink.report_path().display());
    Ok(())
}

fn run_catalog(config: &Config) -> Result<()> {
    println!("📦 Running catalog operations...");
    let session = CatalogSession::new(config.catalog.clone())?;
    let source = FileDocumentSource::new(&config.catalog.products_file);
    let mut store = DocumentStore::new();

    let results = session
        .run(&mut store, &source)
        .with_context(|| format!("Catalog session failed for {}", config.catalog.products_file.display()))?;

    println!("{}", report::render(&results));
    let (text_path, json_path) = report::write_results(&results, &config.etl.output_dir)?;
    println!("\n💾 Results saved to {} and {}", text_path.display(), json_path.display());
    Ok(())
}

fn write_metrics_snapshot(output_dir: &Path) -> Result<()> {
    if let Some(text) = observability::render_metrics() {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(METRICS_SNAPSHOT_FILE);
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Metrics snapshot written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config).context("Failed to load configuration")?;

    let _guard = logging::init_logging(&config.logging.log_dir);
    if cli.metrics {
        observability::init_metrics();
    }

    let outcome = match cli.command {
        Commands::Etl { data_dir, output_dir } => {
            if let Some(dir) = data_dir {
                config.etl.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.etl.output_dir = dir;
            }
            run_etl(&config)
        }
        Commands::Catalog { file, product_id } => {
            if let Some(file) = file {
                config.catalog.products_file = file;
            }
            if let Some(id) = product_id {
                config.catalog.review_product_id = id;
            }
            run_catalog(&config)
        }
        Commands::Run => {
            println!("🚀 Running full pipeline (ETL + catalog)...");
            run_etl(&config).and_then(|_| run_catalog(&config))
        }
    };

    if cli.metrics {
        write_metrics_snapshot(&config.etl.output_dir)?;
    }

    match outcome {
        Ok(()) => {
            println!("✅ Done");
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            println!("❌ Run failed: {:#}", e);
            Err(e)
        }
    }
}
