use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use tracing_subscriber::EnvFilter;

use nutrimerge::dataset::{dedup_products, load_nutrition, load_products, write_merged};
use nutrimerge::merge_config::MergeConfig;
use nutrimerge::merge_engine::MergeEngine;

const DEFAULT_NUTRITION_CSV: &str = "nutrition_dump.csv";
const DEFAULT_PRODUCTS_CSV: &str = "all_snacks.csv";
const DEFAULT_OUTPUT_PATH: &str = "merged_snacks.json";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Positional argument, then environment variable, then default
fn path_setting(args: &[String], position: usize, var: &str, default: &str) -> PathBuf {
    args.get(position)
        .cloned()
        .or_else(|| env::var(var).ok())
        .unwrap_or_else(|| default.to_string())
        .into()
}

fn load_config() -> Result<MergeConfig> {
    let mut config = match env::var("MERGE_CONFIG") {
        Ok(path) => MergeConfig::from_json_file(&PathBuf::from(path))?,
        Err(_) => MergeConfig::default(),
    };
    if let Ok(top_n) = env::var("VOCABULARY_TOP_N") {
        config.vocabulary_top_n = top_n
            .parse()
            .with_context(|| format!("VOCABULARY_TOP_N must be an integer, got '{top_n}'"))?;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging();

    let args: Vec<String> = env::args().collect();
    let nutrition_path = path_setting(&args, 1, "NUTRITION_CSV", DEFAULT_NUTRITION_CSV);
    let products_path = path_setting(&args, 2, "PRODUCTS_CSV", DEFAULT_PRODUCTS_CSV);
    let output_path = path_setting(&args, 3, "OUTPUT_PATH", DEFAULT_OUTPUT_PATH);

    info!("Starting nutrition merge");
    let config = load_config().context("Failed to load merge configuration")?;

    let nutrition_rows = load_nutrition(&nutrition_path, &config.nutrition_columns)
        .context("Failed to load nutrition dataset")?;
    let products = load_products(&products_path, &config.product_columns)
        .context("Failed to load product dataset")?;
    let (mut products, _) = dedup_products(products);

    let report = MergeEngine::new(&config)?.merge(&mut products, &nutrition_rows)?;

    write_merged(&output_path, &products).context("Failed to write merged products")?;

    info!(
        "Done: {} matched, {} without nutrition ({} zero-calorie), {} key collisions",
        report.matched, report.unmatched, report.zero_calorie_rejections, report.key_collisions
    );
    Ok(())
}
