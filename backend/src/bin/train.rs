//! Offline training for the yield model artifact

use std::path::PathBuf;

use agrismart_backend::ml::{train_model, TreeParams};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agrismart-train", about = "Train the AgriSmart yield model from a CSV dataset")]
struct Args {
    /// CSV dataset with Area, Item, Year, hg/ha_yield and climate columns
    #[arg(long, env = "AGRI__MODEL__DATASET_PATH", default_value = "data/yield_df.csv")]
    dataset: PathBuf,

    /// Where to write the model artifact
    #[arg(long, env = "AGRI__MODEL__ARTIFACT_PATH", default_value = "data/model.json")]
    output: PathBuf,

    /// Depth limit for the regression tree (unbounded when omitted)
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let metrics = train_model(&args.dataset, &args.output, TreeParams::with_max_depth(args.max_depth))?;

    println!("Model saved to: {}", args.output.display());
    println!("Train rows: {}  Test rows: {}", metrics.train_rows, metrics.test_rows);
    println!("MAE: {:.4}", metrics.mae);
    println!("RMSE: {:.4}", metrics.rmse);
    println!("R2: {:.4}", metrics.r2);
    Ok(())
}
