//! Shape command
//!
//! Usage: treeshape shape --dataset <JSON> --config <TOML> [--param k=v]... [--record <KEY>]

use clap::Args;
use std::path::PathBuf;
use treeshape_core::{shape, QueryParams, ShapeConfig, ShapePlan, ShapeTarget};

use super::load_store;

#[derive(Debug, Args)]
pub struct ShapeArgs {
    /// JSON dataset holding schemas and records
    #[arg(long)]
    pub dataset: PathBuf,

    /// TOML shape config
    #[arg(long)]
    pub config: PathBuf,

    /// Request parameter as `key=value` (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Shape a single record instead of the collection
    #[arg(long)]
    pub record: Option<i64>,
}

/// Execute shape command
pub fn execute(args: ShapeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(&args.dataset)?;
    let config_text = std::fs::read_to_string(&args.config)
        .map_err(|e| format!("cannot read config {}: {}", args.config.display(), e))?;
    let config = ShapeConfig::from_toml_str(&config_text)?;
    let plan = ShapePlan::from_config(&store, &config)?;

    let mut params = QueryParams::new();
    for raw in &args.params {
        let (key, value) = QueryParams::parse_pair(raw)?;
        params.insert(key, value);
    }

    let target = match args.record {
        Some(key) => ShapeTarget::Record {
            resolver: &store,
            record: store.get_record(plan.entity(), key)?,
        },
        None => ShapeTarget::Collection(store.collection(plan.entity())?),
    };
    let shaped = shape(target, &plan, Some(&params))?;

    println!("{}", serde_json::to_string_pretty(&shaped)?);
    Ok(())
}
