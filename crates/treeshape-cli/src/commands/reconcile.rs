//! Reconcile command
//!
//! Usage: treeshape reconcile --dataset <JSON> --entity <NAME> --submitted <JSON> [--actor <ID>] [--write]

use clap::Args;
use std::path::PathBuf;
use treeshape_core::reconcile::{AuditStamp, ReconcileOptions};
use treeshape_core::{reconcile_store, RawData};

use super::load_store;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// JSON dataset holding schemas and records
    #[arg(long)]
    pub dataset: PathBuf,

    /// Entity whose active records are reconciled
    #[arg(long)]
    pub entity: String,

    /// JSON array of submitted objects
    #[arg(long)]
    pub submitted: PathBuf,

    /// Acting user stamped on created records
    #[arg(long)]
    pub actor: Option<String>,

    /// Field receiving the actor
    #[arg(long, default_value = "added_by")]
    pub audit_field: String,

    /// Persist the updated dataset back to `--dataset`
    #[arg(long)]
    pub write: bool,
}

/// Execute reconcile command
pub fn execute(args: ReconcileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = load_store(&args.dataset)?;
    let submitted_text = std::fs::read_to_string(&args.submitted).map_err(|e| {
        format!(
            "cannot read submitted list {}: {}",
            args.submitted.display(),
            e
        )
    })?;
    let submitted: Vec<RawData> = serde_json::from_str(&submitted_text)?;

    let mut options = ReconcileOptions::default();
    if let Some(actor) = &args.actor {
        options = options.with_audit(AuditStamp::new(&args.audit_field, actor_value(actor)));
    }

    let report = reconcile_store(&mut store, &args.entity, &submitted, &options)?;

    if args.write {
        std::fs::write(&args.dataset, store.to_dataset().to_json_string_pretty()?)?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Integer ids stay numbers; anything else is stored as text
fn actor_value(raw: &str) -> serde_json::Value {
    match raw.trim().parse::<i64>() {
        Ok(id) => serde_json::Value::from(id),
        Err(_) => serde_json::Value::from(raw),
    }
}
