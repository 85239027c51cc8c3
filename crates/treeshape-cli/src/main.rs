//! treeshape CLI
//!
//! Command-line interface for shaping and reconciling records held in a JSON
//! dataset

use clap::{Parser, Subcommand};
use std::error::Error;
use std::time::Instant;
use treeshape_core::logging_facility::{init, Profile};
use treeshape_core::{log_op_error, ExError, ShapeError};
use treeshape_core_types::{RequestContext, RequestId, TraceId};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "treeshape")]
#[command(about = "treeshape - Shape and reconcile tree-structured records", long_about = None)]
struct Cli {
    /// Log to stderr at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Correlation id for this invocation (generated when omitted)
    #[arg(long, global = true, value_name = "ID")]
    request_id: Option<String>,

    /// Trace id propagated from the calling layer
    #[arg(long, global = true, value_name = "ID")]
    trace_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a record or a paginated collection through a shape config
    Shape(commands::shape::ShapeArgs),
    /// Diff a submitted list against stored records and apply the result
    Reconcile(commands::reconcile::ReconcileArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let ctx = RequestContext::from_parts(cli.request_id, cli.trace_id);
    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id,
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str)
    );
    let _entered = span.enter();
    let started = Instant::now();

    let result = match cli.command {
        Commands::Shape(args) => commands::shape::execute(args),
        Commands::Reconcile(args) => commands::reconcile::execute(args),
    };

    if let Err(e) = result {
        report_failure(&ctx, e.as_ref(), started.elapsed().as_millis() as u64);
        std::process::exit(1);
    }
}

/// Print the failure with its correlation ids and log it
fn report_failure(ctx: &RequestContext, err: &(dyn Error + 'static), duration_ms: u64) {
    eprintln!("Error: {}", err);
    match err.downcast_ref::<ShapeError>() {
        Some(shape_err) => {
            let ex_err = ExError::from(shape_err.clone()).with_context(ctx);
            let request_id = ex_err.request_id().map(RequestId::as_str).unwrap_or_default();
            eprintln!("  code: {}, request_id: {}", ex_err.code(), request_id);
            log_op_error!(
                "treeshape",
                ex_err,
                duration_ms = duration_ms,
                request_id = %ctx.request_id
            );
        }
        None => {
            eprintln!("  request_id: {}", ctx.request_id);
            tracing::error!(request_id = %ctx.request_id, error = %err, "command failed");
        }
    }
}
