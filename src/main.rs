use std::process::ExitCode;
use std::time::Instant;

use dotenv::dotenv;
use tracing::{error, info};

use ticket_numberer_lib::{
    cli::parse_args,
    config::Config,
    logging::{format_error_report, init_logging},
    notion_client::NotionClient,
    reconcile::{outcome::EXIT_FATAL, summarize, Reconciler, RunReport},
    store::ResilientStore,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = parse_args();
    let mode = if args.dry_run { "dry-run" } else { "apply" };
    init_logging("ticket_numberer", mode, &args.log_level);

    let config = match Config::from_env(&args.overrides()) {
        Ok(config) => config,
        Err(err) => {
            error!(event = "config_invalid", error = %err, "configuration incomplete");
            eprintln!("{}", format_error_report(&err));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let client = match NotionClient::new(&config.notion_client_config()) {
        Ok(client) => client,
        Err(err) => {
            error!(event = "client_init_failed", error = %err, "could not build HTTP client");
            eprintln!("{}", format_error_report(&err));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let reconciler = Reconciler::new(
        ResilientStore::new(client, config.retry_policy()),
        config.reconcile_config(args.dry_run),
    );

    let start_time = Instant::now();
    let outcome = reconciler.run().await;
    info!(
        event = "run_elapsed",
        elapsed_ms = start_time.elapsed().as_millis() as u64
    );

    match outcome {
        Ok(report) => report_outcome(&report),
        Err(err) => {
            error!(
                event = "run_aborted",
                schema_error = err.is_schema_error(),
                error = %err,
                "numbering aborted before completion"
            );
            eprintln!("{}", format_error_report(&err));
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn report_outcome(report: &RunReport) -> ExitCode {
    let summary = summarize(report);
    for line in &summary.stdout {
        println!("{line}");
    }
    for line in &summary.stderr {
        eprintln!("{line}");
    }
    ExitCode::from(summary.exit_code)
}
