//! One numbering run: validate the schema, read the high-water mark, collect unnumbered
//! records oldest first, then number them sequentially.
//!
//! A rerun is just another `Reconciler::run`. It is safe because the mark is re-read from the
//! store every time and records numbered at or below it are never collected again.

mod assigner;
mod collector;
pub mod error;
mod high_water;
pub mod outcome;
mod schema;
pub mod types;


use tracing::info;

use crate::store::{StoreError, StoreErrorKind, TicketStore};
pub use error::{ReconcileError, RunStage};
pub use outcome::{summarize, RunSummary};
pub use schema::PropertyCheck;
pub use types::{AssignReport, Assignment, ReconcileConfig, RunReport, UpdateFailure};

/// Drives one run against a store. Construct per run and drop when done.
pub struct Reconciler<S>
where
    S: TicketStore,
{
    store: S,
    config: ReconcileConfig,
}

impl<S> Reconciler<S>
where
    S: TicketStore,
{
    pub fn new(store: S, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs every stage in order. Fatal problems come back as `Err`; update failures are in
    /// the returned report.
    pub async fn run(&self) -> Result<RunReport, ReconcileError> {
        info!(
            event = "run_started",
            property = %self.config.id_property,
            dry_run = self.config.dry_run,
            "starting ticket numbering run"
        );

        self.ensure_numeric_property().await?;
        let high_water_mark = self.find_high_water_mark().await?;
        let records = self.collect_unassigned(high_water_mark).await?;
        ensure_numbers_fit(high_water_mark, records.len())?;

        let assignments = if records.is_empty() {
            info!(event = "nothing_to_number", "no tickets to update");
            AssignReport {
                dry_run: self.config.dry_run,
                ..AssignReport::default()
            }
        } else {
            self.assign(&records, high_water_mark).await
        };

        let report = RunReport {
            high_water_mark,
            candidates: records.len(),
            assignments,
        };
        info!(
            event = "run_finished",
            high_water_mark,
            candidates = report.candidates,
            numbered = report.numbered(),
            failed = report.assignments.failed.len(),
            "finished ticket numbering run"
        );
        Ok(report)
    }
}

/// Fails unless `high_water_mark + candidates` is representable, so every assigned number
/// stays positive and strictly increasing.
fn ensure_numbers_fit(high_water_mark: i64, candidates: usize) -> Result<(), ReconcileError> {
    let fits = i64::try_from(candidates)
        .ok()
        .and_then(|count| high_water_mark.checked_add(count))
        .is_some();
    if fits {
        return Ok(());
    }
    Err(ReconcileError::from_store(
        RunStage::FindHighWaterMark,
        StoreError::new(
            StoreErrorKind::Decode,
            format!(
                "latest ticket number {high_water_mark} leaves no room for {candidates} more"
            ),
        ),
    ))
}
