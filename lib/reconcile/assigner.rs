use tracing::{debug, info, warn};

use super::types::{AssignReport, Assignment, UpdateFailure};
use super::Reconciler;
use crate::store::{PageRecord, TicketStore};

const PROGRESS_EVERY: usize = 25;

impl<S> Reconciler<S>
where
    S: TicketStore,
{
    /// Numbers `records` in order, starting at `high_water_mark + 1`.
    ///
    /// Each record is one independent update. A failed update is recorded and the walk
    /// continues, so one bad record never holds back the rest. `high_water_mark + records.len()`
    /// must fit in an `i64`; `run` checks this before calling.
    pub async fn assign(&self, records: &[PageRecord], high_water_mark: i64) -> AssignReport {
        let property = &self.config.id_property;
        let total = records.len();
        let mut report = AssignReport {
            dry_run: self.config.dry_run,
            ..AssignReport::default()
        };

        info!(
            event = "assignment_started",
            property = %property,
            total,
            first_number = high_water_mark.saturating_add(1),
            dry_run = self.config.dry_run,
            "adding ticket numbers"
        );

        for (index, record) in records.iter().enumerate() {
            let number = high_water_mark + index as i64 + 1;

            if self.config.dry_run {
                info!(event = "assignment_planned", page_id = %record.id, number);
                report.assigned.push(Assignment {
                    page_id: record.id.clone(),
                    number,
                });
                continue;
            }

            match self.store.update_number(&record.id, property, number).await {
                Ok(()) => {
                    debug!(event = "ticket_numbered", page_id = %record.id, number);
                    report.assigned.push(Assignment {
                        page_id: record.id.clone(),
                        number,
                    });
                }
                Err(error) => {
                    warn!(
                        event = "ticket_update_failed",
                        page_id = %record.id,
                        number,
                        error = %error,
                        "could not set ticket number"
                    );
                    report.failed.push(UpdateFailure {
                        page_id: record.id.clone(),
                        number,
                        error,
                    });
                }
            }

            let done = index + 1;
            if done % PROGRESS_EVERY == 0 && done < total {
                info!(event = "assignment_progress", done, total);
            }
        }

        report
    }
}
