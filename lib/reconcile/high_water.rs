use tracing::{info, warn};

use super::error::{ReconcileError, RunStage};
use super::Reconciler;
use crate::store::{
    Filter, QueryRequest, Sort, SortDirection, StoreError, StoreErrorKind, TicketStore,
};

impl<S> Reconciler<S>
where
    S: TicketStore,
{
    /// Returns the largest ticket number currently in the store, or 0 when none is set.
    ///
    /// Always asks the store; nothing is cached between runs.
    pub async fn find_high_water_mark(&self) -> Result<i64, ReconcileError> {
        let property = &self.config.id_property;
        let request = QueryRequest {
            filter: Some(Filter::NumberIsNotEmpty {
                property: property.clone(),
            }),
            sorts: vec![Sort::Property {
                property: property.clone(),
                direction: SortDirection::Descending,
            }],
            page_size: Some(1),
            start_cursor: None,
        };

        let page = self
            .store
            .query(&request)
            .await
            .map_err(|err| ReconcileError::from_store(RunStage::FindHighWaterMark, err))?;

        let mark = match page.results.first() {
            None => 0,
            Some(latest) => latest.ticket_number(property).ok_or_else(|| {
                ReconcileError::from_store(
                    RunStage::FindHighWaterMark,
                    StoreError::new(
                        StoreErrorKind::Decode,
                        format!("record {} matched is_not_empty but has no number", latest.id),
                    ),
                )
            })?,
        };

        if mark < 0 {
            warn!(
                event = "negative_high_water_mark",
                mark, "largest stored number is negative, numbering from 1"
            );
            return Ok(0);
        }

        info!(event = "high_water_mark_found", mark, "found latest ticket number");
        Ok(mark)
    }
}
