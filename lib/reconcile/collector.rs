use tracing::{debug, info};

use super::error::{ReconcileError, RunStage};
use super::Reconciler;
use crate::store::{
    Filter, PageRecord, QueryRequest, Sort, SortDirection, StoreError, StoreErrorKind,
    TicketStore,
};

impl<S> Reconciler<S>
where
    S: TicketStore,
{
    /// Gathers every record without a number, or with a number above `high_water_mark`,
    /// oldest first.
    ///
    /// Pages are concatenated in the order the store returns them. Any failure discards what
    /// was collected so far: numbering from an incomplete list would break creation order.
    pub async fn collect_unassigned(
        &self,
        high_water_mark: i64,
    ) -> Result<Vec<PageRecord>, ReconcileError> {
        let property = &self.config.id_property;
        let mut request = QueryRequest {
            filter: Some(Filter::Or(vec![
                Filter::NumberGreaterThan {
                    property: property.clone(),
                    value: high_water_mark,
                },
                Filter::NumberIsEmpty {
                    property: property.clone(),
                },
            ])),
            sorts: vec![Sort::CreatedTime(SortDirection::Ascending)],
            page_size: self.config.page_size,
            start_cursor: None,
        };

        let mut records = Vec::new();
        let mut pages = 0usize;
        loop {
            let page = self
                .store
                .query(&request)
                .await
                .map_err(|err| ReconcileError::from_store(RunStage::Collect, err))?;
            pages += 1;
            records.extend(page.results);

            debug!(
                event = "candidate_page_retrieved",
                page = pages,
                collected = records.len(),
                next_cursor = ?page.next_cursor.as_deref(),
                "retrieved a page of candidates"
            );

            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(cursor) if request.start_cursor.as_deref() != Some(cursor.as_str()) => {
                    request.start_cursor = Some(cursor);
                }
                Some(cursor) => {
                    return Err(malformed_page(format!(
                        "store returned cursor {cursor} twice in a row"
                    )))
                }
                None => {
                    return Err(malformed_page(
                        "has_more is set but next_cursor is missing".to_string(),
                    ))
                }
            }
        }

        info!(
            event = "candidates_collected",
            pages,
            count = records.len(),
            "retrieved new ticket(s)"
        );
        Ok(records)
    }
}

fn malformed_page(message: String) -> ReconcileError {
    ReconcileError::from_store(
        RunStage::Collect,
        StoreError::new(StoreErrorKind::Decode, message),
    )
}
