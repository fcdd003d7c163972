use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;

use super::{
    DatabaseSchema, Filter, PageRecord, QueryPage, QueryRequest, RetryPolicy, Sort,
    SortDirection, StoreError, StoreErrorKind, TicketStore,
};

pub(crate) const PROP: &str = "Ticket ID";

pub(crate) fn throttled() -> StoreError {
    StoreError::status(429, "rate_limited")
}

pub(crate) fn instant_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff_factor: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub(crate) fn numeric_schema() -> DatabaseSchema {
    DatabaseSchema::default()
        .with_property(PROP, "number")
        .with_property("Name", "title")
}

/// Store that replays scripted responses and records every call.
#[derive(Default)]
pub(crate) struct MockStore {
    schemas: Mutex<VecDeque<Result<DatabaseSchema, StoreError>>>,
    query_pages: Mutex<VecDeque<Result<QueryPage, StoreError>>>,
    queries: Mutex<Vec<QueryRequest>>,
    update_plans: Mutex<HashMap<String, VecDeque<Result<(), StoreError>>>>,
    update_calls: Mutex<HashMap<String, u32>>,
    stored: Mutex<HashMap<(String, String), i64>>,
}

impl MockStore {
    pub(crate) fn with_schema(self, schema: Result<DatabaseSchema, StoreError>) -> Self {
        self.schemas
            .lock()
            .expect("schemas mutex poisoned")
            .push_back(schema);
        self
    }

    pub(crate) fn with_query_pages(self, pages: Vec<Result<QueryPage, StoreError>>) -> Self {
        self.query_pages
            .lock()
            .expect("query_pages mutex poisoned")
            .extend(pages);
        self
    }

    pub(crate) fn with_update_plan(self, page_id: &str, plan: Vec<Result<(), StoreError>>) -> Self {
        self.update_plans
            .lock()
            .expect("update_plans mutex poisoned")
            .insert(page_id.to_string(), plan.into_iter().collect());
        self
    }

    pub(crate) fn query_calls(&self) -> usize {
        self.queries.lock().expect("queries mutex poisoned").len()
    }

    pub(crate) fn recorded_queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().expect("queries mutex poisoned").clone()
    }

    pub(crate) fn update_calls_for(&self, page_id: &str) -> u32 {
        *self
            .update_calls
            .lock()
            .expect("update_calls mutex poisoned")
            .get(page_id)
            .unwrap_or(&0)
    }

    pub(crate) fn total_update_calls(&self) -> u32 {
        self.update_calls
            .lock()
            .expect("update_calls mutex poisoned")
            .values()
            .sum()
    }

    pub(crate) fn stored_number(&self, page_id: &str, property: &str) -> Option<i64> {
        self.stored
            .lock()
            .expect("stored mutex poisoned")
            .get(&(page_id.to_string(), property.to_string()))
            .copied()
    }
}

impl TicketStore for MockStore {
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>> {
        Box::pin(async move {
            self.schemas
                .lock()
                .expect("schemas mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Err(StoreError::new(
                        StoreErrorKind::Status,
                        "no scripted schema response",
                    ))
                })
        })
    }

    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>> {
        Box::pin(async move {
            self.queries
                .lock()
                .expect("queries mutex poisoned")
                .push(request.clone());

            self.query_pages
                .lock()
                .expect("query_pages mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Err(StoreError::new(
                        StoreErrorKind::Status,
                        "scripted query responses exhausted",
                    ))
                })
        })
    }

    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            *self
                .update_calls
                .lock()
                .expect("update_calls mutex poisoned")
                .entry(page_id.to_string())
                .or_insert(0) += 1;

            let next = self
                .update_plans
                .lock()
                .expect("update_plans mutex poisoned")
                .get_mut(page_id)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(()));

            if next.is_ok() {
                self.stored
                    .lock()
                    .expect("stored mutex poisoned")
                    .insert((page_id.to_string(), property.to_string()), value);
            }
            next
        })
    }
}

/// In-memory database that evaluates filters, sorts and cursors the way the real store does.
pub(crate) struct FakeDatabase {
    schema: DatabaseSchema,
    records: Mutex<Vec<PageRecord>>,
    always_throttled: HashSet<String>,
    max_page_size: usize,
}

impl FakeDatabase {
    /// `records` is `(id, created_time, number)`; insertion order is irrelevant.
    pub(crate) fn new(records: &[(&str, &str, Option<i64>)]) -> Self {
        Self {
            schema: numeric_schema(),
            records: Mutex::new(
                records
                    .iter()
                    .map(|(id, created, number)| {
                        PageRecord::new(*id, *created).with_number(PROP, *number)
                    })
                    .collect(),
            ),
            always_throttled: HashSet::new(),
            max_page_size: 100,
        }
    }

    pub(crate) fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub(crate) fn always_throttle_updates_for(mut self, page_id: &str) -> Self {
        self.always_throttled.insert(page_id.to_string());
        self
    }

    pub(crate) fn number_of(&self, page_id: &str) -> Option<i64> {
        self.records
            .lock()
            .expect("records mutex poisoned")
            .iter()
            .find(|record| record.id == page_id)
            .and_then(|record| record.ticket_number(PROP))
    }
}

fn matches(filter: &Filter, record: &PageRecord) -> bool {
    match filter {
        Filter::NumberIsEmpty { property } => record.ticket_number(property).is_none(),
        Filter::NumberIsNotEmpty { property } => record.ticket_number(property).is_some(),
        Filter::NumberGreaterThan { property, value } => record
            .ticket_number(property)
            .is_some_and(|number| number > *value),
        Filter::Or(branches) => branches.iter().any(|branch| matches(branch, record)),
    }
}

fn compare(sort: &Sort, a: &PageRecord, b: &PageRecord) -> Ordering {
    let (ordering, direction) = match sort {
        Sort::Property {
            property,
            direction,
        } => (
            a.ticket_number(property).cmp(&b.ticket_number(property)),
            *direction,
        ),
        Sort::CreatedTime(direction) => (a.created_time.cmp(&b.created_time), *direction),
    };
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

impl TicketStore for FakeDatabase {
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>> {
        Box::pin(async move { Ok(self.schema.clone()) })
    }

    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>> {
        Box::pin(async move {
            let mut matching: Vec<PageRecord> = self
                .records
                .lock()
                .expect("records mutex poisoned")
                .iter()
                .filter(|record| request.filter.as_ref().map_or(true, |f| matches(f, record)))
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                request
                    .sorts
                    .iter()
                    .map(|sort| compare(sort, a, b))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });

            let start = match &request.start_cursor {
                Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                    StoreError::status(400, format!("invalid start_cursor {cursor}"))
                })?,
                None => 0,
            };
            let page_size = request
                .page_size
                .map_or(self.max_page_size, |size| size as usize)
                .min(self.max_page_size);
            let end = (start + page_size).min(matching.len());
            let has_more = end < matching.len();

            Ok(QueryPage {
                results: matching[start.min(end)..end].to_vec(),
                next_cursor: has_more.then(|| end.to_string()),
                has_more,
            })
        })
    }

    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if self.always_throttled.contains(page_id) {
                return Err(throttled());
            }
            let mut records = self.records.lock().expect("records mutex poisoned");
            let record = records
                .iter_mut()
                .find(|record| record.id == page_id)
                .ok_or_else(|| StoreError::status(404, format!("page {page_id} not found")))?;
            *record = record.clone().with_number(property, Some(value));
            Ok(())
        })
    }
}
