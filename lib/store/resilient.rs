use std::future::Future;

use futures::future::BoxFuture;
use tracing::warn;

use super::error::{StoreError, StoreErrorKind};
use super::query::{DatabaseSchema, QueryPage, QueryRequest};
use super::retry::{run_with_retry, RetryPolicy};
use super::TicketStore;

/// Wraps a store so every operation runs under the same throttling retry policy.
///
/// Only statuses listed in the policy are retried. When they outlast the attempt ceiling the
/// caller receives a `Throttled` error; any other failure passes through on the first attempt.
pub struct ResilientStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> ResilientStore<S>
where
    S: TicketStore,
{
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, StoreError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let policy = &self.policy;
        match run_with_retry(
            policy,
            op,
            |err: &StoreError| err.status.is_some_and(|s| policy.is_retryable_status(s)),
            |err: &StoreError| err.retry_after,
        )
        .await
        {
            Ok((value, _attempts)) => Ok(value),
            Err(terminal) if terminal.exhausted_retryable => {
                warn!(
                    event = "store_retries_exhausted",
                    operation,
                    attempts = terminal.attempts,
                    status = ?terminal.error.status,
                    "store kept throttling past the retry ceiling"
                );
                let mut error = terminal.error.with_attempts(terminal.attempts);
                error.kind = StoreErrorKind::Throttled;
                Err(error)
            }
            Err(terminal) => Err(terminal.error.with_attempts(terminal.attempts)),
        }
    }
}

impl<S> TicketStore for ResilientStore<S>
where
    S: TicketStore,
{
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>> {
        Box::pin(self.call("retrieve_schema", |_| self.inner.retrieve_schema()))
    }

    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>> {
        Box::pin(self.call("query", move |_| self.inner.query(request)))
    }

    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.call("update_number", move |_| {
            self.inner.update_number(page_id, property, value)
        }))
    }
}
