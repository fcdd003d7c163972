pub mod error;
pub mod query;
pub mod resilient;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use error::{StoreError, StoreErrorKind};
pub use query::{
    number_update_body, DatabaseSchema, Filter, PageRecord, PropertySchema, QueryPage,
    QueryRequest, Sort, SortDirection,
};
pub use resilient::ResilientStore;
pub use retry::RetryPolicy;

/// The three operations the numbering run needs from the record database.
///
/// This trait exists so reconciliation can be unit-tested against a scripted in-memory store,
/// and so the retry policy can wrap any implementation uniformly.
pub trait TicketStore: Send + Sync {
    /// Reads the database's declared property types.
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>>;

    /// Fetches one page of a filtered, sorted query.
    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>>;

    /// Sets a number property on a single record.
    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

impl<T> TicketStore for Arc<T>
where
    T: TicketStore + ?Sized,
{
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>> {
        (**self).retrieve_schema()
    }

    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>> {
        (**self).query(request)
    }

    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        (**self).update_number(page_id, property, value)
    }
}
