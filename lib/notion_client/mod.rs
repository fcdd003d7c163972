pub mod error;

use std::num::NonZeroU32;
use std::time::Duration;

use futures::future::BoxFuture;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::store::{
    number_update_body, DatabaseSchema, QueryPage, QueryRequest, StoreError, TicketStore,
};
use error::{describe_error_body, NotionClientErr};

pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2021-05-13";
const NOTION_VERSION_HEADER: &str = "notion-version";

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Connection settings for one database. Built once per run from `Config`.
#[derive(Debug, Clone)]
pub struct NotionClientConfig {
    pub api_url: String,
    pub token: String,
    pub database_id: String,
    pub notion_version: String,
    /// Client-side pacing; `None` disables it.
    pub requests_per_second: Option<NonZeroU32>,
    pub request_timeout: Duration,
}

/// Single-attempt HTTP client for the Notion databases and pages endpoints.
///
/// Retries live in `ResilientStore`; this layer only paces requests and turns responses into
/// typed results. Non-success statuses always come back as `UnexpectedStatus`.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    database_id: String,
    rate_limiter: Option<DirectRateLimiter>,
}

impl NotionClient {
    pub fn new(config: &NotionClientConfig) -> Result<Self, NotionClientErr> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| NotionClientErr::InvalidConfig("token is not a valid header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            HeaderName::from_static(NOTION_VERSION_HEADER),
            HeaderValue::from_str(&config.notion_version).map_err(|_| {
                NotionClientErr::InvalidConfig(format!(
                    "invalid Notion-Version {:?}",
                    config.notion_version
                ))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            rate_limiter: config
                .requests_per_second
                .map(|rps| RateLimiter::direct(Quota::per_second(rps))),
        })
    }

    pub async fn get_database_schema(&self) -> Result<DatabaseSchema, NotionClientErr> {
        let url = format!("{}/databases/{}", self.base_url, self.database_id);
        let response = self
            .send("reading database schema", self.client.get(&url))
            .await?;
        parse_json(response).await
    }

    pub async fn query_database(
        &self,
        request: &QueryRequest,
    ) -> Result<QueryPage, NotionClientErr> {
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let response = self
            .send(
                "querying database",
                self.client.post(&url).json(&request.to_body()),
            )
            .await?;
        parse_json(response).await
    }

    pub async fn update_page_number(
        &self,
        page_id: &str,
        property: &str,
        value: i64,
    ) -> Result<(), NotionClientErr> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        let body = number_update_body(property, value);
        self.send(
            &format!("updating page {page_id}"),
            self.client.patch(&url).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn send(
        &self,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<Response, NotionClientErr> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(
            event = "notion_response",
            resource,
            status = status.as_u16(),
            "received response"
        );
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(NotionClientErr::UnexpectedStatus {
            resource: resource.to_string(),
            status: status.as_u16(),
            detail: describe_error_body(&body),
            retry_after,
        })
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, NotionClientErr> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(Into::into)
}

/// Reads a `Retry-After` header expressed in whole seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

impl TicketStore for NotionClient {
    fn retrieve_schema<'a>(&'a self) -> BoxFuture<'a, Result<DatabaseSchema, StoreError>> {
        Box::pin(async move { self.get_database_schema().await.map_err(StoreError::from) })
    }

    fn query<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> BoxFuture<'a, Result<QueryPage, StoreError>> {
        Box::pin(async move { self.query_database(request).await.map_err(StoreError::from) })
    }

    fn update_number<'a>(
        &'a self,
        page_id: &'a str,
        property: &'a str,
        value: i64,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.update_page_number(page_id, property, value)
                .await
                .map_err(StoreError::from)
        })
    }
}
