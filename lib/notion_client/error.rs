use std::error::Error as StdError;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::store::{StoreError, StoreErrorKind};

#[derive(Error, Debug)]
pub enum NotionClientErr {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("unexpected HTTP status while {resource}: {status} ({detail})")]
    UnexpectedStatus {
        resource: String,
        status: u16,
        detail: String,
        retry_after: Option<Duration>,
    },
    #[error(transparent)]
    JsonParseError(#[from] serde_json::Error),
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
}

/// Error object Notion returns alongside non-2xx statuses.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Reduces an error body to `code: message`, falling back to the raw text.
pub(crate) fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{code}: {message}"),
        Ok(ApiErrorBody {
            code: Some(code), ..
        }) => code,
        _ if body.trim().is_empty() => "empty body".to_string(),
        _ => body.chars().take(200).collect(),
    }
}

impl From<NotionClientErr> for StoreError {
    fn from(error: NotionClientErr) -> Self {
        match error {
            NotionClientErr::UnexpectedStatus {
                resource,
                status,
                detail,
                retry_after,
            } => StoreError::status(status, format!("{resource}: {detail}"))
                .with_retry_after(retry_after),
            NotionClientErr::RequestError(req_err) => {
                if req_err.is_decode() {
                    return StoreError::new(StoreErrorKind::Decode, render_error_chain(&req_err));
                }
                let error =
                    StoreError::new(StoreErrorKind::Transport, render_error_chain(&req_err));
                match req_err.status() {
                    Some(status) => error.with_status(status.as_u16()),
                    None => error,
                }
            }
            NotionClientErr::JsonParseError(err) => StoreError::new(
                StoreErrorKind::Decode,
                format!("unexpected response payload: {err}"),
            ),
            NotionClientErr::InvalidConfig(message) => {
                StoreError::new(StoreErrorKind::Transport, message)
            }
        }
    }
}

fn render_error_chain(error: &reqwest::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(next) = source {
        parts.push(next.to_string());
        source = next.source();
    }
    parts.join(" | caused_by: ")
}
