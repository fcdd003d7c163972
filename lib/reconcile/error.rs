use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Steps of one numbering run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    ValidateSchema,
    FindHighWaterMark,
    Collect,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidateSchema => "validating schema",
            Self::FindHighWaterMark => "finding the latest ticket number",
            Self::Collect => "collecting unnumbered records",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures that abort a run before any (further) numbering happens.
///
/// Per-record update failures are not errors at this level; they are collected in
/// `AssignReport::failed`.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("property \"{property}\" does not exist in the database")]
    PropertyMissing { property: String },

    #[error("property \"{property}\" has type \"{actual}\", expected \"number\"")]
    PropertyNotNumeric { property: String, actual: String },

    #[error("store kept throttling while {stage}")]
    Throttled {
        stage: RunStage,
        #[source]
        source: StoreError,
    },

    #[error("request failed while {stage}")]
    Request {
        stage: RunStage,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    pub fn from_store(stage: RunStage, source: StoreError) -> Self {
        if source.is_transient() {
            Self::Throttled { stage, source }
        } else {
            Self::Request { stage, source }
        }
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::PropertyMissing { .. } | Self::PropertyNotNumeric { .. }
        )
    }
}
