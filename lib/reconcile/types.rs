use crate::store::StoreError;

/// Tunables for one run, derived from process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Name of the number property that holds ticket numbers.
    pub id_property: String,
    /// Page size hint for the candidate query. `None` leaves it to the store.
    pub page_size: Option<u32>,
    /// Plan numbers without writing them.
    pub dry_run: bool,
}

impl ReconcileConfig {
    pub fn new(id_property: impl Into<String>) -> Self {
        Self {
            id_property: id_property.into(),
            page_size: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub page_id: String,
    pub number: i64,
}

/// A record whose update failed; `number` is what it would have received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    pub page_id: String,
    pub number: i64,
    pub error: StoreError,
}

/// Outcome of walking the candidate list once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignReport {
    pub assigned: Vec<Assignment>,
    pub failed: Vec<UpdateFailure>,
    pub dry_run: bool,
}

impl AssignReport {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed
            .iter()
            .map(|failure| failure.page_id.as_str())
            .collect()
    }
}

/// Final state of a run that got through collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub high_water_mark: i64,
    pub candidates: usize,
    pub assignments: AssignReport,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.assignments.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.assignments.failed_ids()
    }

    pub fn numbered(&self) -> usize {
        self.assignments.assigned.len()
    }
}
