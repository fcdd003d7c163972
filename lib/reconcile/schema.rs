use tracing::debug;

use super::error::{ReconcileError, RunStage};
use super::Reconciler;
use crate::store::TicketStore;

const NUMBER_TYPE: &str = "number";

/// What the schema says about the target property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyCheck {
    Numeric,
    Missing,
    WrongType(String),
}

impl<S> Reconciler<S>
where
    S: TicketStore,
{
    /// Reads the schema once and classifies property `name`.
    pub async fn check_property(&self, name: &str) -> Result<PropertyCheck, ReconcileError> {
        let schema = self
            .store
            .retrieve_schema()
            .await
            .map_err(|err| ReconcileError::from_store(RunStage::ValidateSchema, err))?;

        let check = match schema.property_type(name) {
            None => PropertyCheck::Missing,
            Some(NUMBER_TYPE) => PropertyCheck::Numeric,
            Some(other) => PropertyCheck::WrongType(other.to_string()),
        };
        debug!(event = "schema_checked", property = name, check = ?check);
        Ok(check)
    }

    pub async fn property_is_numeric(&self, name: &str) -> Result<bool, ReconcileError> {
        Ok(self.check_property(name).await? == PropertyCheck::Numeric)
    }

    /// Fails unless the configured id property exists and is a number.
    pub(crate) async fn ensure_numeric_property(&self) -> Result<(), ReconcileError> {
        let property = &self.config.id_property;
        match self.check_property(property).await? {
            PropertyCheck::Numeric => Ok(()),
            PropertyCheck::Missing => Err(ReconcileError::PropertyMissing {
                property: property.clone(),
            }),
            PropertyCheck::WrongType(actual) => Err(ReconcileError::PropertyNotNumeric {
                property: property.clone(),
                actual,
            }),
        }
    }
}
