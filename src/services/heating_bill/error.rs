use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("Invalid billing document id '{0}'.")]
    InvalidDocumentId(String),
    #[error("{entity} '{id}' not found.")]
    NotFound { entity: &'static str, id: String },
    /// Non-fatal: the unit has no meter rows for the period. Callers show an
    /// empty state instead of an error.
    #[error("No meter readings for unit '{unit_id}' in the billing period.")]
    NoData { unit_id: String },
    #[error("Incomplete billing data: missing {field}.")]
    IncompleteData { field: String },
    #[error("Invalid billing period: start {start} is after end {end}.")]
    InvalidPeriod { start: String, end: String },
    #[error("Billing data source unavailable: {0}")]
    DataSourceUnavailable(String),
}

impl BillingError {
    pub fn incomplete(field: impl Into<String>) -> Self {
        Self::IncompleteData {
            field: field.into(),
        }
    }
}
