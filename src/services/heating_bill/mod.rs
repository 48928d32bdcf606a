//! Heating cost bill engine: fetch the raw rows of a billing document,
//! compute the bill model and reconcile its totals.

pub mod allocation;
pub mod co2;
pub mod cold_water;
pub mod compute;
pub mod costs;
pub mod error;
pub mod fetcher;
pub mod fixtures;
pub mod interval;
pub mod money;
pub mod rates;
pub mod readings;
pub mod types;
pub mod validation;
pub mod warm_water;

pub use compute::compute_heating_bill;
pub use error::BillingError;
pub use fetcher::fetch_heating_bill_data;
pub use fixtures::{mock_heating_bill_model, preview_props_to_model, PreviewProps};
pub use types::{BillingConfig, CostSplit, HeatingBillModel, RawBillingInputs};
pub use validation::{validate_model, ValidationResult};
