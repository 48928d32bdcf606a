use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::services::heating_bill::types::AllocationKey;
use crate::services::heating_bill::{BillingConfig, CostSplit, RawBillingInputs};

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct HeatingBillPath {
    #[validate(length(min = 1, max = 64))]
    pub document_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize, Validate)]
pub struct HeatingBillQuery {
    #[validate(length(min = 1, max = 64))]
    pub unit_id: Option<String>,
}

/// Request-level billing parameters. Only the fields that are present
/// replace the server and document defaults.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct BillingConfigInput {
    #[validate(custom(function = "validate_split"))]
    pub heating_split: Option<CostSplit>,
    #[validate(custom(function = "validate_split"))]
    pub warm_water_split: Option<CostSplit>,
    #[validate(custom(function = "validate_non_negative"))]
    pub warm_water_device_rental: Option<Decimal>,
    pub allocation_keys: Option<BTreeMap<String, AllocationKey>>,
    #[validate(custom(function = "validate_non_negative"))]
    pub co2_price_per_tonne: Option<Decimal>,
}

impl BillingConfigInput {
    pub fn apply(&self, base: BillingConfig) -> BillingConfig {
        let mut config = base;
        if let Some(split) = self.heating_split {
            config.heating_split = split;
        }
        if let Some(split) = self.warm_water_split {
            config.warm_water_split = split;
        }
        if self.warm_water_device_rental.is_some() {
            config.warm_water_device_rental = self.warm_water_device_rental;
        }
        if let Some(keys) = &self.allocation_keys {
            config.allocation_keys.extend(keys.clone());
        }
        if self.co2_price_per_tonne.is_some() {
            config.co2_price_per_tonne = self.co2_price_per_tonne;
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComputeHeatingBillInput {
    pub inputs: RawBillingInputs,
    #[serde(default)]
    #[validate(nested)]
    pub config: Option<BillingConfigInput>,
    #[serde(default, alias = "unit_id")]
    #[validate(length(min = 1, max = 64))]
    pub target_unit_id: Option<String>,
}

fn validate_split(split: &CostSplit) -> Result<(), ValidationError> {
    let in_range = |value: Decimal| value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED;
    if in_range(split.base_cost_percent) && in_range(split.consumption_cost_percent) {
        Ok(())
    } else {
        Err(ValidationError::new("percent_out_of_range"))
    }
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}
