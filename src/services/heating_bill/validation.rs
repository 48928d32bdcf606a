//! Reconciliation checks on a computed model.
//!
//! Total mismatches are errors and block finalizing the bill. Percentage
//! splits that do not add up to 100 are warnings only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{approx_eq, HUNDRED};
use super::types::{HeatingBillModel, UnitAllocation};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate_model(model: &HeatingBillModel) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let calc = &model.building_calc;

    let computed_grand_total = calc.heating_cost_total + calc.distribution_cost_total;
    if !approx_eq(computed_grand_total, calc.grand_total) {
        errors.push(format!(
            "Grand total mismatch: heatingCostTotal ({}) + distributionCostTotal ({}) = {}, expected {}",
            calc.heating_cost_total,
            calc.distribution_cost_total,
            computed_grand_total,
            calc.grand_total
        ));
    }

    let warm_water = &calc.warm_water;
    let warm_water_computed = warm_water.cost_from_energy + warm_water.device_rental;
    if !approx_eq(warm_water_computed, warm_water.total_cost) {
        errors.push(format!(
            "Warm water total mismatch: costFromEnergy + deviceRental = {}, expected {}",
            warm_water_computed, warm_water.total_cost
        ));
    }

    let heating = &calc.heating;
    let heating_computed = heating.energy_total - heating.minus_warm_water + heating.device_rental;
    if !approx_eq(heating_computed, heating.total_cost) {
        errors.push(format!(
            "Heating total mismatch: energyTotal - minusWarmWater + deviceRental = {}, expected {}",
            heating_computed, heating.total_cost
        ));
    }

    let warm_water_percent = warm_water.base_cost_percent + warm_water.consumption_cost_percent;
    if warm_water_percent != HUNDRED {
        warnings.push(format!(
            "Warm water base+consumption = {warm_water_percent}%, expected 100%"
        ));
    }
    let heating_percent = heating.base_cost_percent + heating.consumption_cost_percent;
    if heating_percent != HUNDRED {
        warnings.push(format!(
            "Heating base+consumption = {heating_percent}%, expected 100%"
        ));
    }

    if !model.units.is_empty() {
        check_unit_rows(model, &mut errors);
    }

    for error in &errors {
        tracing::warn!(error = %error, "Heating bill reconciliation error");
    }
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Heating bill reconciliation warning");
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn check_unit_rows(model: &HeatingBillModel, errors: &mut Vec<String>) {
    let calc = &model.building_calc;
    let units_heating = model
        .units
        .iter()
        .map(|unit| unit.heating_total + unit.warm_water_total)
        .sum::<Decimal>();
    if !approx_eq(units_heating, calc.grand_total) {
        errors.push(format!(
            "Unit heating and warm water costs add up to {}, expected grandTotal {}",
            units_heating, calc.grand_total
        ));
    }

    let units_cold_water = model
        .units
        .iter()
        .map(|unit| unit.cold_water_total)
        .sum::<Decimal>();
    if !approx_eq(units_cold_water, model.cold_water.total_cost) {
        errors.push(format!(
            "Unit cold water costs add up to {}, expected {}",
            units_cold_water, model.cold_water.total_cost
        ));
    }

    for unit in &model.units {
        let shared = tenant_total(unit) + unit.vacancy_cost;
        if !approx_eq(shared, unit.total_cost) {
            errors.push(format!(
                "Unit {}: tenant shares plus vacancy = {}, expected {}",
                unit.label, shared, unit.total_cost
            ));
        }
    }
}

fn tenant_total(unit: &UnitAllocation) -> Decimal {
    unit.tenants.iter().map(|tenant| tenant.total_cost).sum()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::validate_model;
    use crate::services::heating_bill::types::{
        BuildingCalc, ColdWaterCalc, Co2Allocation, Cover, EnergySummary, HeatingBillModel,
        HeatingCalc, TenantShare, UnitAllocation, WarmWaterCalc,
    };

    fn model(building_calc: BuildingCalc) -> HeatingBillModel {
        HeatingBillModel {
            cover: Cover::default(),
            building_calc,
            cold_water: ColdWaterCalc::default(),
            units: Vec::new(),
            co2: Co2Allocation::default(),
            energy_summary: EnergySummary::default(),
        }
    }

    fn scenario() -> BuildingCalc {
        BuildingCalc {
            heating_cost_total: dec!(800.00),
            distribution_cost_total: dec!(200.00),
            grand_total: dec!(1000.00),
            warm_water: WarmWaterCalc {
                cost_from_energy: dec!(150),
                device_rental: dec!(20),
                total_cost: dec!(170),
                base_cost_percent: dec!(40),
                consumption_cost_percent: dec!(60),
                ..WarmWaterCalc::default()
            },
            heating: HeatingCalc {
                energy_total: dec!(700),
                minus_warm_water: dec!(150),
                device_rental: dec!(30),
                total_cost: dec!(580),
                base_cost_percent: dec!(30),
                consumption_cost_percent: dec!(70),
                ..HeatingCalc::default()
            },
            ..BuildingCalc::default()
        }
    }

    #[test]
    fn consistent_model_is_valid() {
        let result = validate_model(&model(scenario()));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn grand_total_beyond_two_cents_is_an_error() {
        let result = validate_model(&model(BuildingCalc {
            heating_cost_total: dec!(1000.00),
            distribution_cost_total: dec!(500.00),
            grand_total: dec!(1500.03),
            ..scenario()
        }));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Grand total mismatch"));
    }

    #[test]
    fn two_cents_is_within_tolerance() {
        let result = validate_model(&model(BuildingCalc {
            heating_cost_total: dec!(1000.00),
            distribution_cost_total: dec!(500.00),
            grand_total: dec!(1500.02),
            ..scenario()
        }));
        assert!(result.valid);
    }

    #[test]
    fn percentage_mismatch_only_warns() {
        let mut calc = scenario();
        calc.warm_water.consumption_cost_percent = dec!(50);
        calc.heating.base_cost_percent = dec!(50);
        let result = validate_model(&model(calc));
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![
                "Warm water base+consumption = 90%, expected 100%".to_string(),
                "Heating base+consumption = 120%, expected 100%".to_string(),
            ]
        );
    }

    #[test]
    fn broken_sub_totals_are_errors() {
        let mut calc = scenario();
        calc.warm_water.total_cost = dec!(175);
        calc.heating.total_cost = dec!(570);
        let result = validate_model(&model(calc));
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn unit_rows_must_add_up() {
        let mut broken = model(scenario());
        broken.units = vec![UnitAllocation {
            unit_id: "u1".to_string(),
            label: "EG".to_string(),
            heating_total: dec!(580),
            warm_water_total: dec!(170),
            total_cost: dec!(750),
            tenants: vec![TenantShare {
                total_cost: dec!(700),
                ..TenantShare::default()
            }],
            vacancy_cost: dec!(40),
            ..UnitAllocation::default()
        }];
        let result = validate_model(&broken);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("expected grandTotal 1000.00"));
        assert!(result.errors[1].starts_with("Unit EG"));
    }
}
