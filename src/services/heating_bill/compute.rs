//! Raw rows in, finished bill model out. Pure and synchronous.

use rust_decimal::Decimal;

use super::allocation::{allocate_units, AllocationInput};
use super::co2::{compute_co2_allocation, compute_energy_summary, UnitEnergy};
use super::cold_water::{compute_cold_water, ColdWaterBasis};
use super::costs::{aggregate_invoice_costs, CostAggregation};
use super::error::BillingError;
use super::interval::{overlap_months, DateInterval};
use super::money::round2;
use super::rates::{compute_heating_rates, HeatingInput};
use super::readings::{device_deltas, total_consumption, unassigned_devices};
use super::types::{
    BillingConfig, BillingPeriod, BuildingCalc, ContractorRef, Cover, HeatingBillModel,
    HeatingCalc, RawBillingInputs, UnitAllocation, WarmWaterCalc,
};
use super::warm_water::{compute_warm_water, WarmWaterInput};

/// Computes the bill for the whole building, or with `target_unit_id` the
/// cover and energy summary of a single unit. Building sections and the
/// unit rows are always computed for every unit.
///
/// `config` is final: document and request overrides are applied by the
/// caller.
pub fn compute_heating_bill(
    inputs: &RawBillingInputs,
    config: &BillingConfig,
    target_unit_id: Option<&str>,
) -> Result<HeatingBillModel, BillingError> {
    let period = inputs.document.period()?;
    let interval = period.interval();

    if let Some(unit_id) = target_unit_id {
        if !inputs.units.iter().any(|unit| unit.id == unit_id) {
            return Err(BillingError::NotFound {
                entity: "unit",
                id: unit_id.to_string(),
            });
        }
    }

    let deltas = device_deltas(&inputs.readings, &interval);
    let unassigned = unassigned_devices(&deltas, &inputs.unit_meters);
    if !unassigned.is_empty() {
        tracing::warn!(
            document_id = %inputs.document.id,
            devices = ?unassigned,
            "Meter devices without unit assignment count only towards building totals"
        );
    }
    let consumption = total_consumption(&deltas);
    let total_living_space = inputs.total_living_space();

    let costs = aggregate_invoice_costs(&inputs.invoices, consumption.heat_kwh())?;

    let warm_water = compute_warm_water(&WarmWaterInput {
        volume_m3: consumption.warm_water_m3,
        total_energy_kwh: costs.energy_total_kwh,
        heating_cost_total: costs.heating_cost_total,
        distribution_cost_total: costs.distribution_cost_total,
        device_rental: config.warm_water_device_rental,
        total_living_space_m2: total_living_space,
        split: config.warm_water_split,
    })?;

    let heating = compute_heating_rates(&HeatingInput {
        heating_cost_total: costs.heating_cost_total,
        distribution_cost_total: costs.distribution_cost_total,
        warm_water: &warm_water,
        consumption_mwh: consumption.heat_mwh(),
        total_living_space_m2: total_living_space,
        split: config.heating_split,
    });

    let cold_water = compute_cold_water(
        &costs.cold_water_invoices,
        &ColdWaterBasis {
            total_volume_m3: consumption.cold_water_m3,
            unit_count: inputs.units.len(),
            total_living_space_m2: total_living_space,
        },
        &config.allocation_keys,
    );

    let co2 = compute_co2_allocation(
        &costs.energy_invoices,
        total_living_space,
        inputs.building.energy_carrier.as_deref(),
        config.co2_price_per_tonne,
    );

    let units = allocate_units(&AllocationInput {
        inputs,
        period: interval,
        heating: &heating,
        warm_water: &warm_water,
        cold_water: &cold_water,
        direct_charges: &costs.direct_charges,
        co2: &co2,
        deltas: &deltas,
    })?;

    let target = target_unit_id.and_then(|id| units.iter().find(|unit| unit.unit_id == id));
    let energy_summary = compute_energy_summary(
        inputs.building.energy_carrier.as_deref(),
        costs.energy_total_kwh,
        total_living_space,
        target.map_or_else(UnitEnergy::default, |unit| UnitEnergy {
            heating_mwh: unit.heating_mwh,
            warm_water_m3: unit.warm_water_m3,
            living_space_m2: unit.living_space_m2,
        }),
    );

    let cover = build_cover(
        inputs,
        &period,
        &units,
        target_unit_id,
        &costs,
        cold_water.total_cost,
    );

    tracing::debug!(
        document_id = %inputs.document.id,
        units = units.len(),
        grand_total = %costs.grand_total,
        "Heating bill computed"
    );

    Ok(HeatingBillModel {
        cover,
        building_calc: building_calc(costs, warm_water, heating),
        cold_water,
        units,
        co2,
        energy_summary,
    })
}

fn building_calc(
    costs: CostAggregation,
    warm_water: WarmWaterCalc,
    heating: HeatingCalc,
) -> BuildingCalc {
    BuildingCalc {
        energy_invoices: costs.energy_invoices,
        energy_relief: costs.energy_relief,
        energy_total_kwh: costs.energy_total_kwh,
        energy_total_amount: costs.energy_total_amount,
        heating_cost_items: costs.heating_cost_items,
        heating_cost_carry_over: costs.heating_cost_carry_over,
        heating_cost_total: costs.heating_cost_total,
        distribution_cost_items: costs.distribution_cost_items,
        distribution_cost_total: costs.distribution_cost_total,
        grand_total: costs.grand_total,
        direct_cost_total: costs.direct_cost_total,
        warm_water,
        heating,
    }
}

fn build_cover(
    inputs: &RawBillingInputs,
    period: &BillingPeriod,
    units: &[UnitAllocation],
    target_unit_id: Option<&str>,
    costs: &CostAggregation,
    cold_water_total: Decimal,
) -> Cover {
    let interval = period.interval();
    let in_scope = |unit_id: &str| target_unit_id.map_or(true, |target| target == unit_id);

    let tenancies = inputs
        .contracts
        .iter()
        .filter(|contract| in_scope(&contract.unit_id))
        .filter_map(|contract| {
            contract
                .interval_within(&interval)
                .map(|within| (contract, within))
        })
        .collect::<Vec<_>>();

    let contractors = tenancies
        .iter()
        .flat_map(|(contract, _)| contract.contractors.iter())
        .map(|contractor| ContractorRef {
            id: contractor.id.clone(),
            first_name: contractor.first_name.clone(),
            last_name: contractor.last_name.clone(),
        })
        .collect::<Vec<_>>();
    let contractors_names = tenancies
        .iter()
        .map(|(contract, _)| contract.tenant_names())
        .filter(|names| !names.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    // Usage period of a single unit shrinks to its tenancies.
    let usage = match target_unit_id {
        Some(_) if !tenancies.is_empty() => {
            let start = tenancies.iter().map(|(_, within)| within.start).min();
            let end = tenancies.iter().map(|(_, within)| within.end).max();
            start
                .zip(end)
                .and_then(|(start, end)| DateInterval::new(start, end))
                .unwrap_or(interval)
        }
        _ => interval,
    };

    let total_amount = if units.is_empty() {
        let advances = tenancies
            .iter()
            .map(|(contract, within)| {
                contract.additional_costs.unwrap_or(Decimal::ZERO)
                    * Decimal::from(overlap_months(within, &interval))
            })
            .sum::<Decimal>();
        round2(advances - (costs.grand_total + cold_water_total + costs.direct_cost_total))
    } else {
        units
            .iter()
            .filter(|unit| in_scope(&unit.unit_id))
            .flat_map(|unit| unit.tenants.iter())
            .map(|tenant| tenant.balance)
            .sum()
    };

    let (owner_first_name, owner_last_name) = inputs
        .owner
        .as_ref()
        .map(|owner| (owner.first_name.clone(), owner.last_name.clone()))
        .unwrap_or_default();

    Cover {
        owner_first_name,
        owner_last_name,
        contractors_names,
        contractors,
        street: inputs.building.street.clone(),
        zip: inputs.building.zip.clone(),
        created_at: inputs.document.created_at,
        billing_period_start: period.start,
        billing_period_end: period.end,
        usage_period_start: usage.start,
        usage_period_end: usage.end,
        total_amount,
    }
}
