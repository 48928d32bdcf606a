//! Per-unit and per-tenant shares of the building costs.
//!
//! Every building amount is split with [`allocate_cents`], so unit rows add
//! up to the building totals to the cent, and tenant rows plus the vacancy
//! share add up to the unit total.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::costs::DirectCharge;
use super::error::BillingError;
use super::interval::{overlap_days, overlap_months, DateInterval};
use super::money::{allocate_cents, round2, round6};
use super::readings::{
    consumption_by_unit, device_deltas, device_row, readings_for_unit, total_consumption,
    Consumption, DeviceDelta,
};
use super::types::{
    AllocationKey, Co2Allocation, ColdWaterCalc, Contract, HeatingCalc, MeterKind,
    RawBillingInputs, TenantShare, Unit, UnitAllocation, UnitCostLine, WarmWaterCalc,
};

pub struct AllocationInput<'a> {
    pub inputs: &'a RawBillingInputs,
    pub period: DateInterval,
    pub heating: &'a HeatingCalc,
    pub warm_water: &'a WarmWaterCalc,
    pub cold_water: &'a ColdWaterCalc,
    pub direct_charges: &'a [DirectCharge],
    pub co2: &'a Co2Allocation,
    /// Building-wide device deltas over the billing period.
    pub deltas: &'a [DeviceDelta],
}

fn split_or_incomplete(
    total: Decimal,
    weights: &[Decimal],
    field: &str,
) -> Result<Vec<Decimal>, BillingError> {
    if total.is_zero() {
        return Ok(vec![Decimal::ZERO; weights.len()]);
    }
    allocate_cents(total, weights).ok_or_else(|| BillingError::incomplete(field))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    Days,
    Metered(MeterKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Heating,
    WarmWater,
    ColdWater,
    Direct,
}

struct Component {
    amount: Decimal,
    basis: Basis,
    bucket: Bucket,
}

struct Tenancy<'a> {
    contract: &'a Contract,
    interval: DateInterval,
    usage: Consumption,
}

pub fn allocate_units(input: &AllocationInput<'_>) -> Result<Vec<UnitAllocation>, BillingError> {
    let units = &input.inputs.units;
    if units.is_empty() {
        return Ok(Vec::new());
    }

    let by_unit = consumption_by_unit(input.deltas, &input.inputs.unit_meters);
    let usage_of = |unit: &Unit| by_unit.get(&unit.id).copied().unwrap_or_default();
    let living = units
        .iter()
        .map(Unit::living_space_or_zero)
        .collect::<Vec<_>>();
    let metered = |kind: MeterKind| {
        units
            .iter()
            .map(|unit| usage_of(unit).get(kind))
            .collect::<Vec<_>>()
    };
    let per_unit = vec![Decimal::ONE; units.len()];

    let heating_base =
        split_or_incomplete(input.heating.base_cost_amount, &living, "living_space")?;
    let heating_consumption = split_or_incomplete(
        input.heating.consumption_cost_amount,
        &metered(MeterKind::Heat),
        "heat_meter_readings",
    )?;
    let warm_water_base =
        split_or_incomplete(input.warm_water.base_cost_amount, &living, "living_space")?;
    let warm_water_consumption = split_or_incomplete(
        input.warm_water.consumption_cost_amount,
        &metered(MeterKind::WarmWater),
        "warm_water_meter_readings",
    )?;

    let cold_water_volumes = metered(MeterKind::ColdWater);
    let mut cold_water_items = Vec::with_capacity(input.cold_water.rate_items.len());
    for item in &input.cold_water.rate_items {
        let shares = match item.key {
            AllocationKey::Consumption | AllocationKey::Direct => split_or_incomplete(
                item.total_cost,
                &cold_water_volumes,
                "cold_water_meter_readings",
            )?,
            AllocationKey::LivingSpace => {
                split_or_incomplete(item.total_cost, &living, "living_space")?
            }
            AllocationKey::PerUnit => split_or_incomplete(item.total_cost, &per_unit, "units")?,
        };
        cold_water_items.push((item, shares));
    }

    let co2_tenant =
        split_or_incomplete(input.co2.building_tenant_cost, &living, "living_space")?;
    let co2_landlord =
        split_or_incomplete(input.co2.building_landlord_cost, &living, "living_space")?;

    let mut direct_by_unit: BTreeMap<&str, Vec<UnitCostLine>> = BTreeMap::new();
    for charge in input.direct_charges {
        if !units.iter().any(|unit| unit.id == charge.unit_id) {
            return Err(BillingError::incomplete("direct_unit_id"));
        }
        direct_by_unit
            .entry(charge.unit_id.as_str())
            .or_default()
            .push(UnitCostLine {
                label: charge.label.clone(),
                amount: charge.amount,
            });
    }

    let mut allocations = Vec::with_capacity(units.len());
    for (index, unit) in units.iter().enumerate() {
        let usage = usage_of(unit);
        let cold_water_lines = cold_water_items
            .iter()
            .map(|(item, shares)| UnitCostLine {
                label: item.label.clone(),
                amount: shares[index],
            })
            .collect::<Vec<_>>();
        let direct_items = direct_by_unit.remove(unit.id.as_str()).unwrap_or_default();

        let mut components = vec![
            Component {
                amount: heating_base[index],
                basis: Basis::Days,
                bucket: Bucket::Heating,
            },
            Component {
                amount: heating_consumption[index],
                basis: Basis::Metered(MeterKind::Heat),
                bucket: Bucket::Heating,
            },
            Component {
                amount: warm_water_base[index],
                basis: Basis::Days,
                bucket: Bucket::WarmWater,
            },
            Component {
                amount: warm_water_consumption[index],
                basis: Basis::Metered(MeterKind::WarmWater),
                bucket: Bucket::WarmWater,
            },
        ];
        for (item, shares) in &cold_water_items {
            let basis = match item.key {
                AllocationKey::Consumption | AllocationKey::Direct => {
                    Basis::Metered(MeterKind::ColdWater)
                }
                AllocationKey::LivingSpace | AllocationKey::PerUnit => Basis::Days,
            };
            components.push(Component {
                amount: shares[index],
                basis,
                bucket: Bucket::ColdWater,
            });
        }
        for line in &direct_items {
            components.push(Component {
                amount: line.amount,
                basis: Basis::Days,
                bucket: Bucket::Direct,
            });
        }

        let tenancies = tenancies_for_unit(input, unit);
        let (tenants, vacancy_cost) =
            split_across_tenancies(&components, &tenancies, &input.period, usage);

        let heating_total = heating_base[index] + heating_consumption[index];
        let warm_water_total = warm_water_base[index] + warm_water_consumption[index];
        let cold_water_total = cold_water_lines.iter().map(|line| line.amount).sum::<Decimal>();
        let direct_total = direct_items.iter().map(|line| line.amount).sum::<Decimal>();

        let devices = input
            .deltas
            .iter()
            .filter(|delta| {
                input.inputs.unit_for_device(&delta.device_id) == Some(unit.id.as_str())
            })
            .map(device_row)
            .collect();

        allocations.push(UnitAllocation {
            unit_id: unit.id.clone(),
            label: unit.display_label(),
            living_space_m2: unit.living_space_or_zero(),
            heating_mwh: round6(usage.heat_mwh()),
            warm_water_m3: usage.warm_water_m3,
            cold_water_m3: usage.cold_water_m3,
            heating_base_cost: heating_base[index],
            heating_consumption_cost: heating_consumption[index],
            heating_total,
            warm_water_base_cost: warm_water_base[index],
            warm_water_consumption_cost: warm_water_consumption[index],
            warm_water_total,
            cold_water_items: cold_water_lines,
            cold_water_total,
            direct_items,
            direct_total,
            co2_tenant_cost: co2_tenant[index],
            co2_landlord_cost: co2_landlord[index],
            total_cost: heating_total + warm_water_total + cold_water_total + direct_total,
            tenants,
            vacancy_cost,
            devices,
        });
    }

    Ok(allocations)
}

fn tenancies_for_unit<'a>(input: &AllocationInput<'a>, unit: &Unit) -> Vec<Tenancy<'a>> {
    let unit_readings =
        readings_for_unit(&input.inputs.readings, &input.inputs.unit_meters, &unit.id);
    let mut tenancies = input
        .inputs
        .contracts
        .iter()
        .filter(|contract| contract.unit_id == unit.id)
        .filter_map(|contract| {
            contract
                .interval_within(&input.period)
                .map(|interval| Tenancy {
                    contract,
                    interval,
                    usage: total_consumption(&device_deltas(&unit_readings, &interval)),
                })
        })
        .collect::<Vec<_>>();
    tenancies.sort_by_key(|tenancy| tenancy.interval.start);
    tenancies
}

/// Splits each component of a unit's cost over its tenancies. The last
/// weight is the vacancy: days without a tenancy, or metered consumption
/// no tenancy accounts for. Returns the tenant rows and the vacancy cost.
fn split_across_tenancies(
    components: &[Component],
    tenancies: &[Tenancy<'_>],
    period: &DateInterval,
    unit_usage: Consumption,
) -> (Vec<TenantShare>, Decimal) {
    let tenant_days = tenancies
        .iter()
        .map(|tenancy| Decimal::from(overlap_days(&tenancy.interval, period)))
        .collect::<Vec<_>>();
    let occupied_days = tenant_days.iter().copied().sum::<Decimal>();
    let vacancy_days = (Decimal::from(period.days()) - occupied_days).max(Decimal::ZERO);
    let day_weights = tenant_days
        .iter()
        .copied()
        .chain(std::iter::once(vacancy_days))
        .collect::<Vec<_>>();

    let mut rows = tenancies
        .iter()
        .map(|tenancy| {
            let months = overlap_months(&tenancy.interval, period);
            TenantShare {
                contract_id: tenancy.contract.id.clone(),
                tenant_names: tenancy.contract.tenant_names(),
                start: Some(tenancy.interval.start),
                end: Some(tenancy.interval.end),
                days: tenancy.interval.days(),
                months,
                advance_payments: round2(
                    tenancy.contract.additional_costs.unwrap_or(Decimal::ZERO)
                        * Decimal::from(months),
                ),
                ..TenantShare::default()
            }
        })
        .collect::<Vec<_>>();
    let mut vacancy_cost = Decimal::ZERO;

    for component in components {
        if component.amount.is_zero() {
            continue;
        }
        let weights = match component.basis {
            Basis::Days => day_weights.clone(),
            Basis::Metered(kind) => {
                let tenant_usage = tenancies
                    .iter()
                    .map(|tenancy| tenancy.usage.get(kind))
                    .collect::<Vec<_>>();
                let unaccounted =
                    (unit_usage.get(kind) - tenant_usage.iter().copied().sum::<Decimal>())
                        .max(Decimal::ZERO);
                let metered = tenant_usage
                    .into_iter()
                    .chain(std::iter::once(unaccounted))
                    .collect::<Vec<_>>();
                if metered.iter().all(|weight| *weight <= Decimal::ZERO) {
                    day_weights.clone()
                } else {
                    metered
                }
            }
        };
        let Some(shares) = allocate_cents(component.amount, &weights) else {
            vacancy_cost += component.amount;
            continue;
        };
        let (vacancy_share, tenant_shares) = match shares.split_last() {
            Some((last, rest)) => (*last, rest),
            None => continue,
        };
        vacancy_cost += vacancy_share;
        for (row, share) in rows.iter_mut().zip(tenant_shares) {
            match component.bucket {
                Bucket::Heating => row.heating_cost += *share,
                Bucket::WarmWater => row.warm_water_cost += *share,
                Bucket::ColdWater => row.cold_water_cost += *share,
                Bucket::Direct => row.direct_cost += *share,
            }
        }
    }

    for row in &mut rows {
        row.total_cost =
            row.heating_cost + row.warm_water_cost + row.cold_water_cost + row.direct_cost;
        row.balance = row.advance_payments - row.total_cost;
    }
    (rows, vacancy_cost)
}
