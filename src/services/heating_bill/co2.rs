//! CO2 cost split (CO2KostAufG) and the energy consumption summary.

use rust_decimal::Decimal;

use super::money::{percent_of, ratio, round2};
use super::types::{
    Co2Allocation, Co2EnergyRow, Co2TierRow, EnergyInvoiceLine, EnergySummary,
    PrimaryEnergyFactor,
};
use super::warm_water::warm_water_energy_kwh;

pub const DEFAULT_ENERGY_CARRIER: &str = "Nah-/Fernwärme";

/// kWh/m² per year, reference value for residential buildings.
pub const NATIONAL_AVERAGE_KWH_PER_M2: Decimal = Decimal::from_parts(929, 0, 0, false, 1);

const KG_PER_TONNE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
const KWH_PER_MWH: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// kg CO2 per kWh.
pub fn emission_factor(energy_carrier: &str) -> Decimal {
    match energy_carrier.trim() {
        "Gas" | "Erdgas" => Decimal::from_parts(202, 0, 0, false, 3),
        "Öl" | "Heizöl" => Decimal::from_parts(266, 0, 0, false, 3),
        _ => Decimal::from_parts(2101, 0, 0, false, 4),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tier {
    min: u32,
    max: Option<u32>,
    tenant_percent: u32,
    landlord_percent: u32,
}

const fn tier(min: u32, max: Option<u32>, tenant_percent: u32) -> Tier {
    Tier {
        min,
        max,
        tenant_percent,
        landlord_percent: 100 - tenant_percent,
    }
}

const TIERS: [Tier; 10] = [
    tier(0, Some(12), 100),
    tier(12, Some(17), 90),
    tier(17, Some(22), 80),
    tier(22, Some(27), 70),
    tier(27, Some(32), 60),
    tier(32, Some(37), 50),
    tier(37, Some(42), 40),
    tier(42, Some(47), 30),
    tier(47, Some(52), 20),
    tier(52, None, 5),
];

impl Tier {
    fn contains(&self, emission_per_m2: Decimal) -> bool {
        emission_per_m2 >= Decimal::from(self.min)
            && self
                .max
                .map_or(true, |max| emission_per_m2 < Decimal::from(max))
    }

    fn range_label(&self) -> String {
        match (self.min, self.max) {
            (0, Some(max)) => format!("< {max} kg/m²/a"),
            (min, Some(max)) => format!("{min} bis < {max}"),
            (min, None) => format!("≥ {min}"),
        }
    }
}

fn selected_tier(emission_per_m2: Decimal) -> Tier {
    TIERS
        .iter()
        .copied()
        .find(|tier| tier.contains(emission_per_m2))
        .unwrap_or(TIERS[TIERS.len() - 1])
}

fn carrier_label(energy_carrier: Option<&str>) -> String {
    energy_carrier
        .map(str::trim)
        .filter(|carrier| !carrier.is_empty())
        .unwrap_or(DEFAULT_ENERGY_CARRIER)
        .to_string()
}

/// Emissions of the billed energy and the tenant/landlord split of their
/// cost. The cost is zero unless a CO2 price is configured.
pub fn compute_co2_allocation(
    energy_invoices: &[EnergyInvoiceLine],
    total_living_space_m2: Decimal,
    energy_carrier: Option<&str>,
    price_per_tonne: Option<Decimal>,
) -> Co2Allocation {
    let energy_carrier = carrier_label(energy_carrier);
    let factor = emission_factor(&energy_carrier);

    let energy_rows = energy_invoices
        .iter()
        .map(|line| Co2EnergyRow {
            label: line.label.clone(),
            date: line.date,
            kwh: line.kwh,
            co2_kg: round2(line.kwh * factor),
        })
        .collect::<Vec<_>>();
    let total_kwh = energy_invoices.iter().map(|line| line.kwh).sum::<Decimal>();
    let total_co2_kg = round2(total_kwh * factor);
    let emission_per_m2 = round2(ratio(total_co2_kg, total_living_space_m2));
    let selected = selected_tier(emission_per_m2);

    let classification_table = TIERS
        .iter()
        .map(|tier| Co2TierRow {
            range_label: tier.range_label(),
            tenant_percent: Decimal::from(tier.tenant_percent),
            landlord_percent: Decimal::from(tier.landlord_percent),
            is_highlighted: *tier == selected,
        })
        .collect();

    let building_total_cost = price_per_tonne
        .map(|price| round2(total_co2_kg / KG_PER_TONNE * price))
        .unwrap_or(Decimal::ZERO);
    let building_tenant_cost = round2(percent_of(
        Decimal::from(selected.tenant_percent),
        building_total_cost,
    ));

    Co2Allocation {
        energy_carrier,
        energy_rows,
        total_kwh,
        total_co2_kg,
        emission_factor_kg_per_kwh: factor,
        total_living_space_m2,
        emission_per_m2,
        classification_table,
        selected_tier_tenant_percent: Decimal::from(selected.tenant_percent),
        selected_tier_landlord_percent: Decimal::from(selected.landlord_percent),
        building_total_cost,
        building_tenant_cost,
        building_landlord_cost: building_total_cost - building_tenant_cost,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnitEnergy {
    pub heating_mwh: Decimal,
    pub warm_water_m3: Decimal,
    pub living_space_m2: Decimal,
}

pub fn compute_energy_summary(
    energy_carrier: Option<&str>,
    building_total_kwh: Decimal,
    total_living_space_m2: Decimal,
    unit: UnitEnergy,
) -> EnergySummary {
    let energy_carrier = carrier_label(energy_carrier);
    let factor = emission_factor(&energy_carrier);
    let heating_kwh = round2(unit.heating_mwh * KWH_PER_MWH);
    let warm_water_kwh = warm_water_energy_kwh(unit.warm_water_m3);
    let total_unit_kwh = round2(heating_kwh + warm_water_kwh);

    EnergySummary {
        energy_carrier,
        total_kwh: building_total_kwh,
        co2_emission_factor: factor,
        total_co2_kg: round2(building_total_kwh * factor),
        primary_energy_factors: vec![PrimaryEnergyFactor {
            label: "Heizwerke und fossile Brennstoffe".to_string(),
            value: Decimal::from_parts(13, 0, 0, false, 1),
        }],
        heating_kwh,
        warm_water_kwh,
        total_unit_kwh,
        living_space_m2: unit.living_space_m2,
        kwh_per_m2: round2(ratio(total_unit_kwh, unit.living_space_m2)),
        national_average_kwh_per_m2: NATIONAL_AVERAGE_KWH_PER_M2,
        property_average_kwh_per_m2: round2(ratio(building_total_kwh, total_living_space_m2)),
    }
}
