//! Warm-water share of the heating energy (HeizKV §9).

use rust_decimal::Decimal;

use super::error::BillingError;
use super::money::{percent_of, ratio, round2, round6, HUNDRED};
use super::rates::split_costs;
use super::types::{CostSplit, WarmWaterCalc};

/// kWh per m³ and K.
pub const CONSTANT_FACTOR: Decimal = Decimal::from_parts(25, 0, 0, false, 1);
pub const TEMP_HIGH: Decimal = Decimal::from_parts(60, 0, 0, false, 0);
pub const TEMP_LOW: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
pub const CONVERSION_FACTOR: Decimal = Decimal::from_parts(115, 0, 0, false, 2);

/// `2.5 × V × (60 − 10) / 1.15`, rounded to two places.
pub fn warm_water_energy_kwh(volume_m3: Decimal) -> Decimal {
    round2(CONSTANT_FACTOR * volume_m3 * (TEMP_HIGH - TEMP_LOW) / CONVERSION_FACTOR)
}

#[derive(Debug, Clone, Copy)]
pub struct WarmWaterInput {
    pub volume_m3: Decimal,
    pub total_energy_kwh: Decimal,
    pub heating_cost_total: Decimal,
    pub distribution_cost_total: Decimal,
    /// Fixed device rental; a share of the distribution costs when `None`.
    pub device_rental: Option<Decimal>,
    pub total_living_space_m2: Decimal,
    pub split: CostSplit,
}

pub fn compute_warm_water(input: &WarmWaterInput) -> Result<WarmWaterCalc, BillingError> {
    let energy_kwh = warm_water_energy_kwh(input.volume_m3);
    if energy_kwh > Decimal::ZERO && input.total_energy_kwh <= Decimal::ZERO {
        return Err(BillingError::incomplete("energy_total_kwh"));
    }

    let energy_share_percent =
        round2(ratio(energy_kwh, input.total_energy_kwh) * HUNDRED).min(HUNDRED);
    let cost_from_energy = round2(percent_of(energy_share_percent, input.heating_cost_total));
    let device_rental = input.device_rental.map(round2).unwrap_or_else(|| {
        round2(percent_of(energy_share_percent, input.distribution_cost_total))
    });
    let total_cost = round2(cost_from_energy + device_rental);
    let (base_cost_amount, consumption_cost_amount) = split_costs(total_cost, input.split);

    Ok(WarmWaterCalc {
        constant_factor: CONSTANT_FACTOR,
        volume_m3: input.volume_m3,
        temp_diff_high: TEMP_HIGH,
        temp_diff_low: TEMP_LOW,
        conversion_factor: CONVERSION_FACTOR,
        energy_kwh,
        energy_share_percent,
        cost_from_energy,
        device_rental,
        total_cost,
        base_cost_percent: input.split.base_cost_percent,
        base_cost_amount,
        base_cost_area: input.total_living_space_m2,
        base_cost_rate_per_m2: round6(ratio(base_cost_amount, input.total_living_space_m2)),
        consumption_cost_percent: input.split.consumption_cost_percent,
        consumption_cost_amount,
        consumption_cost_volume: input.volume_m3,
        consumption_cost_rate_per_m3: round6(ratio(consumption_cost_amount, input.volume_m3)),
    })
}
