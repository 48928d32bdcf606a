use rust_decimal::Decimal;

use super::money::{percent_of, ratio, round2, round6};
use super::types::{CostSplit, HeatingCalc, WarmWaterCalc};

/// Splits `total` into base and consumption amounts. The base part follows
/// its percentage and the consumption part takes the rest, so the two always
/// add back up to `total` even when the percentages do not sum to 100.
pub fn split_costs(total: Decimal, split: CostSplit) -> (Decimal, Decimal) {
    let base = round2(percent_of(split.base_cost_percent, total));
    (base, total - base)
}

#[derive(Debug, Clone, Copy)]
pub struct HeatingInput<'a> {
    pub heating_cost_total: Decimal,
    pub distribution_cost_total: Decimal,
    pub warm_water: &'a WarmWaterCalc,
    pub consumption_mwh: Decimal,
    pub total_living_space_m2: Decimal,
    pub split: CostSplit,
}

/// Space-heating costs: the heating cost total minus the warm-water energy
/// share, plus the distribution costs not already charged to warm water.
pub fn compute_heating_rates(input: &HeatingInput<'_>) -> HeatingCalc {
    let energy_total = input.heating_cost_total;
    let minus_warm_water = input.warm_water.cost_from_energy;
    let device_rental = round2(input.distribution_cost_total - input.warm_water.device_rental);
    let total_cost = round2(energy_total - minus_warm_water + device_rental);
    let (base_cost_amount, consumption_cost_amount) = split_costs(total_cost, input.split);
    let consumption_mwh = round6(input.consumption_mwh);

    HeatingCalc {
        energy_total,
        minus_warm_water,
        device_rental,
        total_cost,
        base_cost_percent: input.split.base_cost_percent,
        base_cost_amount,
        base_cost_area: input.total_living_space_m2,
        base_cost_rate_per_m2: round6(ratio(base_cost_amount, input.total_living_space_m2)),
        consumption_cost_percent: input.split.consumption_cost_percent,
        consumption_cost_amount,
        consumption_mwh,
        consumption_cost_rate_per_mwh: round6(ratio(consumption_cost_amount, consumption_mwh)),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{compute_heating_rates, split_costs, HeatingInput};
    use crate::services::heating_bill::types::{CostSplit, WarmWaterCalc};

    #[test]
    fn split_keeps_the_total_when_percentages_add_up() {
        let (base, consumption) = split_costs(dec!(100.01), CostSplit::default());
        assert_eq!(base, dec!(30.00));
        assert_eq!(consumption, dec!(70.01));
    }

    #[test]
    fn split_keeps_the_total_for_any_percentage_pair() {
        let pairs = [
            (dec!(40), dec!(50)),
            (dec!(50), dec!(50)),
            (dec!(30), dec!(80)),
            (dec!(0), dec!(100)),
            (dec!(100), dec!(0)),
            (dec!(33.33), dec!(66.67)),
        ];
        for (base_percent, consumption_percent) in pairs {
            let split = CostSplit {
                base_cost_percent: base_percent,
                consumption_cost_percent: consumption_percent,
            };
            for total in [dec!(200), dec!(100.01), dec!(10895.05)] {
                let (base, consumption) = split_costs(total, split);
                assert_eq!(base + consumption, total, "{base_percent}/{consumption_percent}");
            }
        }
        let (base, consumption) = split_costs(
            dec!(200),
            CostSplit {
                base_cost_percent: dec!(40),
                consumption_cost_percent: dec!(50),
            },
        );
        assert_eq!(base, dec!(80.00));
        assert_eq!(consumption, dec!(120.00));
    }

    #[test]
    fn removes_warm_water_share() {
        let warm_water = WarmWaterCalc {
            cost_from_energy: dec!(150),
            device_rental: dec!(20),
            total_cost: dec!(170),
            ..WarmWaterCalc::default()
        };
        let heating = compute_heating_rates(&HeatingInput {
            heating_cost_total: dec!(700),
            distribution_cost_total: dec!(50),
            warm_water: &warm_water,
            consumption_mwh: dec!(58),
            total_living_space_m2: dec!(200),
            split: CostSplit::default(),
        });
        assert_eq!(heating.minus_warm_water, dec!(150));
        assert_eq!(heating.device_rental, dec!(30));
        assert_eq!(heating.total_cost, dec!(580));
        assert_eq!(heating.base_cost_amount, dec!(174.00));
        assert_eq!(heating.consumption_cost_amount, dec!(406.00));
        assert_eq!(heating.base_cost_rate_per_m2, dec!(0.87));
        assert_eq!(heating.consumption_cost_rate_per_mwh, dec!(7));
        assert_eq!(heating.total_cost + warm_water.total_cost, dec!(750));
    }
}
