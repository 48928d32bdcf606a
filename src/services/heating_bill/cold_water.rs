use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::costs::normalize_cost_type;
use super::money::{ratio, round2, round6};
use super::types::{AllocationKey, ColdWaterCalc, ColdWaterRateItem, CostInvoice, RateUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColdWaterSubtype {
    pub label: &'static str,
    pub default_key: AllocationKey,
}

const COLD_WATER: ColdWaterSubtype = ColdWaterSubtype {
    label: "Kaltwasser",
    default_key: AllocationKey::Consumption,
};
const SEWAGE: ColdWaterSubtype = ColdWaterSubtype {
    label: "Abwasser Gesamt",
    default_key: AllocationKey::Consumption,
};
const DEVICE_RENTAL: ColdWaterSubtype = ColdWaterSubtype {
    label: "Gerätemiete Kaltwasser",
    default_key: AllocationKey::Consumption,
};
const BILLING: ColdWaterSubtype = ColdWaterSubtype {
    label: "Abrechnung Kaltwasser",
    default_key: AllocationKey::PerUnit,
};

/// Subtype by keyword in cost type, purpose or document name.
pub fn subtype_for(invoice: &CostInvoice) -> ColdWaterSubtype {
    let combined = format!(
        "{} {} {}",
        normalize_cost_type(invoice.cost_type.as_deref()),
        invoice.purpose.as_deref().unwrap_or_default().to_lowercase(),
        invoice.document_name.as_deref().unwrap_or_default().to_lowercase()
    );
    if combined.contains("abwasser") || combined.contains("sewage") {
        SEWAGE
    } else if ["gerätemiete", "geratemiete", "device_rental", "miete"]
        .iter()
        .any(|keyword| combined.contains(keyword))
    {
        DEVICE_RENTAL
    } else if combined.contains("abrechnung") || combined.contains("billing") {
        BILLING
    } else {
        COLD_WATER
    }
}

/// Key for an invoice: explicit key on the invoice, then the configured
/// override for its cost type, then the subtype default.
pub fn allocation_key_for(
    invoice: &CostInvoice,
    overrides: &BTreeMap<String, AllocationKey>,
) -> AllocationKey {
    let subtype = subtype_for(invoice);
    invoice
        .allocation_key
        .or_else(|| {
            overrides
                .get(&normalize_cost_type(invoice.cost_type.as_deref()))
                .copied()
        })
        .filter(|key| *key != AllocationKey::Direct)
        .unwrap_or(subtype.default_key)
}

#[derive(Debug, Clone, Copy)]
pub struct ColdWaterBasis {
    pub total_volume_m3: Decimal,
    pub unit_count: usize,
    pub total_living_space_m2: Decimal,
}

/// Groups cold-water invoices into rate items (one per subtype and key)
/// and derives a rate for each.
pub fn compute_cold_water(
    invoices: &[CostInvoice],
    basis: &ColdWaterBasis,
    overrides: &BTreeMap<String, AllocationKey>,
) -> ColdWaterCalc {
    let mut grouped: Vec<(ColdWaterSubtype, AllocationKey, Decimal)> = Vec::new();
    for invoice in invoices {
        let subtype = subtype_for(invoice);
        let key = allocation_key_for(invoice, overrides);
        let amount = round2(invoice.amount());
        let slot = grouped
            .iter_mut()
            .find(|(existing, existing_key, _)| {
                existing.label == subtype.label && *existing_key == key
            });
        match slot {
            Some((_, _, total)) => *total += amount,
            None => grouped.push((subtype, key, amount)),
        }
    }

    let rate_items = grouped
        .into_iter()
        .map(|(subtype, key, total_cost)| {
            let (unit, total_quantity, rate) = match key {
                AllocationKey::PerUnit => {
                    let units = Decimal::from(basis.unit_count);
                    (RateUnit::UsageUnit, units, round2(ratio(total_cost, units)))
                }
                AllocationKey::LivingSpace => (
                    RateUnit::SquareMetre,
                    basis.total_living_space_m2,
                    round6(ratio(total_cost, basis.total_living_space_m2)),
                ),
                AllocationKey::Consumption | AllocationKey::Direct => (
                    RateUnit::CubicMetre,
                    basis.total_volume_m3,
                    round6(ratio(total_cost, basis.total_volume_m3)),
                ),
            };
            ColdWaterRateItem {
                label: subtype.label.to_string(),
                key,
                unit,
                total_cost,
                total_quantity,
                rate,
            }
        })
        .collect::<Vec<_>>();

    ColdWaterCalc {
        total_cost: round2(rate_items.iter().map(|item| item.total_cost).sum()),
        total_volume_m3: basis.total_volume_m3,
        rate_items,
    }
}
