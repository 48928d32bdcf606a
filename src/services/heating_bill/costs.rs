use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::error::BillingError;
use super::money::{parse_decimal_str, round2, round6};
use super::types::{AllocationKey, CostInvoice, CostLine, EnergyInvoiceLine};

const ENERGY_COST_TYPES: &[&str] = &["fuel_costs", "brennstoffkosten"];

const HEATING_OPERATING_TYPES: &[&str] = &[
    "operating_current",
    "maintenance_costs",
    "chimney_sweep_costs",
    "other_operating_costs",
];

const ADJUSTMENT_COST_TYPES: &[&str] = &["carry_over", "uebertrag", "previous_period_adjustment"];

const DISTRIBUTION_COST_TYPES: &[&str] = &["metering_device_rental", "metering_service_costs"];

const COLD_WATER_COST_TYPES: &[&str] = &[
    "cold_water",
    "cold_water_device_rental",
    "abwasser",
    "cold_water_billing",
    "kaltwasser",
    "sewage",
    "gerätemiete_kaltwasser",
    "abrechnung_kaltwasser",
];

const IGNORED_COST_TYPES: &[&str] = &["heidi_systems_sd", "test_cost", "test_archived"];

static KWH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("hardcoded regex should be valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSection {
    Energy,
    HeatingOperating,
    Adjustment,
    Distribution,
    ColdWater,
    Ignored,
}

/// Lowercases and replaces whitespace with `_`, e.g. "Fuel Costs" -> "fuel_costs".
pub fn normalize_cost_type(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Unknown cost types are billed as heating operating costs ("Sonstige").
pub fn classify(cost_type: &str) -> CostSection {
    if IGNORED_COST_TYPES.contains(&cost_type) {
        CostSection::Ignored
    } else if ENERGY_COST_TYPES.contains(&cost_type) {
        CostSection::Energy
    } else if HEATING_OPERATING_TYPES.contains(&cost_type) {
        CostSection::HeatingOperating
    } else if ADJUSTMENT_COST_TYPES.contains(&cost_type) {
        CostSection::Adjustment
    } else if DISTRIBUTION_COST_TYPES.contains(&cost_type) {
        CostSection::Distribution
    } else if COLD_WATER_COST_TYPES.contains(&cost_type) {
        CostSection::ColdWater
    } else {
        CostSection::HeatingOperating
    }
}

/// Price-brake credits are booked on fuel invoices, either as a negative
/// amount or with "Preisbremse" in the purpose.
pub fn is_energy_relief(invoice: &CostInvoice) -> bool {
    invoice.amount() < Decimal::ZERO
        || invoice
            .purpose
            .as_deref()
            .is_some_and(|purpose| purpose.to_lowercase().contains("preisbremse"))
}

/// First number found in the notes, then the purpose of an energy invoice.
pub fn kwh_from_text(invoice: &CostInvoice) -> Option<Decimal> {
    let combined = format!(
        "{} {}",
        invoice.notes.as_deref().unwrap_or_default(),
        invoice.purpose.as_deref().unwrap_or_default()
    );
    let captured = KWH_PATTERN.captures(&combined)?.get(1)?.as_str();
    parse_decimal_str(captured).map(round6)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectCharge {
    pub invoice_id: String,
    pub unit_id: String,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostAggregation {
    pub energy_invoices: Vec<EnergyInvoiceLine>,
    pub energy_relief: Option<CostLine>,
    pub energy_total_kwh: Decimal,
    pub energy_total_amount: Decimal,
    pub heating_cost_items: Vec<CostLine>,
    pub heating_cost_carry_over: Decimal,
    pub heating_cost_total: Decimal,
    pub distribution_cost_items: Vec<CostLine>,
    pub distribution_cost_total: Decimal,
    pub grand_total: Decimal,
    pub cold_water_invoices: Vec<CostInvoice>,
    pub cold_water_total: Decimal,
    pub direct_charges: Vec<DirectCharge>,
    pub direct_cost_total: Decimal,
}

fn energy_label(invoice: &CostInvoice) -> String {
    [&invoice.document_name, &invoice.purpose]
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| {
            let short = invoice.id.chars().take(8).collect::<String>();
            format!("Rechnung {short}")
        })
}

fn operating_label(invoice: &CostInvoice, cost_type: &str) -> String {
    [invoice.purpose.as_deref(), invoice.document_name.as_deref(), Some(cost_type)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("Sonstige")
        .to_string()
}

/// Sorts invoices into the billing sections of the building calculation.
///
/// Heating and distribution costs are always split by base/consumption, so
/// an explicit key on those invoices has no effect.
fn ignored_allocation_key(section: CostSection, invoice: &CostInvoice) -> Option<AllocationKey> {
    match section {
        CostSection::ColdWater | CostSection::Ignored => None,
        _ => invoice
            .allocation_key
            .filter(|key| *key != AllocationKey::Direct),
    }
}

/// `metered_kwh` is the building heat-meter total; it stands in for the kWh
/// of the first energy invoice when that invoice carries none.
pub fn aggregate_invoice_costs(
    invoices: &[CostInvoice],
    metered_kwh: Decimal,
) -> Result<CostAggregation, BillingError> {
    let mut aggregation = CostAggregation::default();
    let mut relief_total = Decimal::ZERO;
    let mut relief_label: Option<String> = None;

    for invoice in invoices {
        let cost_type = normalize_cost_type(invoice.cost_type.as_deref());
        let section = classify(&cost_type);
        if section == CostSection::Ignored {
            continue;
        }
        let amount = round2(invoice.amount());

        if invoice.is_direct() {
            let unit_id = invoice
                .direct_unit_id
                .as_deref()
                .map(str::trim)
                .filter(|unit_id| !unit_id.is_empty())
                .ok_or_else(|| BillingError::incomplete("direct_unit_id"))?;
            aggregation.direct_charges.push(DirectCharge {
                invoice_id: invoice.id.clone(),
                unit_id: unit_id.to_string(),
                label: operating_label(invoice, &cost_type),
                amount,
            });
            aggregation.direct_cost_total += amount;
            continue;
        }

        if let Some(key) = ignored_allocation_key(section, invoice) {
            tracing::warn!(
                invoice_id = %invoice.id,
                cost_type = %cost_type,
                allocation_key = ?key,
                "Allocation key only applies to cold water costs; using base/consumption split"
            );
        }

        match section {
            CostSection::Energy if is_energy_relief(invoice) => {
                relief_total += amount;
                relief_label.get_or_insert_with(|| {
                    invoice
                        .purpose
                        .as_deref()
                        .map(str::trim)
                        .filter(|purpose| !purpose.is_empty())
                        .unwrap_or("Preisbremse Energie")
                        .to_string()
                });
            }
            CostSection::Energy => {
                let mut kwh = invoice
                    .kwh
                    .or_else(|| kwh_from_text(invoice))
                    .unwrap_or(Decimal::ZERO);
                if kwh.is_zero()
                    && metered_kwh > Decimal::ZERO
                    && aggregation.energy_invoices.is_empty()
                {
                    kwh = round6(metered_kwh);
                }
                aggregation.energy_total_kwh += kwh;
                aggregation.energy_invoices.push(EnergyInvoiceLine {
                    label: energy_label(invoice),
                    date: invoice.invoice_date,
                    kwh,
                    amount,
                });
            }
            CostSection::HeatingOperating | CostSection::Adjustment => {
                aggregation.heating_cost_items.push(CostLine {
                    label: operating_label(invoice, &cost_type),
                    date: invoice.invoice_date,
                    amount,
                });
            }
            CostSection::Distribution => {
                aggregation.distribution_cost_items.push(CostLine {
                    label: operating_label(invoice, &cost_type),
                    date: invoice.invoice_date,
                    amount,
                });
                aggregation.distribution_cost_total += amount;
            }
            CostSection::ColdWater => {
                aggregation.cold_water_total += amount;
                aggregation.cold_water_invoices.push(invoice.clone());
            }
            CostSection::Ignored => {}
        }
    }

    if let Some(label) = relief_label {
        aggregation.energy_relief = Some(CostLine {
            label,
            date: None,
            amount: relief_total,
        });
    }

    let invoiced_energy = aggregation
        .energy_invoices
        .iter()
        .map(|line| line.amount)
        .sum::<Decimal>();
    aggregation.energy_total_amount = round2(invoiced_energy + relief_total);
    aggregation.heating_cost_carry_over = aggregation.energy_total_amount;
    let operating = aggregation
        .heating_cost_items
        .iter()
        .map(|line| line.amount)
        .sum::<Decimal>();
    aggregation.heating_cost_total = round2(aggregation.heating_cost_carry_over + operating);
    aggregation.distribution_cost_total = round2(aggregation.distribution_cost_total);
    aggregation.grand_total =
        round2(aggregation.heating_cost_total + aggregation.distribution_cost_total);
    aggregation.cold_water_total = round2(aggregation.cold_water_total);
    aggregation.direct_cost_total = round2(aggregation.direct_cost_total);

    Ok(aggregation)
}
