use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::interval::DateInterval;

// ---------------------------------------------------------------------------
// Raw inputs (snake_case, mirrors the database rows)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BillingError> {
        if start > end {
            return Err(BillingError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingDocument {
    pub id: String,
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<NaiveDate>,
    /// Base cost percentage configured on the document.
    #[serde(default)]
    pub living_space_share: Option<Decimal>,
    /// Consumption cost percentage configured on the document.
    #[serde(default)]
    pub consumption_dependent: Option<Decimal>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl BillingDocument {
    pub fn period(&self) -> Result<BillingPeriod, BillingError> {
        let start = self
            .start_date
            .ok_or_else(|| BillingError::incomplete("start_date"))?;
        let end = self
            .end_date
            .ok_or_else(|| BillingError::incomplete("end_date"))?;
        BillingPeriod::new(start, end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub energy_carrier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub living_space: Option<Decimal>,
}

impl Unit {
    pub fn display_label(&self) -> String {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn living_space_or_zero(&self) -> Decimal {
        self.living_space
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Contractor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// A tenancy. `rental_end_date = None` means the contract is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub unit_id: String,
    pub rental_start_date: NaiveDate,
    #[serde(default)]
    pub rental_end_date: Option<NaiveDate>,
    /// Monthly advance payment towards heating and utility costs.
    #[serde(default)]
    pub additional_costs: Option<Decimal>,
    #[serde(default)]
    pub contractors: Vec<Contractor>,
}

impl Contract {
    /// Tenancy interval clipped to the period, `None` when they do not overlap.
    pub fn interval_within(&self, period: &DateInterval) -> Option<DateInterval> {
        DateInterval::open_ended(self.rental_start_date, self.rental_end_date, period.end)
            .and_then(|tenancy| tenancy.intersect(period))
    }

    pub fn tenant_names(&self) -> String {
        self.contractors
            .iter()
            .map(Contractor::full_name)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    Heat,
    WarmWater,
    ColdWater,
}

impl MeterKind {
    /// Maps the device-type labels used by the meter gateway and the
    /// back office to a meter kind.
    pub fn from_device_type(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "heat" | "wärmemengenzähler" | "heizkostenverteiler" | "wmz rücklauf" | "wmz" => {
                Some(Self::Heat)
            }
            "wwater" | "warmwasserzähler" | "warm water" | "warm_water" => Some(Self::WarmWater),
            "water" | "kaltwasserzähler" | "cold water" | "cold_water" => Some(Self::ColdWater),
            _ => None,
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Self::Heat => "MWh",
            Self::WarmWater | Self::ColdWater => "m³",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub device_id: String,
    pub kind: MeterKind,
    pub read_on: NaiveDate,
    /// Cumulative register value: Wh for heat meters, m³ for water meters.
    pub value: Decimal,
}

/// Assignment of a physical meter to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeter {
    pub device_id: String,
    pub unit_id: String,
    #[serde(default)]
    pub kind: Option<MeterKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKey {
    Consumption,
    LivingSpace,
    PerUnit,
    Direct,
}

impl AllocationKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "consumption" | "verbrauch" | "m3" | "m³" => Some(Self::Consumption),
            "living_space" | "wohnfläche" | "wohnflaeche" | "area" => Some(Self::LivingSpace),
            "per_unit" | "nutzeinheiten" | "nutzeinheit" | "nutzeinh" | "flat" => {
                Some(Self::PerUnit)
            }
            "direct" | "direkt" => Some(Self::Direct),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostInvoice {
    pub id: String,
    #[serde(default)]
    pub cost_type: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub kwh: Option<Decimal>,
    #[serde(default)]
    pub allocation_key: Option<AllocationKey>,
    #[serde(default = "default_for_all_tenants")]
    pub for_all_tenants: bool,
    #[serde(default)]
    pub direct_unit_id: Option<String>,
}

fn default_for_all_tenants() -> bool {
    true
}

impl Default for CostInvoice {
    fn default() -> Self {
        Self {
            id: String::new(),
            cost_type: None,
            total_amount: None,
            invoice_date: None,
            document_name: None,
            purpose: None,
            notes: None,
            kwh: None,
            allocation_key: None,
            for_all_tenants: true,
            direct_unit_id: None,
        }
    }
}

impl CostInvoice {
    pub fn amount(&self) -> Decimal {
        self.total_amount.unwrap_or(Decimal::ZERO)
    }

    pub fn is_direct(&self) -> bool {
        !self.for_all_tenants || self.allocation_key == Some(AllocationKey::Direct)
    }
}

/// Everything the computer needs for one billing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBillingInputs {
    pub document: BillingDocument,
    pub building: Building,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub invoices: Vec<CostInvoice>,
    #[serde(default)]
    pub readings: Vec<MeterReading>,
    #[serde(default)]
    pub unit_meters: Vec<UnitMeter>,
}

impl RawBillingInputs {
    pub fn unit_for_device(&self, device_id: &str) -> Option<&str> {
        self.unit_meters
            .iter()
            .find(|meter| meter.device_id == device_id)
            .map(|meter| meter.unit_id.as_str())
    }

    pub fn total_living_space(&self) -> Decimal {
        self.units.iter().map(Unit::living_space_or_zero).sum()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSplit {
    pub base_cost_percent: Decimal,
    pub consumption_cost_percent: Decimal,
}

impl Default for CostSplit {
    fn default() -> Self {
        Self {
            base_cost_percent: Decimal::from(30),
            consumption_cost_percent: Decimal::from(70),
        }
    }
}

/// Explicit billing parameters. Built from server defaults, then overridden
/// by the billing document and finally by the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub heating_split: CostSplit,
    pub warm_water_split: CostSplit,
    /// Fixed warm-water device rental; derived from distribution costs when unset.
    pub warm_water_device_rental: Option<Decimal>,
    /// Allocation key overrides per normalized cost type.
    pub allocation_keys: BTreeMap<String, AllocationKey>,
    pub co2_price_per_tonne: Option<Decimal>,
}

impl BillingConfig {
    pub fn with_split(split: CostSplit) -> Self {
        Self {
            heating_split: split,
            warm_water_split: split,
            ..Self::default()
        }
    }

    /// Applies the percentages stored on the billing document, if any.
    pub fn for_document(&self, document: &BillingDocument) -> Self {
        let mut config = self.clone();
        if let Some(base) = document.living_space_share {
            config.heating_split.base_cost_percent = base;
            config.warm_water_split.base_cost_percent = base;
        }
        if let Some(consumption) = document.consumption_dependent {
            config.heating_split.consumption_cost_percent = consumption;
            config.warm_water_split.consumption_cost_percent = consumption;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Computed model (camelCase, consumed by the PDF renderer and preview UI)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingBillModel {
    pub cover: Cover,
    pub building_calc: BuildingCalc,
    pub cold_water: ColdWaterCalc,
    #[serde(default)]
    pub units: Vec<UnitAllocation>,
    pub co2: Co2Allocation,
    pub energy_summary: EnergySummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub contractors_names: String,
    #[serde(default)]
    pub contractors: Vec<ContractorRef>,
    pub street: String,
    pub zip: String,
    pub created_at: Option<NaiveDate>,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub usage_period_start: NaiveDate,
    pub usage_period_end: NaiveDate,
    /// Positive: refund to the tenant. Negative: additional payment due.
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyInvoiceLine {
    pub label: String,
    pub date: Option<NaiveDate>,
    pub kwh: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub label: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingCalc {
    #[serde(default)]
    pub energy_invoices: Vec<EnergyInvoiceLine>,
    #[serde(default)]
    pub energy_relief: Option<CostLine>,
    #[serde(default)]
    pub energy_total_kwh: Decimal,
    #[serde(default)]
    pub energy_total_amount: Decimal,
    #[serde(default)]
    pub heating_cost_items: Vec<CostLine>,
    #[serde(default)]
    pub heating_cost_carry_over: Decimal,
    pub heating_cost_total: Decimal,
    #[serde(default)]
    pub distribution_cost_items: Vec<CostLine>,
    pub distribution_cost_total: Decimal,
    pub grand_total: Decimal,
    /// Costs charged directly to single units, outside every pool.
    #[serde(default)]
    pub direct_cost_total: Decimal,
    pub warm_water: WarmWaterCalc,
    pub heating: HeatingCalc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarmWaterCalc {
    pub constant_factor: Decimal,
    pub volume_m3: Decimal,
    pub temp_diff_high: Decimal,
    pub temp_diff_low: Decimal,
    pub conversion_factor: Decimal,
    pub energy_kwh: Decimal,
    pub energy_share_percent: Decimal,
    pub cost_from_energy: Decimal,
    pub device_rental: Decimal,
    pub total_cost: Decimal,
    pub base_cost_percent: Decimal,
    pub base_cost_amount: Decimal,
    pub base_cost_area: Decimal,
    pub base_cost_rate_per_m2: Decimal,
    pub consumption_cost_percent: Decimal,
    pub consumption_cost_amount: Decimal,
    pub consumption_cost_volume: Decimal,
    pub consumption_cost_rate_per_m3: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatingCalc {
    pub energy_total: Decimal,
    pub minus_warm_water: Decimal,
    pub device_rental: Decimal,
    pub total_cost: Decimal,
    pub base_cost_percent: Decimal,
    pub base_cost_amount: Decimal,
    pub base_cost_area: Decimal,
    pub base_cost_rate_per_m2: Decimal,
    pub consumption_cost_percent: Decimal,
    pub consumption_cost_amount: Decimal,
    pub consumption_mwh: Decimal,
    pub consumption_cost_rate_per_mwh: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    CubicMetre,
    SquareMetre,
    UsageUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdWaterRateItem {
    pub label: String,
    pub key: AllocationKey,
    pub unit: RateUnit,
    pub total_cost: Decimal,
    /// m³, m² or number of units, depending on the key.
    pub total_quantity: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColdWaterCalc {
    pub total_cost: Decimal,
    pub total_volume_m3: Decimal,
    pub rate_items: Vec<ColdWaterRateItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReadingRow {
    pub device_id: String,
    pub kind: MeterKind,
    pub unit: String,
    pub start_reading: Decimal,
    pub end_reading: Decimal,
    pub consumption: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCostLine {
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantShare {
    pub contract_id: String,
    pub tenant_names: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: i64,
    pub months: i64,
    pub heating_cost: Decimal,
    pub warm_water_cost: Decimal,
    pub cold_water_cost: Decimal,
    pub direct_cost: Decimal,
    pub total_cost: Decimal,
    pub advance_payments: Decimal,
    /// `advance_payments - total_cost`.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitAllocation {
    pub unit_id: String,
    pub label: String,
    pub living_space_m2: Decimal,
    pub heating_mwh: Decimal,
    pub warm_water_m3: Decimal,
    pub cold_water_m3: Decimal,
    pub heating_base_cost: Decimal,
    pub heating_consumption_cost: Decimal,
    pub heating_total: Decimal,
    pub warm_water_base_cost: Decimal,
    pub warm_water_consumption_cost: Decimal,
    pub warm_water_total: Decimal,
    pub cold_water_items: Vec<UnitCostLine>,
    pub cold_water_total: Decimal,
    pub direct_items: Vec<UnitCostLine>,
    pub direct_total: Decimal,
    pub co2_tenant_cost: Decimal,
    pub co2_landlord_cost: Decimal,
    /// heating + warm water + cold water + direct charges.
    pub total_cost: Decimal,
    pub tenants: Vec<TenantShare>,
    /// Share of the unit's cost for days without a tenancy, borne by the owner.
    pub vacancy_cost: Decimal,
    pub devices: Vec<DeviceReadingRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Co2EnergyRow {
    pub label: String,
    pub date: Option<NaiveDate>,
    pub kwh: Decimal,
    pub co2_kg: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Co2TierRow {
    pub range_label: String,
    pub tenant_percent: Decimal,
    pub landlord_percent: Decimal,
    pub is_highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Co2Allocation {
    pub energy_carrier: String,
    pub energy_rows: Vec<Co2EnergyRow>,
    pub total_kwh: Decimal,
    pub total_co2_kg: Decimal,
    pub emission_factor_kg_per_kwh: Decimal,
    pub total_living_space_m2: Decimal,
    pub emission_per_m2: Decimal,
    pub classification_table: Vec<Co2TierRow>,
    pub selected_tier_tenant_percent: Decimal,
    pub selected_tier_landlord_percent: Decimal,
    pub building_total_cost: Decimal,
    pub building_tenant_cost: Decimal,
    pub building_landlord_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryEnergyFactor {
    pub label: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergySummary {
    pub energy_carrier: String,
    pub total_kwh: Decimal,
    pub co2_emission_factor: Decimal,
    pub total_co2_kg: Decimal,
    pub primary_energy_factors: Vec<PrimaryEnergyFactor>,
    /// Target unit figures; zero when the model covers the whole building.
    pub heating_kwh: Decimal,
    pub warm_water_kwh: Decimal,
    pub total_unit_kwh: Decimal,
    pub living_space_m2: Decimal,
    pub kwh_per_m2: Decimal,
    pub national_average_kwh_per_m2: Decimal,
    pub property_average_kwh_per_m2: Decimal,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::{
        AllocationKey, BillingConfig, BillingDocument, BillingPeriod, Contract, Contractor,
        CostInvoice, MeterKind,
    };
    use crate::services::heating_bill::error::BillingError;
    use crate::services::heating_bill::interval::DateInterval;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn period_rejects_reversed_dates() {
        let error = BillingPeriod::new(date("2025-12-31"), date("2025-01-01"))
            .expect_err("reversed period");
        assert!(matches!(error, BillingError::InvalidPeriod { .. }));
    }

    #[test]
    fn document_without_dates_is_incomplete() {
        let document = BillingDocument {
            id: "doc".to_string(),
            start_date: Some(date("2025-01-01")),
            ..BillingDocument::default()
        };
        assert_eq!(
            document.period(),
            Err(BillingError::incomplete("end_date"))
        );
    }

    #[test]
    fn parses_device_types() {
        assert_eq!(MeterKind::from_device_type("Heat"), Some(MeterKind::Heat));
        assert_eq!(
            MeterKind::from_device_type(" Wärmemengenzähler "),
            Some(MeterKind::Heat)
        );
        assert_eq!(
            MeterKind::from_device_type("WWater"),
            Some(MeterKind::WarmWater)
        );
        assert_eq!(
            MeterKind::from_device_type("Kaltwasserzähler"),
            Some(MeterKind::ColdWater)
        );
        assert_eq!(MeterKind::from_device_type("Rauchmelder"), None);
    }

    #[test]
    fn parses_allocation_keys() {
        assert_eq!(AllocationKey::parse("Verbrauch"), Some(AllocationKey::Consumption));
        assert_eq!(AllocationKey::parse("Wohnfläche"), Some(AllocationKey::LivingSpace));
        assert_eq!(AllocationKey::parse("Nutzeinheiten"), Some(AllocationKey::PerUnit));
        assert_eq!(AllocationKey::parse("living space"), Some(AllocationKey::LivingSpace));
        assert_eq!(AllocationKey::parse("unknown"), None);
    }

    #[test]
    fn document_percentages_override_defaults() {
        let document = BillingDocument {
            id: "doc".to_string(),
            living_space_share: Some(dec!(50)),
            consumption_dependent: Some(dec!(50)),
            ..BillingDocument::default()
        };
        let config = BillingConfig::default().for_document(&document);
        assert_eq!(config.heating_split.base_cost_percent, dec!(50));
        assert_eq!(config.warm_water_split.consumption_cost_percent, dec!(50));
    }

    #[test]
    fn open_contract_is_clipped_to_period() {
        let contract = Contract {
            id: "c1".to_string(),
            unit_id: "u1".to_string(),
            rental_start_date: date("2025-07-01"),
            rental_end_date: None,
            additional_costs: Some(dec!(80)),
            contractors: vec![
                Contractor {
                    id: "t1".to_string(),
                    first_name: "Anna".to_string(),
                    last_name: "Schmidt".to_string(),
                },
                Contractor {
                    id: "t2".to_string(),
                    first_name: "Jonas".to_string(),
                    last_name: "Schmidt".to_string(),
                },
            ],
        };
        let period = DateInterval::new(date("2025-01-01"), date("2025-12-31")).expect("period");
        let clipped = contract.interval_within(&period).expect("overlap");
        assert_eq!(clipped.start, date("2025-07-01"));
        assert_eq!(clipped.end, date("2025-12-31"));
        assert_eq!(contract.tenant_names(), "Anna Schmidt, Jonas Schmidt");
    }

    #[test]
    fn invoice_defaults_to_all_tenants() {
        let deserialized: CostInvoice =
            serde_json::from_str(r#"{"id":"i2","total_amount":"12.50"}"#).expect("invoice");
        assert!(deserialized.for_all_tenants);
        assert_eq!(deserialized.amount(), dec!(12.50));
    }
}
