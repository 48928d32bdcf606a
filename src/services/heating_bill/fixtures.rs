//! Sample building for previews and demos, and the preview-props adapter
//! used by the UI before a billing document has readings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::compute::compute_heating_bill;
use super::error::BillingError;
use super::interval::{overlap_months, DateInterval};
use super::money::round2;
use super::types::{
    BillingConfig, BillingDocument, Building, Contract, Contractor, ContractorRef, CostInvoice,
    HeatingBillModel, MeterKind, MeterReading, Owner, RawBillingInputs, Unit, UnitMeter,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn contractor(id: &str, first_name: &str, last_name: &str) -> Contractor {
    Contractor {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

fn contract(
    id: &str,
    unit_id: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    monthly_advance: Decimal,
    contractors: Vec<Contractor>,
) -> Contract {
    Contract {
        id: id.to_string(),
        unit_id: unit_id.to_string(),
        rental_start_date: start,
        rental_end_date: end,
        additional_costs: Some(monthly_advance),
        contractors,
    }
}

fn invoice(id: &str, cost_type: &str, purpose: &str, amount: Decimal) -> CostInvoice {
    CostInvoice {
        id: id.to_string(),
        cost_type: Some(cost_type.to_string()),
        purpose: Some(purpose.to_string()),
        total_amount: Some(amount),
        invoice_date: Some(date(2025, 2, 14)),
        ..CostInvoice::default()
    }
}

fn series(device_id: &str, kind: MeterKind, values: &[(NaiveDate, i64)]) -> Vec<MeterReading> {
    values
        .iter()
        .map(|(read_on, value)| MeterReading {
            device_id: device_id.to_string(),
            kind,
            read_on: *read_on,
            value: Decimal::from(*value),
        })
        .collect()
}

fn meter(device_id: &str, unit_id: &str, kind: MeterKind) -> UnitMeter {
    UnitMeter {
        device_id: device_id.to_string(),
        unit_id: unit_id.to_string(),
        kind: Some(kind),
    }
}

/// A three-unit gas-heated building billed for 2024, with a tenant change
/// and a vacant month in the second unit.
pub fn mock_inputs() -> RawBillingInputs {
    let (start, mid, end) = (date(2024, 1, 1), date(2024, 6, 30), date(2024, 12, 31));

    let units = vec![
        Unit {
            id: "mock-unit-eg-links".to_string(),
            label: Some("EG links".to_string()),
            living_space: Some(Decimal::new(755, 1)),
        },
        Unit {
            id: "mock-unit-eg-rechts".to_string(),
            label: Some("EG rechts".to_string()),
            living_space: Some(Decimal::from(62)),
        },
        Unit {
            id: "mock-unit-1-og".to_string(),
            label: Some("1. OG".to_string()),
            living_space: Some(Decimal::from(88)),
        },
    ];

    let contracts = vec![
        contract(
            "mock-contract-becker",
            "mock-unit-eg-links",
            date(2019, 4, 1),
            None,
            Decimal::from(120),
            vec![contractor("mock-tenant-becker", "Anna", "Becker")],
        ),
        contract(
            "mock-contract-weber",
            "mock-unit-eg-rechts",
            date(2021, 3, 1),
            Some(mid),
            Decimal::from(95),
            vec![contractor("mock-tenant-weber", "Jonas", "Weber")],
        ),
        contract(
            "mock-contract-schulz",
            "mock-unit-eg-rechts",
            date(2024, 8, 1),
            None,
            Decimal::from(100),
            vec![contractor("mock-tenant-schulz", "Lena", "Schulz")],
        ),
        contract(
            "mock-contract-oeztuerk",
            "mock-unit-1-og",
            date(2022, 10, 1),
            None,
            Decimal::from(140),
            vec![
                contractor("mock-tenant-oeztuerk-1", "Deniz", "Öztürk"),
                contractor("mock-tenant-oeztuerk-2", "Selin", "Öztürk"),
            ],
        ),
    ];

    let mut energy = invoice(
        "mock-invoice-gas",
        "fuel_costs",
        "Gaslieferung 2024",
        Decimal::new(985040, 2),
    );
    energy.document_name = Some("Stadtwerke Gasrechnung 2024".to_string());
    energy.kwh = Some(Decimal::from(98500));
    let mut correction = invoice(
        "mock-invoice-gas-correction",
        "fuel_costs",
        "Abschlagskorrektur Gas",
        Decimal::new(41235, 2),
    );
    correction.kwh = Some(Decimal::from(4120));
    let mut valve = invoice(
        "mock-invoice-valve",
        "other_operating_costs",
        "Austausch Heizkörperventil",
        Decimal::from(85),
    );
    valve.for_all_tenants = false;
    valve.direct_unit_id = Some("mock-unit-1-og".to_string());

    let invoices = vec![
        energy,
        correction,
        invoice(
            "mock-invoice-relief",
            "fuel_costs",
            "Preisbremse Gas",
            Decimal::from(-640),
        ),
        invoice(
            "mock-invoice-maintenance",
            "maintenance_costs",
            "Wartung Heizungsanlage",
            Decimal::from(385),
        ),
        invoice(
            "mock-invoice-chimney",
            "chimney_sweep_costs",
            "Schornsteinfeger",
            Decimal::new(9680, 2),
        ),
        invoice(
            "mock-invoice-power",
            "operating_current",
            "Betriebsstrom",
            Decimal::from(210),
        ),
        invoice(
            "mock-invoice-rental",
            "metering_device_rental",
            "Gerätemiete Heizung/Warmwasser",
            Decimal::from(312),
        ),
        invoice(
            "mock-invoice-service",
            "metering_service_costs",
            "Abrechnungsservice",
            Decimal::new(26850, 2),
        ),
        invoice(
            "mock-invoice-water",
            "cold_water",
            "Frischwasser",
            Decimal::new(62340, 2),
        ),
        invoice(
            "mock-invoice-sewage",
            "abwasser",
            "Schmutzwasser",
            Decimal::new(81120, 2),
        ),
        invoice(
            "mock-invoice-water-billing",
            "cold_water_billing",
            "Abrechnung Kaltwasser",
            Decimal::from(45),
        ),
        valve,
    ];

    let readings = [
        series("H-1001", MeterKind::Heat, &[(start, 0), (end, 8400000)]),
        series(
            "H-1002",
            MeterKind::Heat,
            &[(start, 12000000), (mid, 15100000), (end, 17900000)],
        ),
        series("H-1003", MeterKind::Heat, &[(start, 5000000), (end, 14600000)]),
        series("W-2001", MeterKind::WarmWater, &[(start, 100), (end, 118)]),
        series("W-2002", MeterKind::WarmWater, &[(start, 40), (mid, 44), (end, 52)]),
        series("W-2003", MeterKind::WarmWater, &[(start, 200), (end, 224)]),
        series("K-3001", MeterKind::ColdWater, &[(start, 300), (end, 342)]),
        series("K-3002", MeterKind::ColdWater, &[(start, 150), (mid, 158), (end, 181)]),
        series("K-3003", MeterKind::ColdWater, &[(start, 500), (end, 561)]),
    ]
    .concat();

    let unit_meters = vec![
        meter("H-1001", "mock-unit-eg-links", MeterKind::Heat),
        meter("W-2001", "mock-unit-eg-links", MeterKind::WarmWater),
        meter("K-3001", "mock-unit-eg-links", MeterKind::ColdWater),
        meter("H-1002", "mock-unit-eg-rechts", MeterKind::Heat),
        meter("W-2002", "mock-unit-eg-rechts", MeterKind::WarmWater),
        meter("K-3002", "mock-unit-eg-rechts", MeterKind::ColdWater),
        meter("H-1003", "mock-unit-1-og", MeterKind::Heat),
        meter("W-2003", "mock-unit-1-og", MeterKind::WarmWater),
        meter("K-3003", "mock-unit-1-og", MeterKind::ColdWater),
    ];

    RawBillingInputs {
        document: BillingDocument {
            id: "mock-heating-bill".to_string(),
            building_id: Some("mock-building".to_string()),
            start_date: Some(start),
            end_date: Some(end),
            created_at: Some(date(2025, 3, 3)),
            living_space_share: Some(Decimal::from(30)),
            consumption_dependent: Some(Decimal::from(70)),
            owner_id: Some("mock-owner".to_string()),
        },
        building: Building {
            id: "mock-building".to_string(),
            street: "Lindenstraße 12".to_string(),
            zip: "10969".to_string(),
            energy_carrier: Some("Erdgas".to_string()),
        },
        owner: Some(Owner {
            id: "mock-owner".to_string(),
            first_name: "Martin".to_string(),
            last_name: "Hoffmann".to_string(),
        }),
        units,
        contracts,
        invoices,
        readings,
        unit_meters,
    }
}

/// Bill for [`mock_inputs`], computed with the document's own percentages.
pub fn mock_heating_bill_model() -> Result<HeatingBillModel, BillingError> {
    let inputs = mock_inputs();
    let config = BillingConfig::default().for_document(&inputs.document);
    compute_heating_bill(&inputs, &config, None)
}

/// What the preview UI knows about a billing document before it is computed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreviewProps {
    #[serde(alias = "mainDoc")]
    pub main_doc: Option<BillingDocument>,
    pub contracts: Vec<Contract>,
    pub invoices: Vec<CostInvoice>,
    #[serde(alias = "objekt")]
    pub building: Option<Building>,
    #[serde(alias = "user")]
    pub owner: Option<Owner>,
    #[serde(alias = "totalLivingSpace")]
    pub total_living_space: Option<Decimal>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The mock bill with its cover replaced by what the preview knows. The
/// cover amount is the advance payments over the period minus all invoices.
pub fn preview_props_to_model(props: &PreviewProps) -> Result<HeatingBillModel, BillingError> {
    let mut model = mock_heating_bill_model()?;
    let cover = &mut model.cover;

    if let Some(document) = &props.main_doc {
        if let Some(start) = document.start_date {
            cover.billing_period_start = start;
            cover.usage_period_start = start;
        }
        if let Some(end) = document.end_date {
            cover.billing_period_end = end;
            cover.usage_period_end = end;
        }
        if document.created_at.is_some() {
            cover.created_at = document.created_at;
        }
    }
    if let Some(building) = &props.building {
        if let Some(street) = non_empty(&building.street) {
            cover.street = street;
        }
        if let Some(zip) = non_empty(&building.zip) {
            cover.zip = zip;
        }
    }
    if let Some(owner) = &props.owner {
        if let Some(first_name) = non_empty(&owner.first_name) {
            cover.owner_first_name = first_name;
        }
        if let Some(last_name) = non_empty(&owner.last_name) {
            cover.owner_last_name = last_name;
        }
    }

    let contractors = props
        .contracts
        .iter()
        .flat_map(|contract| contract.contractors.iter())
        .collect::<Vec<_>>();
    if !contractors.is_empty() {
        cover.contractors_names = contractors
            .iter()
            .map(|contractor| contractor.full_name())
            .collect::<Vec<_>>()
            .join(", ");
        cover.contractors = contractors
            .iter()
            .filter(|contractor| !contractor.id.is_empty())
            .map(|contractor| ContractorRef {
                id: contractor.id.clone(),
                first_name: contractor.first_name.clone(),
                last_name: contractor.last_name.clone(),
            })
            .collect();
    }

    let period = DateInterval::new(cover.billing_period_start, cover.billing_period_end)
        .ok_or_else(|| BillingError::InvalidPeriod {
            start: cover.billing_period_start.to_string(),
            end: cover.billing_period_end.to_string(),
        })?;
    let advances = props
        .contracts
        .iter()
        .filter_map(|contract| {
            contract.interval_within(&period).map(|within| {
                contract.additional_costs.unwrap_or(Decimal::ZERO)
                    * Decimal::from(overlap_months(&within, &period))
            })
        })
        .sum::<Decimal>();
    let invoiced = props.invoices.iter().map(CostInvoice::amount).sum::<Decimal>();
    cover.total_amount = round2(advances - invoiced);

    if let Some(total_living_space) = props.total_living_space {
        model.energy_summary.living_space_m2 = total_living_space;
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{mock_heating_bill_model, mock_inputs, preview_props_to_model, PreviewProps};
    use crate::services::heating_bill::validation::validate_model;

    #[test]
    fn mock_model_passes_validation() {
        let model = mock_heating_bill_model().expect("mock model");
        assert_eq!(model.units.len(), 3);
        assert_eq!(model.cover.street, "Lindenstraße 12");
        assert!(model.building_calc.energy_relief.is_some());
        assert_eq!(model.building_calc.direct_cost_total, dec!(85));
        let result = validate_model(&model);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn mock_inputs_have_a_vacant_month() {
        let inputs = mock_inputs();
        let model = mock_heating_bill_model().expect("mock model");
        let second = &model.units[1];
        assert_eq!(second.unit_id, inputs.units[1].id);
        assert_eq!(second.tenants.len(), 2);
        assert!(second.vacancy_cost > Decimal::ZERO);
    }

    #[test]
    fn preview_overrides_cover_and_balances_advances() {
        let props: PreviewProps = serde_json::from_value(serde_json::json!({
            "mainDoc": {
                "id": "doc-1",
                "start_date": "2023-01-01",
                "end_date": "2023-12-31",
                "created_at": "2024-02-01"
            },
            "contracts": [{
                "id": "c-1",
                "unit_id": "u-1",
                "rental_start_date": "2022-01-01",
                "rental_end_date": null,
                "additional_costs": "100",
                "contractors": [
                    { "id": "t-1", "first_name": "Eva", "last_name": "Klein" }
                ]
            }],
            "invoices": [
                { "id": "i-1", "total_amount": "700.50" },
                { "id": "i-2", "total_amount": 250 }
            ],
            "objekt": { "id": "b-1", "street": "Am Markt 3", "zip": "" },
            "user": { "id": "o-1", "first_name": "Petra", "last_name": "" }
        }))
        .expect("preview props");

        let model = preview_props_to_model(&props).expect("preview model");
        let cover = &model.cover;
        assert_eq!(cover.street, "Am Markt 3");
        assert_eq!(cover.zip, "10969");
        assert_eq!(cover.owner_first_name, "Petra");
        assert_eq!(cover.owner_last_name, "Hoffmann");
        assert_eq!(cover.contractors_names, "Eva Klein");
        assert_eq!(
            cover.billing_period_start,
            NaiveDate::from_ymd_opt(2023, 1, 1).expect("date")
        );
        // 12 months * 100 - 950.50
        assert_eq!(cover.total_amount, dec!(249.50));
    }

    #[test]
    fn empty_preview_keeps_the_mock_cover() {
        let mock = mock_heating_bill_model().expect("mock model");
        let model = preview_props_to_model(&PreviewProps::default()).expect("preview model");
        assert_eq!(model.cover.street, mock.cover.street);
        assert_eq!(model.cover.total_amount, dec!(0));
    }
}
