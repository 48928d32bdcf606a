//! Loads everything a billing document needs from Postgres.
//!
//! Independent reads run concurrently, dependent ones in waves:
//! document + invoices, then building + units + owner, then contracts +
//! unit meters, then contractors + meter readings. The whole load runs
//! under one timeout.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::error::BillingError;
use super::money::parse_decimal;
use super::types::{
    AllocationKey, BillingDocument, BillingPeriod, Building, Contract, Contractor, CostInvoice,
    MeterKind, MeterReading, Owner, RawBillingInputs, Unit, UnitMeter,
};
use crate::error::AppError;
use crate::repository::table_service::{get_row, list_meter_reading_rows, list_rows};

/// Device types requested from the meter gateway.
const DEVICE_TYPES: &[&str] = &[
    "Heat",
    "Water",
    "WWater",
    "Wärmemengenzähler",
    "Kaltwasserzähler",
    "Warmwasserzähler",
];

/// Readings this many days before the period still count as start readings.
const READING_LOOKBACK_DAYS: u64 = 7;

const ROW_LIMIT: i64 = 5000;

const DATE_KEYS: &[&str] = &[
    "IV,0,0,0,,Date/Time",
    "Actual Date",
    "Raw Date",
    "Billing Date",
    "read_on",
];
const HEAT_VALUE_KEYS: &[&str] = &["IV,0,0,0,Wh,E", "Actual Energy / HCA", "Billing Value"];
const VOLUME_VALUE_KEYS: &[&str] = &["IV,0,0,0,m^3,Vol", "Actual Volume", "Billing Value"];

pub async fn fetch_heating_bill_data(
    pool: &PgPool,
    document_id: &str,
    target_unit_id: Option<&str>,
    timeout: Duration,
) -> Result<RawBillingInputs, BillingError> {
    let document_uuid = uuid::Uuid::parse_str(document_id.trim())
        .map_err(|_| BillingError::InvalidDocumentId(document_id.to_string()))?;

    let inputs = tokio::time::timeout(timeout, load(pool, document_uuid, target_unit_id))
        .await
        .map_err(|_| {
            tracing::error!(
                document_id = %document_uuid,
                timeout_seconds = timeout.as_secs(),
                "Heating bill fetch timed out"
            );
            BillingError::DataSourceUnavailable(format!(
                "Fetch timed out after {} seconds.",
                timeout.as_secs()
            ))
        })??;

    ensure_readings(&inputs, target_unit_id)?;
    Ok(inputs)
}

async fn load(
    pool: &PgPool,
    document_id: uuid::Uuid,
    target_unit_id: Option<&str>,
) -> Result<RawBillingInputs, BillingError> {
    let document_key = document_id.to_string();

    let (document_row, invoice_rows) = tokio::try_join!(
        async {
            get_row(pool, "heating_bill_documents", &document_key, "id")
                .await
                .map_err(|error| not_found_as(error, "billing document", &document_key))
        },
        async {
            list_rows(
                pool,
                "heating_invoices",
                Some(&json_map(&[(
                    "heating_doc_id",
                    Value::String(document_key.clone()),
                )])),
                ROW_LIMIT,
                "invoice_date",
                true,
            )
            .await
            .map_err(data_source_error)
        }
    )?;

    let document = parse_document(&document_row)?;
    let (window_start, period) = reading_window(&document)?;
    let building_id = document
        .building_id
        .clone()
        .ok_or_else(|| BillingError::incomplete("objekt_id"))?;

    let (building_row, unit_rows, owner) = tokio::try_join!(
        async {
            get_row(pool, "objekte", &building_id, "id")
                .await
                .map_err(|error| not_found_as(error, "building", &building_id))
        },
        async {
            list_rows(
                pool,
                "locals",
                Some(&json_map(&[(
                    "objekt_id",
                    Value::String(building_id.clone()),
                )])),
                ROW_LIMIT,
                "id",
                true,
            )
            .await
            .map_err(data_source_error)
        },
        fetch_owner(pool, document.owner_id.as_deref())
    )?;

    let building = parse_building(&building_row);
    let units = unit_rows.iter().filter_map(parse_unit).collect::<Vec<_>>();
    if let Some(unit_id) = target_unit_id {
        if !units.iter().any(|unit| unit.id == unit_id) {
            return Err(BillingError::NotFound {
                entity: "unit",
                id: unit_id.to_string(),
            });
        }
    }

    let unit_ids = units
        .iter()
        .map(|unit| Value::String(unit.id.clone()))
        .collect::<Vec<_>>();
    let unit_filter = json_map(&[("local_id", Value::Array(unit_ids))]);
    let mut contract_filter = unit_filter.clone();
    contract_filter.insert(
        "rental_start_date__lte".to_string(),
        Value::String(period.end.format("%Y-%m-%d").to_string()),
    );
    let (contract_rows, meter_rows) = tokio::try_join!(
        async {
            list_rows(
                pool,
                "contracts",
                Some(&contract_filter),
                ROW_LIMIT,
                "rental_start_date",
                true,
            )
            .await
            .map_err(data_source_error)
        },
        async {
            list_rows(pool, "local_meters", Some(&unit_filter), ROW_LIMIT, "id", true)
                .await
                .map_err(data_source_error)
        }
    )?;

    let contract_rows = contract_rows
        .into_iter()
        .filter(|row| overlaps_period(row, &period))
        .collect::<Vec<_>>();
    let contract_ids = contract_rows
        .iter()
        .filter_map(|row| value_string(row.get("id")))
        .map(Value::String)
        .collect::<Vec<_>>();
    let meter_ids = meter_rows
        .iter()
        .filter_map(|row| value_string(row.get("id")))
        .filter_map(|id| uuid::Uuid::parse_str(&id).ok())
        .collect::<Vec<_>>();

    let (contractor_rows, reading_rows) = tokio::try_join!(
        async {
            list_rows(
                pool,
                "contractors",
                Some(&json_map(&[("contract_id", Value::Array(contract_ids))])),
                ROW_LIMIT,
                "id",
                true,
            )
            .await
            .map_err(data_source_error)
        },
        async {
            list_meter_reading_rows(
                pool,
                meter_ids,
                DEVICE_TYPES.iter().map(|kind| (*kind).to_string()).collect(),
                window_start,
                period.end,
            )
            .await
            .map_err(data_source_error)
        }
    )?;

    let contractors = contractor_rows
        .iter()
        .filter_map(parse_contractor)
        .collect::<Vec<_>>();
    let contracts = contract_rows
        .iter()
        .filter_map(|row| parse_contract(row, &contractors))
        .collect::<Vec<_>>();
    let invoices = invoice_rows.iter().filter_map(parse_invoice).collect::<Vec<_>>();
    let readings = reading_rows.iter().filter_map(parse_reading).collect::<Vec<_>>();
    let unit_meters = meter_rows.iter().filter_map(parse_unit_meter).collect::<Vec<_>>();

    tracing::debug!(
        document_id = %document_id,
        units = units.len(),
        contracts = contracts.len(),
        invoices = invoices.len(),
        readings = readings.len(),
        meters = unit_meters.len(),
        "Heating bill data loaded"
    );

    Ok(RawBillingInputs {
        document,
        building,
        owner,
        units,
        contracts,
        invoices,
        readings,
        unit_meters,
    })
}

/// The billing period plus the first day readings are loaded from. A
/// document without a valid period fails here instead of looking empty.
fn reading_window(document: &BillingDocument) -> Result<(NaiveDate, BillingPeriod), BillingError> {
    let period = document.period()?;
    let start = period
        .start
        .checked_sub_days(Days::new(READING_LOOKBACK_DAYS))
        .unwrap_or(period.start);
    Ok((start, period))
}

/// Contracts are pre-filtered on their start date; open or late-ending
/// ones are kept here.
fn overlaps_period(row: &Value, period: &BillingPeriod) -> bool {
    let Some(start) = parse_date(row.get("rental_start_date")) else {
        return true;
    };
    let end = parse_date(row.get("rental_end_date"));
    start <= period.end && end.map_or(true, |end| end >= period.start)
}

async fn fetch_owner(pool: &PgPool, owner_id: Option<&str>) -> Result<Option<Owner>, BillingError> {
    let Some(owner_id) = owner_id else {
        return Ok(None);
    };
    match get_row(pool, "users", owner_id, "id").await {
        Ok(row) => Ok(parse_owner(&row)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(error) => Err(data_source_error(error)),
    }
}

/// A unit (or, without target, the whole building) without a single meter
/// reading in the window has nothing to bill.
fn ensure_readings(
    inputs: &RawBillingInputs,
    target_unit_id: Option<&str>,
) -> Result<(), BillingError> {
    match target_unit_id {
        Some(unit_id) => {
            let has_readings = inputs
                .readings
                .iter()
                .any(|reading| inputs.unit_for_device(&reading.device_id) == Some(unit_id));
            if has_readings {
                Ok(())
            } else {
                Err(BillingError::NoData {
                    unit_id: unit_id.to_string(),
                })
            }
        }
        None if inputs.readings.is_empty() && !inputs.units.is_empty() => {
            Err(BillingError::NoData {
                unit_id: inputs.building.id.clone(),
            })
        }
        None => Ok(()),
    }
}

fn not_found_as(error: AppError, entity: &'static str, id: &str) -> BillingError {
    match error {
        AppError::NotFound(_) => BillingError::NotFound {
            entity,
            id: id.to_string(),
        },
        other => data_source_error(other),
    }
}

fn data_source_error(error: AppError) -> BillingError {
    match error {
        AppError::Dependency(message) | AppError::ServiceUnavailable(message) => {
            BillingError::DataSourceUnavailable(message)
        }
        other => BillingError::DataSourceUnavailable(other.to_string()),
    }
}

fn json_map(entries: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert((*key).to_string(), value.clone());
    }
    map
}

fn value_str(row: &Value, key: &str) -> String {
    value_string(row.get(key)).unwrap_or_default()
}

fn value_string(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn value_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "ja" => Some(true),
            "false" | "f" | "0" | "no" | "nein" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts ISO dates, timestamps and German `dd.mm.yyyy` dates.
fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value_string(value)?;
    if let Some(parsed) = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(parsed);
    }
    let first_token = text.split_whitespace().next()?;
    NaiveDate::parse_from_str(first_token, "%d.%m.%Y").ok()
}

fn parse_document(row: &Value) -> Result<BillingDocument, BillingError> {
    let id = value_string(row.get("id")).ok_or_else(|| BillingError::incomplete("id"))?;
    Ok(BillingDocument {
        id,
        building_id: value_string(row.get("objekt_id")),
        start_date: parse_date(row.get("start_date")),
        end_date: parse_date(row.get("end_date")),
        created_at: parse_date(row.get("created_at")),
        living_space_share: parse_decimal(row.get("living_space_share")),
        consumption_dependent: parse_decimal(row.get("consumption_dependent")),
        owner_id: value_string(row.get("user_id")),
    })
}

/// `heating_systems` holds a list of carriers or a single one; the first wins.
fn parse_building(row: &Value) -> Building {
    let energy_carrier = match row.get("heating_systems") {
        Some(Value::Array(items)) => items.first().and_then(|item| value_string(Some(item))),
        other => value_string(other),
    };
    Building {
        id: value_str(row, "id"),
        street: value_str(row, "street"),
        zip: value_str(row, "zip"),
        energy_carrier,
    }
}

fn parse_owner(row: &Value) -> Option<Owner> {
    Some(Owner {
        id: value_string(row.get("id"))?,
        first_name: value_str(row, "first_name"),
        last_name: value_str(row, "last_name"),
    })
}

fn parse_unit(row: &Value) -> Option<Unit> {
    let label = [value_string(row.get("floor")), value_string(row.get("house_location"))]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    Some(Unit {
        id: value_string(row.get("id"))?,
        label: (!label.is_empty()).then_some(label),
        living_space: parse_decimal(row.get("living_space")),
    })
}

fn parse_contractor(row: &Value) -> Option<(String, Contractor)> {
    let contract_id = value_string(row.get("contract_id"))?;
    Some((
        contract_id,
        Contractor {
            id: value_str(row, "id"),
            first_name: value_str(row, "first_name"),
            last_name: value_str(row, "last_name"),
        },
    ))
}

fn parse_contract(row: &Value, contractors: &[(String, Contractor)]) -> Option<Contract> {
    let id = value_string(row.get("id"))?;
    let Some(rental_start_date) = parse_date(row.get("rental_start_date")) else {
        tracing::warn!(contract_id = %id, "Contract without rental start date skipped");
        return None;
    };
    let contract_contractors = contractors
        .iter()
        .filter(|(contract_id, _)| *contract_id == id)
        .map(|(_, contractor)| contractor.clone())
        .collect();
    Some(Contract {
        unit_id: value_string(row.get("local_id"))?,
        rental_start_date,
        rental_end_date: parse_date(row.get("rental_end_date")),
        additional_costs: parse_decimal(row.get("additional_costs")),
        contractors: contract_contractors,
        id,
    })
}

fn parse_invoice(row: &Value) -> Option<CostInvoice> {
    Some(CostInvoice {
        id: value_string(row.get("id"))?,
        cost_type: value_string(row.get("cost_type")),
        total_amount: parse_decimal(row.get("total_amount")),
        invoice_date: parse_date(row.get("invoice_date")),
        document_name: value_string(row.get("document_name")),
        purpose: value_string(row.get("purpose")),
        notes: value_string(row.get("notes")),
        kwh: parse_decimal(row.get("kwh")),
        allocation_key: value_string(row.get("allocation_key"))
            .and_then(|raw| AllocationKey::parse(&raw)),
        for_all_tenants: value_bool(row.get("for_all_tenants")).unwrap_or(true),
        direct_unit_id: value_string(row.get("direct_local_id")),
    })
}

fn parse_unit_meter(row: &Value) -> Option<UnitMeter> {
    Some(UnitMeter {
        device_id: value_string(row.get("meter_number"))?,
        unit_id: value_string(row.get("local_id"))?,
        kind: value_string(row.get("meter_type"))
            .and_then(|raw| MeterKind::from_device_type(&raw)),
    })
}

/// Gateway record: top-level columns plus the decoded telegram in
/// `parsed_data`. Records without a known device type or date are dropped.
fn parse_reading(record: &Value) -> Option<MeterReading> {
    let parsed = record.get("parsed_data").filter(|value| value.is_object());
    let field = |key: &str| {
        parsed
            .and_then(|data| data.get(key))
            .filter(|value| !value.is_null())
            .or_else(|| record.get(key).filter(|value| !value.is_null()))
    };
    let first_of = |keys: &[&str]| keys.iter().find_map(|key| field(*key));

    let device_id = value_string(field("device_id"))
        .or_else(|| value_string(field("ID")))
        .or_else(|| value_string(field("Number Meter")))?;
    let kind = value_string(field("device_type"))
        .or_else(|| value_string(field("Device Type")))
        .and_then(|raw| MeterKind::from_device_type(&raw))?;
    let read_on = parse_date(first_of(DATE_KEYS))?;
    let value_keys = match kind {
        MeterKind::Heat => HEAT_VALUE_KEYS,
        MeterKind::WarmWater | MeterKind::ColdWater => VOLUME_VALUE_KEYS,
    };
    let value = parse_decimal(first_of(value_keys))?;

    Some(MeterReading {
        device_id,
        kind,
        read_on,
        value,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::{
        data_source_error, ensure_readings, not_found_as, overlaps_period, parse_building,
        parse_contract, parse_contractor, parse_date, parse_document, parse_invoice,
        parse_reading, parse_unit, reading_window,
    };
    use crate::error::AppError;
    use crate::services::heating_bill::error::BillingError;
    use crate::services::heating_bill::fixtures::mock_inputs;
    use crate::services::heating_bill::types::{AllocationKey, BillingPeriod, MeterKind};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn parses_dates_in_all_stored_formats() {
        assert_eq!(parse_date(Some(&json!("2024-12-31"))), Some(date("2024-12-31")));
        assert_eq!(
            parse_date(Some(&json!("2025-03-03T09:15:00.123+00:00"))),
            Some(date("2025-03-03"))
        );
        assert_eq!(parse_date(Some(&json!("31.12.2024 23:59"))), Some(date("2024-12-31")));
        assert_eq!(parse_date(Some(&json!("gestern"))), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn parses_document_row() {
        let document = parse_document(&json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "objekt_id": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "start_date": "2024-01-01",
            "end_date": "2024-12-31",
            "created_at": "2025-01-10T08:00:00+00:00",
            "living_space_share": "40",
            "consumption_dependent": 60,
            "user_id": "owner-1"
        }))
        .expect("document");
        assert_eq!(
            document.building_id.as_deref(),
            Some("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        );
        assert_eq!(document.living_space_share, Some(dec!(40)));
        assert_eq!(document.consumption_dependent, Some(dec!(60)));
        assert_eq!(document.created_at, Some(date("2025-01-10")));
        assert_eq!(document.owner_id.as_deref(), Some("owner-1"));

        let error = parse_document(&json!({ "start_date": "2024-01-01" })).expect_err("no id");
        assert_eq!(error, BillingError::incomplete("id"));
    }

    #[test]
    fn document_without_valid_period_is_not_empty_data() {
        let mut document = mock_inputs().document;
        let (start, period) = reading_window(&document).expect("window");
        assert_eq!(start, date("2023-12-25"));
        assert_eq!(period.end, date("2024-12-31"));

        document.end_date = None;
        assert_eq!(
            reading_window(&document).expect_err("no end date"),
            BillingError::incomplete("end_date")
        );

        document.end_date = Some(date("2023-12-31"));
        assert!(matches!(
            reading_window(&document),
            Err(BillingError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn keeps_contracts_overlapping_the_period() {
        let period = BillingPeriod::new(date("2024-01-01"), date("2024-12-31")).expect("period");
        let open = json!({ "rental_start_date": "2019-04-01", "rental_end_date": null });
        let ended_before = json!({
            "rental_start_date": "2019-04-01",
            "rental_end_date": "2023-12-31"
        });
        let ends_on_first_day = json!({
            "rental_start_date": "2020-01-01",
            "rental_end_date": "2024-01-01"
        });
        let starts_after = json!({ "rental_start_date": "2025-01-01" });
        assert!(overlaps_period(&open, &period));
        assert!(!overlaps_period(&ended_before, &period));
        assert!(overlaps_period(&ends_on_first_day, &period));
        assert!(!overlaps_period(&starts_after, &period));
    }

    #[test]
    fn building_takes_first_heating_system() {
        let building = parse_building(&json!({
            "id": "b1",
            "street": "Hauptstraße 5 ",
            "zip": "80331",
            "heating_systems": ["Erdgas", "Solar"]
        }));
        assert_eq!(building.street, "Hauptstraße 5");
        assert_eq!(building.energy_carrier.as_deref(), Some("Erdgas"));
        let single = parse_building(&json!({ "id": "b2", "heating_systems": "Heizöl" }));
        assert_eq!(single.energy_carrier.as_deref(), Some("Heizöl"));
        let none = parse_building(&json!({ "id": "b3", "heating_systems": [] }));
        assert_eq!(none.energy_carrier, None);
    }

    #[test]
    fn unit_label_joins_floor_and_location() {
        let unit = parse_unit(&json!({
            "id": "u1",
            "floor": "EG",
            "house_location": "links",
            "living_space": "72,5"
        }))
        .expect("unit");
        assert_eq!(unit.label.as_deref(), Some("EG links"));
        assert_eq!(unit.living_space, Some(dec!(72.5)));
        let bare = parse_unit(&json!({ "id": "u2", "living_space": 50 })).expect("unit");
        assert_eq!(bare.label, None);
    }

    #[test]
    fn contract_collects_its_contractors() {
        let contractors = [
            json!({ "id": "t1", "contract_id": "c1", "first_name": "Eva", "last_name": "Klein" }),
            json!({ "id": "t2", "contract_id": "c2", "first_name": "Tom", "last_name": "Groß" }),
        ]
        .iter()
        .filter_map(parse_contractor)
        .collect::<Vec<_>>();
        let contract = parse_contract(
            &json!({
                "id": "c1",
                "local_id": "u1",
                "rental_start_date": "2023-05-01",
                "rental_end_date": null,
                "additional_costs": "85.50"
            }),
            &contractors,
        )
        .expect("contract");
        assert_eq!(contract.contractors.len(), 1);
        assert_eq!(contract.tenant_names(), "Eva Klein");
        assert_eq!(contract.rental_end_date, None);
        assert_eq!(contract.additional_costs, Some(dec!(85.50)));

        let undated = parse_contract(&json!({ "id": "c3", "local_id": "u1" }), &contractors);
        assert!(undated.is_none());
    }

    #[test]
    fn invoice_flags_and_keys() {
        let invoice = parse_invoice(&json!({
            "id": "i1",
            "cost_type": "Maintenance Costs",
            "total_amount": "1.234,56",
            "allocation_key": "Wohnfläche",
            "for_all_tenants": "false",
            "direct_local_id": "u2"
        }))
        .expect("invoice");
        assert_eq!(invoice.total_amount, Some(dec!(1234.56)));
        assert_eq!(invoice.allocation_key, Some(AllocationKey::LivingSpace));
        assert!(invoice.is_direct());
        assert_eq!(invoice.direct_unit_id.as_deref(), Some("u2"));

        let plain = parse_invoice(&json!({ "id": "i2", "total_amount": 99.9 })).expect("invoice");
        assert!(plain.for_all_tenants);
        assert_eq!(plain.total_amount, Some(dec!(99.9)));
    }

    #[test]
    fn reading_uses_parsed_telegram_fields() {
        let heat = parse_reading(&json!({
            "device_id": "12345678",
            "device_type": "Heat",
            "frame_type": "SND_NR",
            "parsed_data": {
                "IV,0,0,0,,Date/Time": "31.12.2024 23:45",
                "IV,0,0,0,Wh,E": "1520000"
            }
        }))
        .expect("heat reading");
        assert_eq!(heat.kind, MeterKind::Heat);
        assert_eq!(heat.read_on, date("2024-12-31"));
        assert_eq!(heat.value, dec!(1520000));

        let water = parse_reading(&json!({
            "ID": "W-1",
            "Device Type": "Warmwasserzähler",
            "parsed_data": { "Actual Date": "2024-06-30", "Actual Volume": "12,75" }
        }))
        .expect("water reading");
        assert_eq!(water.device_id, "W-1");
        assert_eq!(water.kind, MeterKind::WarmWater);
        assert_eq!(water.value, dec!(12.75));

        let unknown = parse_reading(&json!({
            "device_id": "X",
            "device_type": "Rauchmelder",
            "parsed_data": { "Actual Date": "2024-06-30" }
        }));
        assert!(unknown.is_none());
    }

    #[test]
    fn missing_readings_are_no_data() {
        let mut inputs = mock_inputs();
        let unit_id = inputs.units[0].id.clone();
        assert!(ensure_readings(&inputs, Some(&unit_id)).is_ok());
        assert!(ensure_readings(&inputs, None).is_ok());

        inputs.readings.clear();
        assert_eq!(
            ensure_readings(&inputs, Some(&unit_id)),
            Err(BillingError::NoData { unit_id: unit_id.clone() })
        );
        assert!(matches!(
            ensure_readings(&inputs, None),
            Err(BillingError::NoData { .. })
        ));
    }

    #[test]
    fn maps_repository_errors() {
        assert_eq!(
            not_found_as(AppError::NotFound("gone".to_string()), "building", "b1"),
            BillingError::NotFound {
                entity: "building",
                id: "b1".to_string(),
            }
        );
        assert_eq!(
            data_source_error(AppError::Dependency("Database operation failed.".to_string())),
            BillingError::DataSourceUnavailable("Database operation failed.".to_string())
        );
    }
}
