use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use super::interval::DateInterval;
use super::money::round6;
use super::types::{DeviceReadingRow, MeterKind, MeterReading, UnitMeter};

pub const WH_PER_KWH: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
pub const WH_PER_MWH: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Consumption of one device over an interval, in register units
/// (Wh for heat meters, m³ for water meters).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDelta {
    pub device_id: String,
    pub kind: MeterKind,
    pub start: Decimal,
    pub end: Decimal,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Consumption {
    pub heat_wh: Decimal,
    pub warm_water_m3: Decimal,
    pub cold_water_m3: Decimal,
}

impl Consumption {
    pub fn heat_mwh(&self) -> Decimal {
        self.heat_wh / WH_PER_MWH
    }

    pub fn heat_kwh(&self) -> Decimal {
        self.heat_wh / WH_PER_KWH
    }

    pub fn get(&self, kind: MeterKind) -> Decimal {
        match kind {
            MeterKind::Heat => self.heat_wh,
            MeterKind::WarmWater => self.warm_water_m3,
            MeterKind::ColdWater => self.cold_water_m3,
        }
    }

    fn add(&mut self, kind: MeterKind, delta: Decimal) {
        match kind {
            MeterKind::Heat => self.heat_wh += delta,
            MeterKind::WarmWater => self.warm_water_m3 += delta,
            MeterKind::ColdWater => self.cold_water_m3 += delta,
        }
    }
}

/// Per-device deltas over `interval`.
///
/// The start value is the latest reading on or before `interval.start`; when
/// the device has none, its first reading inside the interval is used. The
/// end value is the latest reading on or before `interval.end`. Devices with
/// no usable reading are skipped. Deltas never go negative (meter swaps and
/// resets count as zero consumption).
pub fn device_deltas(readings: &[MeterReading], interval: &DateInterval) -> Vec<DeviceDelta> {
    let mut by_device: BTreeMap<(&str, MeterKind), Vec<&MeterReading>> = BTreeMap::new();
    for reading in readings {
        by_device
            .entry((reading.device_id.as_str(), reading.kind))
            .or_default()
            .push(reading);
    }

    let mut deltas = Vec::with_capacity(by_device.len());
    for ((device_id, kind), mut points) in by_device {
        points.sort_by_key(|point| point.read_on);

        let at_or_before_start = points
            .iter()
            .rev()
            .find(|point| point.read_on <= interval.start);
        let first_inside = points.iter().find(|point| interval.contains(point.read_on));
        let Some(start) = at_or_before_start.or(first_inside).map(|point| point.value) else {
            continue;
        };
        let end = points
            .iter()
            .rev()
            .find(|point| point.read_on <= interval.end)
            .map(|point| point.value)
            .unwrap_or(start);

        deltas.push(DeviceDelta {
            device_id: device_id.to_string(),
            kind,
            start,
            end,
            delta: (end - start).max(Decimal::ZERO),
        });
    }
    deltas
}

pub fn total_consumption(deltas: &[DeviceDelta]) -> Consumption {
    let mut total = Consumption::default();
    for delta in deltas {
        total.add(delta.kind, delta.delta);
    }
    total
}

/// Sums deltas per unit using the device-to-unit assignment. Devices without
/// an assignment are left out.
pub fn consumption_by_unit(
    deltas: &[DeviceDelta],
    unit_meters: &[UnitMeter],
) -> BTreeMap<String, Consumption> {
    let assignment = unit_meters
        .iter()
        .map(|meter| (meter.device_id.as_str(), meter.unit_id.as_str()))
        .collect::<BTreeMap<_, _>>();

    let mut by_unit: BTreeMap<String, Consumption> = BTreeMap::new();
    for delta in deltas {
        if let Some(unit_id) = assignment.get(delta.device_id.as_str()) {
            by_unit
                .entry((*unit_id).to_string())
                .or_default()
                .add(delta.kind, delta.delta);
        }
    }
    by_unit
}

pub fn unassigned_devices<'a>(
    deltas: &'a [DeviceDelta],
    unit_meters: &[UnitMeter],
) -> Vec<&'a str> {
    let assigned = unit_meters
        .iter()
        .map(|meter| meter.device_id.as_str())
        .collect::<BTreeSet<_>>();
    deltas
        .iter()
        .map(|delta| delta.device_id.as_str())
        .filter(|device_id| !assigned.contains(device_id))
        .collect()
}

/// Readings of the devices assigned to `unit_id`.
pub fn readings_for_unit(
    readings: &[MeterReading],
    unit_meters: &[UnitMeter],
    unit_id: &str,
) -> Vec<MeterReading> {
    let devices = unit_meters
        .iter()
        .filter(|meter| meter.unit_id == unit_id)
        .map(|meter| meter.device_id.as_str())
        .collect::<BTreeSet<_>>();
    readings
        .iter()
        .filter(|reading| devices.contains(reading.device_id.as_str()))
        .cloned()
        .collect()
}

/// Display row: heat meters in MWh, water meters in m³.
pub fn device_row(delta: &DeviceDelta) -> DeviceReadingRow {
    let scale = |value: Decimal| match delta.kind {
        MeterKind::Heat => round6(value / WH_PER_MWH),
        MeterKind::WarmWater | MeterKind::ColdWater => value,
    };
    DeviceReadingRow {
        device_id: delta.device_id.clone(),
        kind: delta.kind,
        unit: delta.kind.unit_label().to_string(),
        start_reading: scale(delta.start),
        end_reading: scale(delta.end),
        consumption: scale(delta.delta),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{
        consumption_by_unit, device_deltas, device_row, total_consumption, unassigned_devices,
    };
    use crate::services::heating_bill::interval::DateInterval;
    use crate::services::heating_bill::types::{MeterKind, MeterReading, UnitMeter};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn reading(device: &str, kind: MeterKind, on: &str, value: Decimal) -> MeterReading {
        MeterReading {
            device_id: device.to_string(),
            kind,
            read_on: date(on),
            value,
        }
    }

    fn year() -> DateInterval {
        DateInterval::new(date("2025-01-01"), date("2025-12-31")).expect("period")
    }

    #[test]
    fn picks_closest_readings_at_or_before_bounds() {
        let readings = vec![
            reading("H1", MeterKind::Heat, "2024-12-20", dec!(1000000)),
            reading("H1", MeterKind::Heat, "2024-12-28", dec!(1500000)),
            reading("H1", MeterKind::Heat, "2025-06-30", dec!(2000000)),
            reading("H1", MeterKind::Heat, "2025-12-31", dec!(4500000)),
            reading("H1", MeterKind::Heat, "2026-01-02", dec!(4600000)),
        ];
        let deltas = device_deltas(&readings, &year());
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].start, dec!(1500000));
        assert_eq!(deltas[0].end, dec!(4500000));
        assert_eq!(deltas[0].delta, dec!(3000000));

        let total = total_consumption(&deltas);
        assert_eq!(total.heat_mwh(), dec!(3));
        assert_eq!(total.heat_kwh(), dec!(3000));
    }

    #[test]
    fn falls_back_to_first_reading_inside_the_interval() {
        let readings = vec![
            reading("W1", MeterKind::WarmWater, "2025-03-01", dec!(10.5)),
            reading("W1", MeterKind::WarmWater, "2025-12-31", dec!(22.5)),
        ];
        let deltas = device_deltas(&readings, &year());
        assert_eq!(deltas[0].delta, dec!(12.0));
    }

    #[test]
    fn meter_reset_counts_as_zero() {
        let readings = vec![
            reading("K1", MeterKind::ColdWater, "2025-01-01", dec!(500)),
            reading("K1", MeterKind::ColdWater, "2025-12-31", dec!(3)),
        ];
        let deltas = device_deltas(&readings, &year());
        assert_eq!(deltas[0].delta, Decimal::ZERO);
    }

    #[test]
    fn device_without_readings_in_window_is_skipped() {
        let readings = vec![reading("K1", MeterKind::ColdWater, "2026-02-01", dec!(5))];
        assert!(device_deltas(&readings, &year()).is_empty());
    }

    #[test]
    fn groups_consumption_by_assigned_unit() {
        let readings = vec![
            reading("H1", MeterKind::Heat, "2025-01-01", dec!(0)),
            reading("H1", MeterKind::Heat, "2025-12-31", dec!(2000000)),
            reading("W1", MeterKind::WarmWater, "2025-01-01", dec!(1)),
            reading("W1", MeterKind::WarmWater, "2025-12-31", dec!(11)),
            reading("X9", MeterKind::ColdWater, "2025-01-01", dec!(0)),
            reading("X9", MeterKind::ColdWater, "2025-12-31", dec!(7)),
        ];
        let meters = vec![
            UnitMeter {
                device_id: "H1".to_string(),
                unit_id: "u1".to_string(),
                kind: Some(MeterKind::Heat),
            },
            UnitMeter {
                device_id: "W1".to_string(),
                unit_id: "u1".to_string(),
                kind: None,
            },
        ];
        let deltas = device_deltas(&readings, &year());
        let by_unit = consumption_by_unit(&deltas, &meters);
        let unit = by_unit.get("u1").expect("unit consumption");
        assert_eq!(unit.heat_mwh(), dec!(2));
        assert_eq!(unit.warm_water_m3, dec!(10));
        assert_eq!(unit.cold_water_m3, Decimal::ZERO);
        assert_eq!(unassigned_devices(&deltas, &meters), vec!["X9"]);
    }

    #[test]
    fn heat_rows_are_reported_in_mwh() {
        let readings = vec![
            reading("H1", MeterKind::Heat, "2025-01-01", dec!(1250000)),
            reading("H1", MeterKind::Heat, "2025-12-31", dec!(3750000)),
        ];
        let row = device_row(&device_deltas(&readings, &year())[0]);
        assert_eq!(row.unit, "MWh");
        assert_eq!(row.start_reading, dec!(1.25));
        assert_eq!(row.consumption, dec!(2.5));
    }
}
