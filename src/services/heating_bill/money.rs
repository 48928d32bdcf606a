use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

/// Currency rounding tolerance used by every reconciliation check (2 cents).
pub const EPSILON: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round6(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= EPSILON
}

/// `part / whole`, or zero when `whole` is not positive.
pub fn ratio(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::ZERO {
        part / whole
    } else {
        Decimal::ZERO
    }
}

pub fn percent_of(percent: Decimal, amount: Decimal) -> Decimal {
    percent / HUNDRED * amount
}

/// Reads a decimal out of a database JSON value. Postgres `numeric` columns
/// arrive as strings through `row_to_json`, hand-entered values sometimes
/// carry a German decimal comma.
pub fn parse_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(number) => {
            if let Some(as_i64) = number.as_i64() {
                return Some(Decimal::from(as_i64));
            }
            number
                .as_f64()
                .and_then(Decimal::from_f64_retain)
                .map(|parsed| parsed.round_dp(9).normalize())
        }
        Value::String(text) => parse_decimal_str(text),
        _ => None,
    }
}

pub fn parse_decimal_str(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    // "1.234,56" (German) vs "1,234.56": the later separator is the decimal one.
    let normalized = match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => trimmed.replace('.', "").replace(',', "."),
        (Some(_), None) => trimmed.replace(',', "."),
        _ => trimmed.replace(',', ""),
    };
    normalized.parse::<Decimal>().ok()
}

/// Splits `total` (already in cents) across `weights` with the largest
/// remainder method, so the shares always add up to `total` exactly.
///
/// Returns `None` when no weight is positive. Negative weights count as zero.
/// Ties on the remainder go to the lower index.
pub fn allocate_cents(total: Decimal, weights: &[Decimal]) -> Option<Vec<Decimal>> {
    let clamped = weights
        .iter()
        .map(|weight| (*weight).max(Decimal::ZERO))
        .collect::<Vec<_>>();
    let weight_sum = clamped.iter().copied().sum::<Decimal>();
    if weight_sum <= Decimal::ZERO {
        return None;
    }

    let total_cents = round2(total) * HUNDRED;
    let negative = total_cents < Decimal::ZERO;
    let magnitude = total_cents.abs();

    let mut shares = Vec::with_capacity(clamped.len());
    let mut remainders = Vec::with_capacity(clamped.len());
    let mut assigned = Decimal::ZERO;
    for (index, weight) in clamped.iter().enumerate() {
        let exact = magnitude * *weight / weight_sum;
        let floor = exact.floor();
        assigned += floor;
        shares.push(floor);
        remainders.push((index, exact - floor));
    }

    let leftover = (magnitude - assigned).to_i64().unwrap_or(0).max(0) as usize;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (index, _) in remainders.into_iter().take(leftover) {
        shares[index] += Decimal::ONE;
    }

    Some(
        shares
            .into_iter()
            .map(|cents| {
                let amount = cents / HUNDRED;
                if negative {
                    -amount
                } else {
                    amount
                }
            })
            .collect(),
    )
}
