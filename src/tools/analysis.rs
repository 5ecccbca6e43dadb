//! Daily performance statistics over an energy series.

use serde_json::{Value, json};

use super::ToolError;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Summary statistics of a series of daily readings, in Wh.
///
/// `average`, `max` and `min` are `None` for an empty series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyStats {
    /// Readings that carried a value.
    pub count: usize,
    /// Sum of the readings.
    pub total: f64,
    /// Mean reading.
    pub average: Option<f64>,
    /// Largest reading.
    pub max: Option<f64>,
    /// Smallest reading.
    pub min: Option<f64>,
}

impl EnergyStats {
    /// Compute statistics over `readings`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_readings(readings: &[f64]) -> Self {
        let count = readings.len();
        let total: f64 = readings.iter().sum();
        let max = readings.iter().copied().reduce(f64::max);
        let min = readings.iter().copied().reduce(f64::min);
        let average = (count > 0).then(|| total / count as f64);
        Self {
            count,
            total,
            average,
            max,
            min,
        }
    }
}

/// Readings of an energy response, skipping entries without a numeric value.
///
/// # Errors
///
/// Returns an error if the response has no `energy.values` array.
pub fn energy_readings(response: &Value) -> Result<Vec<f64>, ToolError> {
    let values = response
        .pointer("/energy/values")
        .and_then(Value::as_array)
        .ok_or_else(|| ToolError::UnexpectedResponse {
            operation: "energy",
            detail: "missing energy.values".to_string(),
        })?;

    Ok(values
        .iter()
        .filter_map(|entry| entry.get("value").and_then(Value::as_f64))
        .collect())
}

/// Build the `analyze_daily_performance` report for a daily energy response.
///
/// # Errors
///
/// Returns an error if the response has no `energy.values` array.
pub fn daily_performance(days: u32, response: Value) -> Result<Value, ToolError> {
    let stats = EnergyStats::from_readings(&energy_readings(&response)?);
    let kwh = |wh: f64| wh / 1000.0;

    Ok(json!({
        "period": {
            "days": days,
            "totalMeasurements": stats.count,
        },
        "performance": {
            "totalEnergyWh": number(stats.total),
            "totalEnergyKWh": number(kwh(stats.total)),
            "averageDailyWh": stats.average.map(number),
            "averageDailyKWh": stats.average.map(kwh).map(number),
            "maxDailyWh": stats.max.map(number),
            "maxDailyKWh": stats.max.map(kwh).map(number),
            "minDailyWh": stats.min.map(number),
            "minDailyKWh": stats.min.map(kwh).map(number),
        },
        "rawData": response,
    }))
}

/// A JSON number, integral when the value is. Non-finite values become `null`.
#[allow(clippy::cast_possible_truncation)]
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
