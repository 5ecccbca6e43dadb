//! Typed tool arguments.
//!
//! Unknown fields are ignored. Omitted optional fields take the defaults
//! advertised in the tool schemas.

use serde::de::{DeserializeOwned, Error as _, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use solaredge_api::{SystemUnits, TimeUnit};

use super::{ToolError, ToolName};

const fn thirty_days() -> u32 {
    30
}

const fn seven_days() -> u32 {
    7
}

/// A day count given as any JSON number. Fractions are truncated toward zero;
/// negative or out-of-range counts are rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn day_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let days = f64::deserialize(deserializer)?;
    if !(0.0..=f64::from(u32::MAX)).contains(&days) {
        return Err(D::Error::invalid_value(
            Unexpected::Float(days),
            &"a non-negative number of days",
        ));
    }
    Ok(days.trunc() as u32)
}

/// Arguments of `get_recent_energy_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEnergyArgs {
    /// Days back from now.
    #[serde(default = "thirty_days", deserialize_with = "day_count")]
    pub days: u32,
    /// Aggregation period.
    #[serde(default)]
    pub time_unit: TimeUnit,
}

/// Arguments of `get_recent_power_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentPowerArgs {
    /// Days back from now.
    #[serde(default = "seven_days", deserialize_with = "day_count")]
    pub days: u32,
}

/// Arguments of `get_energy_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRangeArgs {
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: String,
    /// Aggregation period; left to the service when absent.
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
}

/// Arguments of `get_power_data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerRangeArgs {
    /// Range start, `YYYY-MM-DD HH:MM:SS`.
    pub start_time: String,
    /// Range end, `YYYY-MM-DD HH:MM:SS`.
    pub end_time: String,
}

/// Arguments of `get_environmental_benefits`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalBenefitsArgs {
    /// Unit system for the figures.
    #[serde(default)]
    pub system_units: SystemUnits,
}

/// Arguments of `analyze_daily_performance`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisArgs {
    /// Days back from now.
    #[serde(default = "thirty_days", deserialize_with = "day_count")]
    pub days: u32,
}

/// Decode the arguments of `tool`.
pub(crate) fn decode<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.as_str(),
        message: e.to_string(),
    })
}
