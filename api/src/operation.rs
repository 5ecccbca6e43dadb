//! The catalogue of remote operations.
//!
//! Every operation is scoped to one site. Date parameters are passed through
//! as given: `YYYY-MM-DD` for dates and `YYYY-MM-DD HH:MM:SS` for times.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregation period of an energy series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    /// 15 minutes.
    QuarterOfAnHour,
    /// One hour.
    Hour,
    /// One day.
    #[default]
    Day,
    /// One week.
    Week,
    /// One month.
    Month,
    /// One year.
    Year,
}

impl TimeUnit {
    /// Every unit, shortest first.
    pub const ALL: [Self; 6] = [
        Self::QuarterOfAnHour,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuarterOfAnHour => "QUARTER_OF_AN_HOUR",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit system for environmental figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemUnits {
    /// Metric units.
    #[default]
    Metrics,
    /// Imperial units.
    Imperial,
}

impl SystemUnits {
    /// Every unit system.
    pub const ALL: [Self; 2] = [Self::Metrics, Self::Imperial];

    /// Name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "Metrics",
            Self::Imperial => "Imperial",
        }
    }
}

impl fmt::Display for SystemUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the monitoring API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOperation {
    /// Current production and lifetime totals.
    SiteOverview,
    /// Current power flow between PV, load, grid and storage.
    CurrentPowerFlow,
    /// Location, status and configuration of the site.
    SiteDetails,
    /// Energy production over a date range.
    SiteEnergy {
        /// First day, `YYYY-MM-DD`.
        start_date: String,
        /// Last day, `YYYY-MM-DD`.
        end_date: String,
        /// Aggregation period; the service default applies when absent.
        time_unit: Option<TimeUnit>,
    },
    /// Power samples over a time range.
    SitePower {
        /// Range start, `YYYY-MM-DD HH:MM:SS`.
        start_time: String,
        /// Range end, `YYYY-MM-DD HH:MM:SS`.
        end_time: String,
    },
    /// Per-meter energy over a time range.
    EnergyDetails {
        /// Range start.
        start_time: String,
        /// Range end.
        end_time: String,
        /// Aggregation period.
        time_unit: Option<TimeUnit>,
        /// Meter names to include; all when empty.
        meters: Vec<String>,
    },
    /// Per-meter power over a time range.
    PowerDetails {
        /// Range start.
        start_time: String,
        /// Range end.
        end_time: String,
        /// Meter names to include; all when empty.
        meters: Vec<String>,
    },
    /// Battery telemetry over a time range.
    StorageData {
        /// Range start.
        start_time: String,
        /// Range end.
        end_time: String,
        /// Battery serial numbers to include; all when empty.
        serials: Vec<String>,
    },
    /// CO2 savings and equivalent trees planted.
    EnvironmentalBenefits {
        /// Unit system for the figures.
        system_units: Option<SystemUnits>,
    },
    /// Installed equipment.
    Inventory,
    /// Inverters, optimizers and other components.
    ComponentsList,
    /// Technical telemetry of one inverter.
    InverterTechnicalData {
        /// Inverter serial number.
        serial_number: String,
        /// Range start.
        start_time: String,
        /// Range end.
        end_time: String,
    },
    /// Meter readings over a time range.
    MetersData {
        /// Range start.
        start_time: String,
        /// Range end.
        end_time: String,
        /// Aggregation period.
        time_unit: Option<TimeUnit>,
        /// Meter names to include; all when empty.
        meters: Vec<String>,
    },
    /// Sensor readings over a date range.
    SensorData {
        /// First day, `YYYY-MM-DD`.
        start_date: String,
        /// Last day, `YYYY-MM-DD`.
        end_date: String,
    },
}

impl RemoteOperation {
    /// Short name of the operation. For site operations this is also the
    /// last path segment.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SiteOverview => "overview",
            Self::CurrentPowerFlow => "currentPowerFlow",
            Self::SiteDetails => "details",
            Self::SiteEnergy { .. } => "energy",
            Self::SitePower { .. } => "power",
            Self::EnergyDetails { .. } => "energyDetails",
            Self::PowerDetails { .. } => "powerDetails",
            Self::StorageData { .. } => "storageData",
            Self::EnvironmentalBenefits { .. } => "envBenefits",
            Self::Inventory => "inventory",
            Self::ComponentsList => "componentsList",
            Self::InverterTechnicalData { .. } => "inverterData",
            Self::MetersData { .. } => "meters",
            Self::SensorData { .. } => "sensors",
        }
    }

    /// Request path for the given site, without query.
    #[must_use]
    pub fn path(&self, site_id: u64) -> String {
        match self {
            Self::ComponentsList => format!("/equipment/{site_id}/list"),
            Self::InverterTechnicalData { serial_number, .. } => {
                let serial: String =
                    url::form_urlencoded::byte_serialize(serial_number.as_bytes()).collect();
                format!("/equipment/{site_id}/{serial}/data")
            }
            other => format!("/site/{site_id}/{}", other.name()),
        }
    }

    /// Query parameters, in request order. The API key is not included.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        match self {
            Self::SiteOverview
            | Self::CurrentPowerFlow
            | Self::SiteDetails
            | Self::Inventory
            | Self::ComponentsList => {}
            Self::SiteEnergy {
                start_date,
                end_date,
                time_unit,
            } => {
                query.push(("startDate", start_date.clone()));
                query.push(("endDate", end_date.clone()));
                push_time_unit(&mut query, *time_unit);
            }
            Self::SensorData {
                start_date,
                end_date,
            } => {
                query.push(("startDate", start_date.clone()));
                query.push(("endDate", end_date.clone()));
            }
            Self::SitePower {
                start_time,
                end_time,
            }
            | Self::InverterTechnicalData {
                start_time,
                end_time,
                ..
            } => {
                query.push(("startTime", start_time.clone()));
                query.push(("endTime", end_time.clone()));
            }
            Self::EnergyDetails {
                start_time,
                end_time,
                time_unit,
                meters,
            }
            | Self::MetersData {
                start_time,
                end_time,
                time_unit,
                meters,
            } => {
                query.push(("startTime", start_time.clone()));
                query.push(("endTime", end_time.clone()));
                push_time_unit(&mut query, *time_unit);
                push_list(&mut query, "meters", meters);
            }
            Self::PowerDetails {
                start_time,
                end_time,
                meters,
            } => {
                query.push(("startTime", start_time.clone()));
                query.push(("endTime", end_time.clone()));
                push_list(&mut query, "meters", meters);
            }
            Self::StorageData {
                start_time,
                end_time,
                serials,
            } => {
                query.push(("startTime", start_time.clone()));
                query.push(("endTime", end_time.clone()));
                push_list(&mut query, "serials", serials);
            }
            Self::EnvironmentalBenefits { system_units } => {
                if let Some(units) = system_units {
                    query.push(("systemUnits", units.as_str().to_string()));
                }
            }
        }
        query
    }
}

fn push_time_unit(query: &mut Vec<(&'static str, String)>, time_unit: Option<TimeUnit>) {
    if let Some(unit) = time_unit {
        query.push(("timeUnit", unit.as_str().to_string()));
    }
}

fn push_list(query: &mut Vec<(&'static str, String)>, key: &'static str, items: &[String]) {
    if !items.is_empty() {
        query.push((key, items.join(",")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_paths() {
        assert_eq!(RemoteOperation::SiteOverview.path(42), "/site/42/overview");
        assert_eq!(
            RemoteOperation::CurrentPowerFlow.path(42),
            "/site/42/currentPowerFlow"
        );
        assert_eq!(
            RemoteOperation::EnvironmentalBenefits { system_units: None }.path(42),
            "/site/42/envBenefits"
        );
        assert_eq!(RemoteOperation::Inventory.path(42), "/site/42/inventory");
    }

    #[test]
    fn equipment_paths() {
        assert_eq!(RemoteOperation::ComponentsList.path(7), "/equipment/7/list");
        let op = RemoteOperation::InverterTechnicalData {
            serial_number: "7F123456-B2".to_string(),
            start_time: "2024-01-01 00:00:00".to_string(),
            end_time: "2024-01-02 00:00:00".to_string(),
        };
        assert_eq!(op.path(7), "/equipment/7/7F123456-B2/data");
        assert_eq!(op.query()[0], ("startTime", "2024-01-01 00:00:00".to_string()));
    }

    #[test]
    fn optional_time_unit_is_omitted() {
        let op = RemoteOperation::SiteEnergy {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            time_unit: None,
        };
        assert_eq!(
            op.query(),
            vec![
                ("startDate", "2024-01-01".to_string()),
                ("endDate", "2024-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn lists_are_comma_joined_only_when_present() {
        let op = RemoteOperation::EnergyDetails {
            start_time: "a".to_string(),
            end_time: "b".to_string(),
            time_unit: Some(TimeUnit::QuarterOfAnHour),
            meters: vec!["PRODUCTION".to_string(), "CONSUMPTION".to_string()],
        };
        assert_eq!(
            op.query(),
            vec![
                ("startTime", "a".to_string()),
                ("endTime", "b".to_string()),
                ("timeUnit", "QUARTER_OF_AN_HOUR".to_string()),
                ("meters", "PRODUCTION,CONSUMPTION".to_string()),
            ]
        );

        let op = RemoteOperation::StorageData {
            start_time: "a".to_string(),
            end_time: "b".to_string(),
            serials: Vec::new(),
        };
        assert!(op.query().iter().all(|(key, _)| *key != "serials"));
    }

    #[test]
    fn enums_use_wire_names() {
        for unit in TimeUnit::ALL {
            assert_eq!(
                serde_json::to_value(unit).unwrap(),
                serde_json::Value::String(unit.as_str().to_string())
            );
        }
        assert_eq!(
            serde_json::from_str::<SystemUnits>("\"Imperial\"").unwrap(),
            SystemUnits::Imperial
        );
        assert!(serde_json::from_str::<TimeUnit>("\"day\"").is_err());
        assert_eq!(TimeUnit::default(), TimeUnit::Day);
        assert_eq!(SystemUnits::default().to_string(), "Metrics");
    }
}
