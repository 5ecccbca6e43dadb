//! The fixed tool catalogue advertised by `tools/list`.

use solaredge_api::{SystemUnits, TimeUnit};
use solaredge_mcp_rpc::{InputSchema, PropertySchema, ToolDescriptor};

use super::ToolName;

/// Immutable list of tool descriptors, in advertisement order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Build the catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: ToolName::ALL.into_iter().map(ToolName::descriptor).collect(),
        }
    }

    /// Every descriptor.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Look up a descriptor by tool name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn time_unit_property() -> PropertySchema {
    PropertySchema::string("Time aggregation unit")
        .one_of(TimeUnit::ALL.map(TimeUnit::as_str))
        .default_value(TimeUnit::Day.as_str())
}

impl ToolName {
    /// Human readable description shown to the calling agent.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SiteOverview => {
                "Get current site overview including power generation, energy production, and lifetime statistics"
            }
            Self::CurrentPowerFlow => {
                "Get current power flow between PV, load, grid, and storage systems"
            }
            Self::SiteDetails => {
                "Get detailed site information including location, status, and configuration"
            }
            Self::RecentEnergyData => {
                "Get energy production data for recent days with specified time unit"
            }
            Self::RecentPowerData => {
                "Get power generation data for recent days (15-minute resolution)"
            }
            Self::EnergyData => "Get energy production data for a specific date range",
            Self::PowerData => {
                "Get power generation data for a specific time range (15-minute resolution)"
            }
            Self::CurrentStatus => {
                "Get comprehensive current status including overview, power flow, and site details"
            }
            Self::EnvironmentalBenefits => {
                "Get environmental benefits including CO2 savings and equivalent trees planted"
            }
            Self::SiteEquipment => "Get information about all equipment installed at the site",
            Self::AnalyzeDailyPerformance => {
                "Analyze daily performance patterns over a specified period"
            }
        }
    }

    /// Input schema of the tool.
    #[must_use]
    pub fn input_schema(self) -> InputSchema {
        let schema = InputSchema::object();
        match self {
            Self::SiteOverview
            | Self::CurrentPowerFlow
            | Self::SiteDetails
            | Self::CurrentStatus
            | Self::SiteEquipment => schema,
            Self::RecentEnergyData => schema
                .property(
                    "days",
                    PropertySchema::number("Number of days to retrieve (1-365)").default_value(30),
                )
                .property("timeUnit", time_unit_property()),
            Self::RecentPowerData => schema.property(
                "days",
                PropertySchema::number("Number of days to retrieve (1-30)").default_value(7),
            ),
            Self::EnergyData => schema
                .required_property("startDate", PropertySchema::string("Start date (YYYY-MM-DD)"))
                .required_property("endDate", PropertySchema::string("End date (YYYY-MM-DD)"))
                .property("timeUnit", time_unit_property()),
            Self::PowerData => schema
                .required_property(
                    "startTime",
                    PropertySchema::string("Start time (YYYY-MM-DD HH:MM:SS)"),
                )
                .required_property(
                    "endTime",
                    PropertySchema::string("End time (YYYY-MM-DD HH:MM:SS)"),
                ),
            Self::EnvironmentalBenefits => schema.property(
                "systemUnits",
                PropertySchema::string("Unit system for measurements")
                    .one_of(SystemUnits::ALL.map(SystemUnits::as_str))
                    .default_value(SystemUnits::Metrics.as_str()),
            ),
            Self::AnalyzeDailyPerformance => schema.property(
                "days",
                PropertySchema::number("Number of days to analyze (7-90)").default_value(30),
            ),
        }
    }

    /// Full descriptor of the tool.
    #[must_use]
    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor::new(self.as_str(), self.description(), self.input_schema())
    }
}
