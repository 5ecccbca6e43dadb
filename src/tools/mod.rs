//! SolarEdge tools served over MCP.
//!
//! [`ToolName`] is the closed set of tools. [`SolarTools`] turns a call into
//! one or more [`RemoteOperation`]s, applies the per-tool defaults and
//! post-processes the answer where a tool calls for it.

mod analysis;
mod args;
mod error;
mod range;
mod registry;

use std::str::FromStr;

use futures_lite::future;
use serde_json::{Value, json};
use solaredge_api::{RemoteAdapter, RemoteOperation, TimeUnit};
use solaredge_mcp_rpc::{ToolDescriptor, ToolService};
use time::OffsetDateTime;
use tracing::debug;

pub use analysis::{EnergyStats, daily_performance, energy_readings};
pub use args::{
    AnalysisArgs, EnergyRangeArgs, EnvironmentalBenefitsArgs, PowerRangeArgs, RecentEnergyArgs,
    RecentPowerArgs,
};
pub use error::ToolError;
pub use range::RecentRange;
pub use registry::ToolRegistry;

use args::decode;

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// `get_site_overview`
    SiteOverview,
    /// `get_current_power_flow`
    CurrentPowerFlow,
    /// `get_site_details`
    SiteDetails,
    /// `get_recent_energy_data`
    RecentEnergyData,
    /// `get_recent_power_data`
    RecentPowerData,
    /// `get_energy_data`
    EnergyData,
    /// `get_power_data`
    PowerData,
    /// `get_current_status`
    CurrentStatus,
    /// `get_environmental_benefits`
    EnvironmentalBenefits,
    /// `get_site_equipment`
    SiteEquipment,
    /// `analyze_daily_performance`
    AnalyzeDailyPerformance,
}

impl ToolName {
    /// Every tool, in advertisement order.
    pub const ALL: [Self; 11] = [
        Self::SiteOverview,
        Self::CurrentPowerFlow,
        Self::SiteDetails,
        Self::RecentEnergyData,
        Self::RecentPowerData,
        Self::EnergyData,
        Self::PowerData,
        Self::CurrentStatus,
        Self::EnvironmentalBenefits,
        Self::SiteEquipment,
        Self::AnalyzeDailyPerformance,
    ];

    /// Name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SiteOverview => "get_site_overview",
            Self::CurrentPowerFlow => "get_current_power_flow",
            Self::SiteDetails => "get_site_details",
            Self::RecentEnergyData => "get_recent_energy_data",
            Self::RecentPowerData => "get_recent_power_data",
            Self::EnergyData => "get_energy_data",
            Self::PowerData => "get_power_data",
            Self::CurrentStatus => "get_current_status",
            Self::EnvironmentalBenefits => "get_environmental_benefits",
            Self::SiteEquipment => "get_site_equipment",
            Self::AnalyzeDailyPerformance => "analyze_daily_performance",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The SolarEdge tool catalogue backed by a remote adapter.
pub struct SolarTools<A> {
    registry: ToolRegistry,
    remote: A,
    clock: fn() -> OffsetDateTime,
}

impl<A> std::fmt::Debug for SolarTools<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolarTools")
            .field("tools", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<A: RemoteAdapter> SolarTools<A> {
    /// Serve the full catalogue through `remote`.
    pub fn new(remote: A) -> Self {
        Self {
            registry: ToolRegistry::new(),
            remote,
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Replace the clock "recent" ranges are measured from.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// The advertised catalogue.
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The adapter remote calls go through.
    pub const fn remote(&self) -> &A {
        &self.remote
    }

    /// Run `tool` with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments do not fit the tool, if a remote call
    /// fails, or if the answer has an unexpected shape.
    pub async fn invoke(&self, tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
        match tool {
            ToolName::SiteOverview => self.fetch(RemoteOperation::SiteOverview).await,
            ToolName::CurrentPowerFlow => self.fetch(RemoteOperation::CurrentPowerFlow).await,
            ToolName::SiteDetails => self.fetch(RemoteOperation::SiteDetails).await,
            ToolName::RecentEnergyData => {
                let args: RecentEnergyArgs = decode(tool, arguments)?;
                let (start_date, end_date) = self.recent(tool, args.days)?.dates()?;
                self.fetch(RemoteOperation::SiteEnergy {
                    start_date,
                    end_date,
                    time_unit: Some(args.time_unit),
                })
                .await
            }
            ToolName::RecentPowerData => {
                let args: RecentPowerArgs = decode(tool, arguments)?;
                let (start_time, end_time) = self.recent(tool, args.days)?.times()?;
                self.fetch(RemoteOperation::SitePower {
                    start_time,
                    end_time,
                })
                .await
            }
            ToolName::EnergyData => {
                let args: EnergyRangeArgs = decode(tool, arguments)?;
                self.fetch(RemoteOperation::SiteEnergy {
                    start_date: args.start_date,
                    end_date: args.end_date,
                    time_unit: args.time_unit,
                })
                .await
            }
            ToolName::PowerData => {
                let args: PowerRangeArgs = decode(tool, arguments)?;
                self.fetch(RemoteOperation::SitePower {
                    start_time: args.start_time,
                    end_time: args.end_time,
                })
                .await
            }
            ToolName::CurrentStatus => self.current_status().await,
            ToolName::EnvironmentalBenefits => {
                let args: EnvironmentalBenefitsArgs = decode(tool, arguments)?;
                self.fetch(RemoteOperation::EnvironmentalBenefits {
                    system_units: Some(args.system_units),
                })
                .await
            }
            ToolName::SiteEquipment => self.fetch(RemoteOperation::Inventory).await,
            ToolName::AnalyzeDailyPerformance => {
                let args: AnalysisArgs = decode(tool, arguments)?;
                let (start_date, end_date) = self.recent(tool, args.days)?.dates()?;
                let response = self
                    .fetch(RemoteOperation::SiteEnergy {
                        start_date,
                        end_date,
                        time_unit: Some(TimeUnit::Day),
                    })
                    .await?;
                daily_performance(args.days, response)
            }
        }
    }

    async fn fetch(&self, operation: RemoteOperation) -> Result<Value, ToolError> {
        Ok(self.remote.call(operation).await?)
    }

    /// Overview, power flow and details, fetched concurrently. Any failure
    /// fails the whole call.
    async fn current_status(&self) -> Result<Value, ToolError> {
        let (overview, (power_flow, details)) = future::try_zip(
            self.fetch(RemoteOperation::SiteOverview),
            future::try_zip(
                self.fetch(RemoteOperation::CurrentPowerFlow),
                self.fetch(RemoteOperation::SiteDetails),
            ),
        )
        .await?;

        Ok(json!({
            "overview": overview,
            "powerFlow": power_flow,
            "details": details,
        }))
    }

    fn recent(&self, tool: ToolName, days: u32) -> Result<RecentRange, ToolError> {
        RecentRange::ending_at((self.clock)(), days).ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.as_str(),
            message: format!("days out of range: {days}"),
        })
    }
}

impl<A: RemoteAdapter> ToolService for SolarTools<A> {
    type Error = ToolError;

    fn definitions(&self) -> &[ToolDescriptor] {
        self.registry.definitions()
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool: ToolName = name.parse()?;
        debug!("Calling tool {}", tool);
        self.invoke(tool, arguments).await
    }
}
