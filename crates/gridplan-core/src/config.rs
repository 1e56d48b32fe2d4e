//! Planning configuration.
//!
//! One immutable [`PlanConfig`] is loaded per run (TOML or JSON) and passed
//! by reference to every stage. [`ModelContext`] pairs it with the parsed
//! [`Horizon`] so model generation never re-validates the levels.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridplanError, GridplanResult};
use crate::step::{Horizon, Level};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub horizon: HorizonConfig,
    /// Model DC power flow on arcs between DC-coded nodes.
    pub use_dc_flow: bool,
    /// Solve with Benders decomposition instead of one monolithic LP.
    pub use_benders: bool,
    /// Node kind of the DC-modelled electric subnetwork.
    pub dc_code: String,
    /// Second kind character marking storage nodes.
    pub storage_code: char,
    /// Sustainability metrics tracked per year (e.g. `CO2`).
    pub metrics: Vec<String>,
    /// Contingency events used by the resilience evaluation.
    pub events: Vec<EventSpec>,
    pub reserves: ReserveCalibration,
    pub decomposition: DecompositionConfig,
    pub aggregate_load: AggregateLoad,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            horizon: HorizonConfig::default(),
            use_dc_flow: false,
            use_benders: true,
            dc_code: "EL".to_string(),
            storage_code: 'S',
            metrics: Vec::new(),
            events: Vec::new(),
            reserves: ReserveCalibration::default(),
            decomposition: DecompositionConfig::default(),
            aggregate_load: AggregateLoad::default(),
        }
    }
}

impl PlanConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> GridplanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            other => {
                return Err(GridplanError::Config(format!(
                    "unsupported config extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> GridplanResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn horizon(&self) -> GridplanResult<Horizon> {
        Horizon::new(self.horizon.levels.clone(), self.horizon.step_hours.clone())
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == metric)
    }

    pub fn validate(&self) -> GridplanResult<()> {
        let horizon = self.horizon()?;
        if self.dc_code.len() != 2 {
            return Err(GridplanError::Config(format!(
                "dc_code '{}' must have two characters",
                self.dc_code
            )));
        }
        for (i, metric) in self.metrics.iter().enumerate() {
            if metric.is_empty() || self.metrics[..i].contains(metric) {
                return Err(GridplanError::Config(format!(
                    "metric '{}' is empty or repeated",
                    metric
                )));
            }
        }
        for event in &self.events {
            if let Some(year) = event.years.iter().find(|y| **y == 0 || **y > horizon.years()) {
                return Err(GridplanError::Config(format!(
                    "event '{}' names year {} outside the horizon",
                    event.name, year
                )));
            }
        }
        self.decomposition.validate()
    }
}

/// Resolution levels and hours per finest step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub levels: Vec<Level>,
    /// Hours of each finest sub-year step; empty spreads 8760 evenly.
    pub step_hours: Vec<f64>,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            levels: vec![Level::new('Y', 1)],
            step_hours: Vec::new(),
        }
    }
}

/// A contingency event and the years it strikes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    pub years: Vec<u32>,
}

/// Statistical multipliers of the reserve and regulation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveCalibration {
    /// Regulation-up requirement multiplier and cost divisor.
    pub regulation_up_sigma: f64,
    /// Regulation-down requirement multiplier and cost divisor.
    pub regulation_down_sigma: f64,
    /// Fuel drawn per unit of regulation up.
    pub regulation_up_fuel: f64,
    /// Fuel returned per unit of regulation down.
    pub regulation_down_fuel: f64,
    pub peak_1: f64,
    pub peak_10: f64,
    pub peak_30: f64,
    pub peak_60: f64,
}

impl Default for ReserveCalibration {
    fn default() -> Self {
        Self {
            regulation_up_sigma: 3.0,
            regulation_down_sigma: 3.5,
            regulation_up_fuel: 0.33333,
            regulation_down_fuel: 0.285,
            peak_1: 1.0,
            peak_10: 1.0,
            peak_30: 1.0,
            peak_60: 1.0,
        }
    }
}

impl ReserveCalibration {
    pub fn peak(&self, speed: ResponseSpeed) -> f64 {
        match speed {
            ResponseSpeed::OneMinute => self.peak_1,
            ResponseSpeed::TenMinute => self.peak_10,
            ResponseSpeed::ThirtyMinute => self.peak_30,
            ResponseSpeed::SixtyMinute => self.peak_60,
        }
    }
}

/// Benders loop limits, tolerances and sentinel objective values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    pub max_iterations: usize,
    /// A cost estimate below `tolerance * subproblem cost` triggers a cut.
    pub optimality_tolerance: f64,
    /// Slack added to the relative test for near-zero costs.
    pub absolute_tolerance: f64,
    /// Total row violation above which a year counts as infeasible for
    /// the master's capacities.
    pub feasibility_tolerance: f64,
    /// Objective reported for every goal when the master is infeasible.
    pub infeasible_objective: f64,
    /// Cost assigned to an event whose operation becomes infeasible.
    pub event_penalty: f64,
    /// Resilience metric when any event was infeasible.
    pub resilience_penalty: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            optimality_tolerance: 0.999,
            absolute_tolerance: 1e-6,
            feasibility_tolerance: 1e-6,
            infeasible_objective: 1e30,
            event_penalty: 1e10,
            resilience_penalty: 1e9,
        }
    }
}

impl DecompositionConfig {
    pub fn validate(&self) -> GridplanResult<()> {
        if self.max_iterations == 0 {
            return Err(GridplanError::Config("max_iterations must be positive".into()));
        }
        if !(self.optimality_tolerance > 0.0 && self.optimality_tolerance <= 1.0) {
            return Err(GridplanError::Config(format!(
                "optimality_tolerance {} must lie in (0, 1]",
                self.optimality_tolerance
            )));
        }
        if self.absolute_tolerance < 0.0 {
            return Err(GridplanError::Config("absolute_tolerance must be non-negative".into()));
        }
        if !(self.feasibility_tolerance > 0.0) {
            return Err(GridplanError::Config("feasibility_tolerance must be positive".into()));
        }
        Ok(())
    }
}

/// Response speeds of the regulation and ramping reserve products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSpeed {
    OneMinute,
    TenMinute,
    ThirtyMinute,
    SixtyMinute,
}

impl ResponseSpeed {
    pub const RAMPS: [ResponseSpeed; 3] = [
        ResponseSpeed::TenMinute,
        ResponseSpeed::ThirtyMinute,
        ResponseSpeed::SixtyMinute,
    ];

    pub fn minutes(self) -> f64 {
        match self {
            ResponseSpeed::OneMinute => 1.0,
            ResponseSpeed::TenMinute => 10.0,
            ResponseSpeed::ThirtyMinute => 30.0,
            ResponseSpeed::SixtyMinute => 60.0,
        }
    }

    /// Suffix used in row and column names (`10`, `30`, `60`).
    pub fn suffix(self) -> &'static str {
        match self {
            ResponseSpeed::OneMinute => "1",
            ResponseSpeed::TenMinute => "10",
            ResponseSpeed::ThirtyMinute => "30",
            ResponseSpeed::SixtyMinute => "60",
        }
    }
}

/// Aggregate load seen by each node for each response speed, used to size
/// the wind-driven regulation and ramp requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateLoad {
    pub one_minute: BTreeMap<String, f64>,
    pub ten_minute: BTreeMap<String, f64>,
    pub thirty_minute: BTreeMap<String, f64>,
    pub sixty_minute: BTreeMap<String, f64>,
}

impl AggregateLoad {
    fn table(&self, speed: ResponseSpeed) -> &BTreeMap<String, f64> {
        match speed {
            ResponseSpeed::OneMinute => &self.one_minute,
            ResponseSpeed::TenMinute => &self.ten_minute,
            ResponseSpeed::ThirtyMinute => &self.thirty_minute,
            ResponseSpeed::SixtyMinute => &self.sixty_minute,
        }
    }

    /// Look up by node row name (code + step), falling back to the short
    /// node code.
    pub fn lookup(&self, speed: ResponseSpeed, node_row: &str, short_code: &str) -> GridplanResult<f64> {
        let table = self.table(speed);
        let value = table
            .get(node_row)
            .or_else(|| table.get(short_code))
            .copied()
            .ok_or_else(|| {
                GridplanError::Validation(format!(
                    "no {}-minute aggregate load for node {}",
                    speed.suffix(),
                    node_row
                ))
            })?;
        if value <= 0.0 {
            return Err(GridplanError::Validation(format!(
                "{}-minute aggregate load for node {} must be positive",
                speed.suffix(),
                node_row
            )));
        }
        Ok(value)
    }
}

/// Configuration plus parsed horizon, handed to model generation.
#[derive(Debug, Clone)]
pub struct ModelContext<'a> {
    pub config: &'a PlanConfig,
    pub horizon: Horizon,
}

impl<'a> ModelContext<'a> {
    pub fn new(config: &'a PlanConfig) -> GridplanResult<Self> {
        config.validate()?;
        Ok(Self {
            horizon: config.horizon()?,
            config,
        })
    }

    pub fn metrics(&self) -> &[String] {
        &self.config.metrics
    }

    pub fn reserves(&self) -> &ReserveCalibration {
        &self.config.reserves
    }

    pub fn event_count(&self) -> usize {
        self.config.events.len()
    }

    /// Row accumulating a metric for one year, e.g. `CO2Y3`.
    pub fn metric_row(&self, metric: &str, year: u32) -> String {
        format!("{}{}", metric, self.horizon.year_label(year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlanConfig::default();
        assert!(config.use_benders);
        assert_eq!(config.decomposition.max_iterations, 1000);
        assert_eq!(config.decomposition.optimality_tolerance, 0.999);
        assert_eq!(config.decomposition.feasibility_tolerance, 1e-6);
        assert_eq!(config.reserves.regulation_down_fuel, 0.285);
        assert!(config.validate().is_ok());

        let mut strict = config.decomposition.clone();
        strict.feasibility_tolerance = 0.0;
        assert!(strict.validate().is_err());
    }

    #[test]
    fn test_toml_overrides() {
        let config = PlanConfig::from_toml_str(
            r#"
            use_dc_flow = true
            metrics = ["CO2", "NOX"]

            [horizon]
            levels = [{ name = "Y", length = 4 }, { name = "S", length = 2 }]

            [reserves]
            regulation_up_sigma = 2.5

            [[events]]
            name = "hurricane"
            years = [2, 3]
            "#,
        )
        .unwrap();
        assert!(config.use_dc_flow);
        assert_eq!(config.metric_index("NOX"), Some(1));
        assert_eq!(config.reserves.regulation_up_sigma, 2.5);
        assert_eq!(config.reserves.regulation_down_sigma, 3.5);
        assert_eq!(config.horizon().unwrap().years(), 4);
        assert_eq!(config.events[0].years, vec![2, 3]);
    }

    #[test]
    fn test_event_outside_horizon_rejected() {
        let mut config = PlanConfig::default();
        config.events.push(EventSpec {
            name: "storm".into(),
            years: vec![2],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_repeated_metric_rejected() {
        let config = PlanConfig {
            metrics: vec!["CO2".into(), "CO2".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aggregate_lookup_falls_back_to_short_code() {
        let mut load = AggregateLoad::default();
        load.one_minute.insert("ELNY".into(), 2000.0);
        load.ten_minute.insert("ELNYY1B1".into(), 0.0);
        assert_eq!(
            load.lookup(ResponseSpeed::OneMinute, "ELNYY1B1", "ELNY").unwrap(),
            2000.0
        );
        assert!(load.lookup(ResponseSpeed::TenMinute, "ELNYY1B1", "ELNY").is_err());
        assert!(load.lookup(ResponseSpeed::SixtyMinute, "ELNYY1B1", "ELNY").is_err());
    }

    #[test]
    fn test_metric_row_name() {
        let config = PlanConfig {
            metrics: vec!["CO2".into()],
            ..Default::default()
        };
        let ctx = ModelContext::new(&config).unwrap();
        assert_eq!(ctx.metric_row("CO2", 1), "CO2Y1");
    }
}
