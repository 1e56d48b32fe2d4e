//! Arcs: the generation, conversion, transmission, storage and transport
//! links of the network.
//!
//! An [`Arc`] is one link at one time step. Besides its data it knows how to
//! describe its share of the planning LP:
//!
//! ```text
//!   flow column     <code>         operating cost, node balances, metrics
//!   capacity column cap<code>      links investments to operating limits
//!   investment col  inv<code>      investment cost, feeds later inv2cap rows
//!   ancillary cols  CR_ CRop_ RU_ RD_ CAP10/30/60 <code>
//!   rows            ub  ubR lbR ubRop U1CR U2CR U1RU U1RD L10.. LCAP..
//!                   inv2cap  dcpf
//! ```
//!
//! Row generation lives in `rows.rs`, column generation in `columns.rs`;
//! this file holds the data, the derived predicates and attribute scaling.

pub mod columns;
mod rows;

use std::fmt;
use std::str::FromStr;

pub use columns::{CapacityPart, ReserveService};

use crate::code::NodeCode;
use crate::config::{ModelContext, ResponseSpeed};
use crate::error::{GridplanError, GridplanResult};
use crate::step::Step;

/// Regulation and ramping response of variable generation on an arc,
/// in percent of the system base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegulationResponse {
    pub p_regulation: f64,
    pub p_ramp10: f64,
    pub p_ramp30: f64,
    pub p_ramp60: f64,
    pub w_base: f64,
}

impl RegulationResponse {
    pub fn percent(&self, speed: ResponseSpeed) -> f64 {
        match speed {
            ResponseSpeed::OneMinute => self.p_regulation,
            ResponseSpeed::TenMinute => self.p_ramp10,
            ResponseSpeed::ThirtyMinute => self.p_ramp30,
            ResponseSpeed::SixtyMinute => self.p_ramp60,
        }
    }
}

/// Forced-outage data sizing the operational contingency reserve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForcedOutage {
    pub rate: f64,
    pub avg_gw: f64,
    pub base_gwh: f64,
}

/// Variable cost adders and heat-rate degradation of reserve services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCosts {
    pub voc_reserve: f64,
    pub hrd_reserve: f64,
    pub voc_regulation: f64,
    pub hrd_regulation: f64,
}

/// Energy drawn at a node per unit of transport flow.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportLoad {
    /// Node row name (code + step).
    pub node: String,
    pub coefficient: f64,
}

/// One network link at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub from: NodeCode,
    pub to: NodeCode,
    pub from_step: Step,
    pub to_step: Step,
    /// Logical asset this arc belongs to (registry position).
    pub asset: usize,
    pub op_cost: f64,
    pub op_min: f64,
    /// `None` is unbounded.
    pub op_max: Option<f64>,
    pub efficiency: f64,
    /// Efficiency applies to the input side instead of the output side.
    pub invert_efficiency: bool,
    /// `None` forbids investment.
    pub inv_cost: Option<f64>,
    pub inv_min: f64,
    pub inv_max: Option<f64>,
    /// Years an investment stays in service; `None` reaches the horizon end.
    pub lifespan: Option<u32>,
    /// Earliest step at which investment may happen.
    pub inv_start: Option<Step>,
    /// Number of leading step levels at which investments are decided.
    pub inv_resolution: usize,
    pub ramp_rate: f64,
    /// Operating rate per configured metric, in configuration order.
    pub metric_rates: Vec<f64>,
    pub capacity_factor: f64,
    pub regulation: RegulationResponse,
    /// DC power-flow susceptance.
    pub susceptance: f64,
    pub outage: ForcedOutage,
    pub service_costs: ServiceCosts,
    /// Kind letter of the infrastructure a transport flow occupies.
    pub infrastructure: Option<char>,
    pub energy_to_transport: bool,
    pub transport_to_energy: Vec<TransportLoad>,
    /// Capacity availability per contingency event.
    pub capacity_loss: Vec<f64>,
}

impl Arc {
    /// An arc with neutral data: unit efficiency, unbounded, not investable.
    pub fn new(from: NodeCode, to: NodeCode, from_step: Step, to_step: Step) -> Self {
        Self {
            from,
            to,
            from_step,
            to_step,
            asset: 0,
            op_cost: 0.0,
            op_min: 0.0,
            op_max: None,
            efficiency: 1.0,
            invert_efficiency: false,
            inv_cost: None,
            inv_min: 0.0,
            inv_max: None,
            lifespan: None,
            inv_start: None,
            inv_resolution: 1,
            ramp_rate: 0.0,
            metric_rates: Vec::new(),
            capacity_factor: 0.0,
            regulation: RegulationResponse::default(),
            susceptance: 0.0,
            outage: ForcedOutage::default(),
            service_costs: ServiceCosts::default(),
            infrastructure: None,
            energy_to_transport: false,
            transport_to_energy: Vec::new(),
            capacity_loss: Vec::new(),
        }
    }

    /// Code of this link between the given steps.
    pub fn code_at(&self, from_step: &Step, to_step: &Step) -> String {
        if self.is_transport() {
            format!("{}{}", self.from, from_step)
        } else {
            format!("{}{}_{}{}", self.from, from_step, self.to, to_step)
        }
    }

    pub fn code(&self) -> String {
        self.code_at(&self.from_step, &self.to_step)
    }

    /// Balance row of the origin node.
    pub fn origin_row(&self) -> String {
        format!("{}{}", self.from, self.from_step)
    }

    /// Balance row of the destination node.
    pub fn destination_row(&self) -> String {
        format!("{}{}", self.to, self.to_step)
    }

    /// The mirror link. Energy arcs swap endpoints, transport arcs reverse
    /// both route codes. Steps stay where they are.
    pub fn reversed(&self) -> Arc {
        let mut arc = self.clone();
        if self.is_transport() {
            arc.from = self.from.reversed();
            arc.to = self.to.reversed();
        } else {
            arc.from = self.to.clone();
            arc.to = self.from.clone();
        }
        arc
    }

    pub fn year(&self) -> u32 {
        self.from_step.year()
    }

    pub fn is_transport(&self) -> bool {
        self.from.is_transport() && self.to.is_transport()
    }

    pub fn is_storage(&self, ctx: &ModelContext<'_>) -> bool {
        self.from.second_char() == ctx.config.storage_code && self.from == self.to
    }

    pub fn is_dc_flow(&self, ctx: &ModelContext<'_>) -> bool {
        ctx.config.use_dc_flow
            && self.from.kind() == ctx.config.dc_code
            && self.to.kind() == ctx.config.dc_code
    }

    pub fn is_bidirectional(&self, ctx: &ModelContext<'_>) -> bool {
        self.from.kind() == self.to.kind() && !self.is_dc_flow(ctx) && !self.is_storage(ctx)
    }

    /// The lexicographically first direction of a bidirectional pair.
    pub fn is_first_bidirectional(&self, ctx: &ModelContext<'_>) -> bool {
        self.is_bidirectional(ctx) && self.from < self.to
    }

    /// The direction of a transport route whose origin zone sorts first.
    pub fn is_first_transport(&self) -> bool {
        self.is_transport()
            && self
                .from
                .destination_zone()
                .map(|dest| self.from.zone() < dest)
                .unwrap_or(false)
    }

    /// Step deciding the year an arc belongs to for investment purposes.
    pub fn guide_step(&self, ctx: &ModelContext<'_>) -> &Step {
        if self.from_step > self.to_step || self.is_storage(ctx) {
            &self.from_step
        } else {
            &self.to_step
        }
    }

    pub fn is_first_in_year(&self, ctx: &ModelContext<'_>) -> bool {
        self.guide_step(ctx).is_first_in_year(self.inv_resolution)
    }

    pub fn investment_allowed(&self, ctx: &ModelContext<'_>) -> bool {
        self.inv_cost.is_some() && self.is_first_in_year(ctx)
    }

    /// Whether this arc carries an investment decision of its own. Mirror
    /// directions share the decision of their first direction.
    pub fn is_investable(&self, ctx: &ModelContext<'_>) -> bool {
        let direction_ok = (!self.is_transport()
            && (!self.is_bidirectional(ctx) || self.is_first_bidirectional(ctx)))
            || self.is_first_transport();
        let started = self
            .inv_start
            .as_ref()
            .map(|start| self.from_step >= *start)
            .unwrap_or(true);
        self.investment_allowed(ctx) && direction_ok && started
    }

    /// Whether the arc has an operating flow variable. Fleet and
    /// infrastructure links only carry capacity.
    pub fn has_flow_variable(&self) -> bool {
        !self.is_transport() || self.infrastructure.is_some()
    }

    /// Whether the arc owns a capacity variable and its `inv2cap` row.
    pub fn owns_capacity(&self, ctx: &ModelContext<'_>) -> bool {
        self.is_first_in_year(ctx) && self.infrastructure.is_none() && self.op_max.is_some()
    }

    pub fn has_investment(&self, ctx: &ModelContext<'_>) -> bool {
        self.is_investable(ctx) && self.owns_capacity(ctx)
    }

    /// Whether the arc offers reserves, regulation and ramping.
    pub fn provides_reserves(&self) -> bool {
        self.ramp_rate != 0.0 && self.op_max.is_some() && !self.is_transport()
    }

    /// Scale one attribute in place.
    pub fn scale(&mut self, attribute: &ArcAttribute, factor: f64) {
        fn mul(value: &mut f64, factor: f64) {
            if *value != 0.0 {
                *value *= factor;
            }
        }
        match attribute {
            ArcAttribute::OperatingCost => mul(&mut self.op_cost, factor),
            ArcAttribute::OperatingMin => mul(&mut self.op_min, factor),
            ArcAttribute::OperatingMax => {
                if let Some(v) = self.op_max.as_mut() {
                    mul(v, factor)
                }
            }
            ArcAttribute::Efficiency => mul(&mut self.efficiency, factor),
            ArcAttribute::InvestmentCost => {
                if let Some(v) = self.inv_cost.as_mut() {
                    mul(v, factor)
                }
            }
            ArcAttribute::InvestmentMin => mul(&mut self.inv_min, factor),
            ArcAttribute::InvestmentMax => {
                if let Some(v) = self.inv_max.as_mut() {
                    mul(v, factor)
                }
            }
            ArcAttribute::RampRate => mul(&mut self.ramp_rate, factor),
            ArcAttribute::CapacityFactor => mul(&mut self.capacity_factor, factor),
            ArcAttribute::TransportToEnergy => {
                for load in &mut self.transport_to_energy {
                    mul(&mut load.coefficient, factor);
                }
            }
            ArcAttribute::Metric(index) => {
                if let Some(rate) = self.metric_rates.get_mut(*index) {
                    mul(rate, factor)
                }
            }
        }
    }
}

impl fmt::Display for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Arc attributes that scenario adjustments may scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArcAttribute {
    OperatingCost,
    OperatingMin,
    OperatingMax,
    Efficiency,
    InvestmentCost,
    InvestmentMin,
    InvestmentMax,
    RampRate,
    CapacityFactor,
    TransportToEnergy,
    /// Operating rate of the metric at this configuration index.
    Metric(usize),
}

impl ArcAttribute {
    /// Resolve an attribute name, metric names included.
    pub fn parse(name: &str, metrics: &[String]) -> GridplanResult<Self> {
        match name.parse() {
            Ok(attribute) => Ok(attribute),
            Err(err) => metrics
                .iter()
                .position(|m| m == name)
                .map(ArcAttribute::Metric)
                .ok_or(err),
        }
    }
}

impl FromStr for ArcAttribute {
    type Err = GridplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "op_cost" => Ok(ArcAttribute::OperatingCost),
            "op_min" => Ok(ArcAttribute::OperatingMin),
            "op_max" => Ok(ArcAttribute::OperatingMax),
            "efficiency" => Ok(ArcAttribute::Efficiency),
            "inv_cost" => Ok(ArcAttribute::InvestmentCost),
            "inv_min" => Ok(ArcAttribute::InvestmentMin),
            "inv_max" => Ok(ArcAttribute::InvestmentMax),
            "ramp_rate" => Ok(ArcAttribute::RampRate),
            "capacity_factor" => Ok(ArcAttribute::CapacityFactor),
            "transport_to_energy" => Ok(ArcAttribute::TransportToEnergy),
            other => Err(GridplanError::Validation(format!(
                "unknown arc attribute '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::step::{Horizon, Level};

    pub(crate) fn config(years: u32, blocks: u32) -> PlanConfig {
        PlanConfig {
            horizon: crate::config::HorizonConfig {
                levels: vec![Level::new('Y', years), Level::new('B', blocks)],
                step_hours: vec![10.0; blocks as usize],
            },
            metrics: vec!["CO2".into()],
            ..Default::default()
        }
    }

    pub(crate) fn step(label: &str, horizon: &Horizon) -> Step {
        Step::parse(label, horizon).unwrap()
    }

    pub(crate) fn arc(from: &str, to: &str, label: &str, ctx: &ModelContext<'_>) -> Arc {
        let s = step(label, &ctx.horizon);
        Arc::new(
            NodeCode::new(from).unwrap(),
            NodeCode::new(to).unwrap(),
            s.clone(),
            s,
        )
    }

    #[test]
    fn test_energy_code_and_reversal() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let a = arc("ELNY", "ELPA", "Y1B1", &ctx);
        assert_eq!(a.code(), "ELNYY1B1_ELPAY1B1");
        let back = a.reversed();
        assert_eq!(back.code(), "ELPAY1B1_ELNYY1B1");
        assert_eq!(back.reversed().code(), a.code());
    }

    #[test]
    fn test_transport_reversal_twice_is_identity() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let a = arc("TCNYPA", "TCNYPA", "Y2B1", &ctx);
        assert!(a.is_transport());
        assert_eq!(a.code(), "TCNYPAY2B1");
        assert_eq!(a.reversed().code(), "TCPANYY2B1");
        assert_eq!(a.reversed().reversed().code(), a.code());
        assert_eq!(a.reversed().reversed(), a);
    }

    #[test]
    fn test_direction_predicates() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let line = arc("ELNY", "ELPA", "Y1B1", &ctx);
        assert!(line.is_bidirectional(&ctx));
        assert!(line.is_first_bidirectional(&ctx));
        assert!(!line.reversed().is_first_bidirectional(&ctx));

        let generator = arc("NGNY", "ELNY", "Y1B1", &ctx);
        assert!(!generator.is_bidirectional(&ctx));

        let route = arc("TCNYPA", "TCNYPA", "Y1B1", &ctx);
        assert!(route.is_first_transport());
        assert!(!route.reversed().is_first_transport());
    }

    #[test]
    fn test_storage_and_dc() {
        let mut config = config(3, 2);
        config.use_dc_flow = true;
        let ctx = ModelContext::new(&config).unwrap();
        let storage = arc("ESNY", "ESNY", "Y1B1", &ctx);
        assert!(storage.is_storage(&ctx));
        assert!(!storage.is_bidirectional(&ctx));

        let dc = arc("ELNY", "ELPA", "Y1B1", &ctx);
        assert!(dc.is_dc_flow(&ctx));
        assert!(!dc.is_bidirectional(&ctx));
    }

    #[test]
    fn test_first_in_year() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        assert!(arc("NGNY", "ELNY", "Y2B1", &ctx).is_first_in_year(&ctx));
        assert!(!arc("NGNY", "ELNY", "Y2B2", &ctx).is_first_in_year(&ctx));
    }

    #[test]
    fn test_investability() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y2B1", &ctx);
        assert!(!a.is_investable(&ctx));
        a.inv_cost = Some(100.0);
        assert!(a.is_investable(&ctx));
        a.inv_start = Some(step("Y3B1", &ctx.horizon));
        assert!(!a.is_investable(&ctx));

        let mut mirror = arc("ELPA", "ELNY", "Y1B1", &ctx);
        mirror.inv_cost = Some(100.0);
        assert!(!mirror.is_investable(&ctx));
    }

    #[test]
    fn test_scale_attributes() {
        let config = config(3, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y1B1", &ctx);
        a.op_cost = 4.0;
        a.metric_rates = vec![0.5];
        a.transport_to_energy = vec![TransportLoad {
            node: "ELNYY1B1".into(),
            coefficient: 2.0,
        }];
        a.scale(&ArcAttribute::OperatingCost, 1.5);
        a.scale(&ArcAttribute::OperatingMax, 2.0);
        a.scale(&ArcAttribute::parse("CO2", ctx.metrics()).unwrap(), 2.0);
        a.scale(&ArcAttribute::TransportToEnergy, 0.5);
        assert_eq!(a.op_cost, 6.0);
        assert_eq!(a.op_max, None);
        assert_eq!(a.metric_rates, vec![1.0]);
        assert_eq!(a.transport_to_energy[0].coefficient, 1.0);
        assert!(ArcAttribute::parse("bogus", ctx.metrics()).is_err());
    }
}
