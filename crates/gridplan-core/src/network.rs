//! Network container and its JSON input document.
//!
//! The document lists arc and node records. A record without any step is
//! replicated over every step of the horizon, which keeps small studies
//! short to write:
//!
//! ```json
//! {
//!   "nodes": [{ "code": "ELPA", "demand": 10.0, "unserved_cost": 1000.0 }],
//!   "arcs":  [{ "from": "XXNY", "to": "ELNY", "op_cost": 5.0, "op_max": 0.0,
//!               "inv_cost": 100.0 }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arc::{Arc, ArcAttribute, ForcedOutage, RegulationResponse, ServiceCosts, TransportLoad};
use crate::code::NodeCode;
use crate::config::{ModelContext, ResponseSpeed};
use crate::error::{GridplanError, GridplanResult};
use crate::node::{Node, NodeAttribute};
use crate::step::Step;

/// Serialized network description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDocument {
    pub nodes: Vec<NodeRecord>,
    pub arcs: Vec<ArcRecord>,
    /// Scaling applied after loading (sensitivity runs).
    pub adjustments: Vec<Adjustment>,
}

/// Arc data as written in the input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcRecord {
    pub from: String,
    pub to: String,
    /// Sets both endpoint steps.
    pub step: Option<String>,
    pub from_step: Option<String>,
    pub to_step: Option<String>,
    pub op_cost: f64,
    pub op_min: f64,
    pub op_max: Option<f64>,
    pub efficiency: f64,
    pub invert_efficiency: bool,
    pub inv_cost: Option<f64>,
    pub inv_min: f64,
    pub inv_max: Option<f64>,
    pub lifespan: Option<u32>,
    pub inv_start: Option<String>,
    pub inv_resolution: usize,
    pub ramp_rate: f64,
    /// Operating rate per metric name.
    pub metrics: BTreeMap<String, f64>,
    pub capacity_factor: f64,
    pub p_regulation: f64,
    pub p_ramp10: f64,
    pub p_ramp30: f64,
    pub p_ramp60: f64,
    pub w_base: f64,
    pub susceptance: f64,
    pub forced_outage_rate: f64,
    pub avg_gw_for: f64,
    pub base_gwh_for: f64,
    pub voc_reserve: f64,
    pub hrd_reserve: f64,
    pub voc_regulation: f64,
    pub hrd_regulation: f64,
    pub infrastructure: Option<char>,
    pub energy_to_transport: bool,
    /// Energy drawn per unit of flow, by node short code (origin step).
    pub transport_to_energy: BTreeMap<String, f64>,
    /// Capacity availability per event name.
    pub capacity_loss: BTreeMap<String, f64>,
}

impl Default for ArcRecord {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            step: None,
            from_step: None,
            to_step: None,
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
            metrics: BTreeMap::new(),
            capacity_factor: 0.0,
            p_regulation: 0.0,
            p_ramp10: 0.0,
            p_ramp30: 0.0,
            p_ramp60: 0.0,
            w_base: 0.0,
            susceptance: 0.0,
            forced_outage_rate: 0.0,
            avg_gw_for: 0.0,
            base_gwh_for: 0.0,
            voc_reserve: 0.0,
            hrd_reserve: 0.0,
            voc_regulation: 0.0,
            hrd_regulation: 0.0,
            infrastructure: None,
            energy_to_transport: false,
            transport_to_energy: BTreeMap::new(),
            capacity_loss: BTreeMap::new(),
        }
    }
}

/// Node data as written in the input document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRecord {
    pub code: String,
    pub step: Option<String>,
    pub demand: Option<f64>,
    pub unserved_cost: Option<f64>,
    pub peak_power: Option<f64>,
    pub regulation: Option<f64>,
    pub ramp10: Option<f64>,
    pub ramp30: Option<f64>,
    pub ramp60: Option<f64>,
    pub contingency_reserve: Option<f64>,
    /// Defaults to the hours the step covers.
    pub step_length: Option<f64>,
}

/// What an adjustment scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTarget {
    Arcs,
    Nodes,
}

/// Multiply one attribute of every matching arc or node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    pub target: AdjustmentTarget,
    /// Code prefix selecting arcs (arc code) or nodes (row name); empty
    /// selects everything.
    #[serde(default)]
    pub matches: String,
    pub attribute: String,
    pub factor: f64,
}

/// Arcs and nodes of one planning study.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub arcs: Vec<Arc>,
    pub nodes: Vec<Node>,
}

impl Network {
    /// Read a JSON document, build and validate the network.
    pub fn from_path(path: &Path, ctx: &ModelContext<'_>) -> GridplanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: NetworkDocument = serde_json::from_str(&content)?;
        Self::from_document(&document, ctx)
    }

    pub fn from_document(document: &NetworkDocument, ctx: &ModelContext<'_>) -> GridplanResult<Self> {
        let mut network = Network::default();
        let mut sites: HashMap<String, usize> = HashMap::new();
        let mut assets: HashMap<(String, String), usize> = HashMap::new();

        for record in &document.nodes {
            let code = NodeCode::new(&record.code)?;
            let next = sites.len();
            let site = *sites.entry(record.code.clone()).or_insert(next);
            for step in record_steps(record.step.as_deref(), ctx)? {
                let hours = step.hours(&ctx.horizon);
                let mut node = Node::new(code.clone(), step, record.step_length.unwrap_or(hours));
                node.site = site;
                node.demand = record.demand;
                node.unserved_cost = record.unserved_cost;
                node.peak_power = record.peak_power;
                node.regulation = record.regulation;
                node.ramp10 = record.ramp10;
                node.ramp30 = record.ramp30;
                node.ramp60 = record.ramp60;
                node.contingency_reserve = record.contingency_reserve;
                network.nodes.push(node);
            }
        }

        for record in &document.arcs {
            let from = NodeCode::new(&record.from)?;
            let to = NodeCode::new(&record.to)?;
            let next = assets.len();
            let asset = *assets
                .entry((record.from.clone(), record.to.clone()))
                .or_insert(next);
            for (from_step, to_step) in arc_steps(record, ctx)? {
                let mut arc = Arc::new(from.clone(), to.clone(), from_step, to_step);
                arc.asset = asset;
                fill_arc(&mut arc, record, ctx)?;
                network.arcs.push(arc);
            }
        }

        for adjustment in &document.adjustments {
            network.apply_adjustment(adjustment, ctx)?;
        }
        network.validate(ctx)?;
        Ok(network)
    }

    /// Check the cross-record invariants model generation relies on.
    pub fn validate(&self, ctx: &ModelContext<'_>) -> GridplanResult<()> {
        let mut rows = HashSet::new();
        for node in &self.nodes {
            ctx.horizon.check(&node.step)?;
            if !rows.insert(node.row_name()) {
                return Err(GridplanError::Validation(format!(
                    "node {} declared twice",
                    node.row_name()
                )));
            }
        }

        let nodes: HashMap<String, &Node> = self.nodes.iter().map(|n| (n.row_name(), n)).collect();
        let mut codes = HashSet::new();
        for arc in &self.arcs {
            ctx.horizon.check(&arc.from_step)?;
            ctx.horizon.check(&arc.to_step)?;
            let code = arc.code();
            if !codes.insert(code.clone()) {
                return Err(GridplanError::Validation(format!("arc {} declared twice", code)));
            }
            if arc.metric_rates.len() > ctx.metrics().len() {
                return Err(GridplanError::Validation(format!(
                    "arc {} has {} metric rates for {} metrics",
                    code,
                    arc.metric_rates.len(),
                    ctx.metrics().len()
                )));
            }
            if arc.efficiency <= 0.0 {
                return Err(GridplanError::Validation(format!(
                    "arc {} has non-positive efficiency",
                    code
                )));
            }
            if arc.inv_resolution == 0 || arc.inv_resolution > ctx.horizon.depth() {
                return Err(GridplanError::Validation(format!(
                    "arc {} has investment resolution {} outside 1..={}",
                    code,
                    arc.inv_resolution,
                    ctx.horizon.depth()
                )));
            }
            if arc.is_dc_flow(ctx) && arc.from < arc.to && arc.susceptance <= 0.0 {
                return Err(GridplanError::Validation(format!(
                    "DC arc {} needs a positive susceptance",
                    code
                )));
            }
            if arc.energy_to_transport && arc.is_transport() {
                return Err(GridplanError::Validation(format!(
                    "transport arc {} cannot couple energy into transport",
                    code
                )));
            }
            if arc.infrastructure.is_some() && !arc.is_transport() {
                return Err(GridplanError::Validation(format!(
                    "energy arc {} cannot ride on infrastructure",
                    code
                )));
            }
            if arc.capacity_loss.len() > ctx.event_count() {
                return Err(GridplanError::Validation(format!(
                    "arc {} lists more capacity losses than events",
                    code
                )));
            }
            check_requirement_rows(arc, &nodes, ctx)?;
        }
        Ok(())
    }

    /// Scale one attribute on every matching arc or node; returns how many
    /// were touched.
    pub fn apply_adjustment(&mut self, adjustment: &Adjustment, ctx: &ModelContext<'_>) -> GridplanResult<usize> {
        let mut touched = 0;
        match adjustment.target {
            AdjustmentTarget::Arcs => {
                let attribute = ArcAttribute::parse(&adjustment.attribute, ctx.metrics())?;
                for arc in self.arcs.iter_mut().filter(|a| a.code().starts_with(&adjustment.matches)) {
                    arc.scale(&attribute, adjustment.factor);
                    touched += 1;
                }
            }
            AdjustmentTarget::Nodes => {
                let attribute: NodeAttribute = adjustment.attribute.parse()?;
                for node in self
                    .nodes
                    .iter_mut()
                    .filter(|n| n.row_name().starts_with(&adjustment.matches))
                {
                    node.scale(attribute, adjustment.factor);
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    /// Arcs whose time step falls in the given year.
    pub fn arcs_in_year(&self, year: u32) -> impl Iterator<Item = &Arc> {
        self.arcs.iter().filter(move |a| a.year() == year)
    }

    pub fn nodes_in_year(&self, year: u32) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.year() == year)
    }
}

fn record_steps(step: Option<&str>, ctx: &ModelContext<'_>) -> GridplanResult<Vec<Step>> {
    match step {
        Some(label) => Ok(vec![Step::parse(label, &ctx.horizon)?]),
        None => Ok(ctx.horizon.steps()),
    }
}

/// Reserve, regulation and margin terms of an arc land in rows its
/// destination node only declares when it carries the matching data.
fn check_requirement_rows(
    arc: &Arc,
    nodes: &HashMap<String, &Node>,
    ctx: &ModelContext<'_>,
) -> GridplanResult<()> {
    let capacity = arc.owns_capacity(ctx);
    let reserves = arc.provides_reserves();
    let regulation = capacity && arc.regulation.p_regulation != 0.0;
    let ramps = ResponseSpeed::RAMPS
        .iter()
        .any(|&speed| arc.regulation.percent(speed) != 0.0);

    let mut needs: Vec<(&str, &str, fn(&Node) -> bool)> = Vec::new();
    if reserves {
        needs.push(("reserve", "contingency_reserve", |n| n.contingency_reserve.is_some()));
    }
    if reserves || regulation {
        needs.push(("regulation", "regulation", |n| n.regulation.is_some()));
    }
    let margins = capacity && (reserves || regulation || ramps || arc.capacity_factor != 0.0);
    if margins || (reserves && arc.is_first_in_year(ctx)) {
        needs.push(("margin", "peak_power", Node::has_peak_rows));
    }
    let Some(&(terms, _, _)) = needs.first() else {
        return Ok(());
    };

    let row = arc.destination_row();
    let node = nodes.get(&row).ok_or_else(|| {
        GridplanError::Validation(format!(
            "arc {} has {} terms but no node {} to hold them",
            arc.code(),
            terms,
            row
        ))
    })?;
    for (terms, attribute, present) in needs {
        if !present(node) {
            return Err(GridplanError::Validation(format!(
                "arc {} has {} terms but node {} has no {}",
                arc.code(),
                terms,
                row,
                attribute
            )));
        }
    }
    Ok(())
}

fn arc_steps(record: &ArcRecord, ctx: &ModelContext<'_>) -> GridplanResult<Vec<(Step, Step)>> {
    let from = record.from_step.as_deref().or(record.step.as_deref());
    let to = record.to_step.as_deref().or(from);
    match (from, to) {
        (Some(from), Some(to)) => Ok(vec![(
            Step::parse(from, &ctx.horizon)?,
            Step::parse(to, &ctx.horizon)?,
        )]),
        _ => Ok(ctx.horizon.steps().into_iter().map(|s| (s.clone(), s)).collect()),
    }
}

fn fill_arc(arc: &mut Arc, record: &ArcRecord, ctx: &ModelContext<'_>) -> GridplanResult<()> {
    arc.op_cost = record.op_cost;
    arc.op_min = record.op_min;
    arc.op_max = record.op_max;
    arc.efficiency = record.efficiency;
    arc.invert_efficiency = record.invert_efficiency;
    arc.inv_cost = record.inv_cost;
    arc.inv_min = record.inv_min;
    arc.inv_max = record.inv_max;
    arc.lifespan = record.lifespan;
    arc.inv_start = record
        .inv_start
        .as_deref()
        .map(|s| Step::parse(s, &ctx.horizon))
        .transpose()?;
    arc.inv_resolution = record.inv_resolution;
    arc.ramp_rate = record.ramp_rate;
    arc.capacity_factor = record.capacity_factor;
    arc.regulation = RegulationResponse {
        p_regulation: record.p_regulation,
        p_ramp10: record.p_ramp10,
        p_ramp30: record.p_ramp30,
        p_ramp60: record.p_ramp60,
        w_base: record.w_base,
    };
    arc.susceptance = record.susceptance;
    arc.outage = ForcedOutage {
        rate: record.forced_outage_rate,
        avg_gw: record.avg_gw_for,
        base_gwh: record.base_gwh_for,
    };
    arc.service_costs = ServiceCosts {
        voc_reserve: record.voc_reserve,
        hrd_reserve: record.hrd_reserve,
        voc_regulation: record.voc_regulation,
        hrd_regulation: record.hrd_regulation,
    };
    arc.infrastructure = record.infrastructure;
    arc.energy_to_transport = record.energy_to_transport;

    arc.metric_rates = vec![0.0; ctx.metrics().len()];
    for (metric, rate) in &record.metrics {
        let index = ctx.config.metric_index(metric).ok_or_else(|| {
            GridplanError::Validation(format!(
                "arc {}->{} rates unknown metric '{}'",
                record.from, record.to, metric
            ))
        })?;
        arc.metric_rates[index] = *rate;
    }

    arc.transport_to_energy = record
        .transport_to_energy
        .iter()
        .map(|(node, coefficient)| {
            NodeCode::new(node).map(|code| TransportLoad {
                node: format!("{}{}", code, arc.from_step),
                coefficient: *coefficient,
            })
        })
        .collect::<GridplanResult<_>>()?;

    arc.capacity_loss = vec![1.0; ctx.event_count()];
    for (event, loss) in &record.capacity_loss {
        let index = ctx
            .config
            .events
            .iter()
            .position(|e| &e.name == event)
            .ok_or_else(|| {
                GridplanError::Validation(format!(
                    "arc {}->{} names unknown event '{}'",
                    record.from, record.to, event
                ))
            })?;
        arc.capacity_loss[index] = *loss;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventSpec, HorizonConfig, PlanConfig};
    use crate::step::Level;

    fn config() -> PlanConfig {
        PlanConfig {
            horizon: HorizonConfig {
                levels: vec![Level::new('Y', 2), Level::new('B', 2)],
                step_hours: vec![4.0, 20.0],
            },
            metrics: vec!["CO2".into()],
            events: vec![EventSpec {
                name: "storm".into(),
                years: vec![2],
            }],
            ..Default::default()
        }
    }

    fn document() -> NetworkDocument {
        serde_json::from_str(
            r#"{
                "nodes": [
                    { "code": "ELNY", "demand": 0.0 },
                    { "code": "ELPA", "demand": 10.0, "unserved_cost": 1000.0 }
                ],
                "arcs": [
                    { "from": "XXNY", "to": "ELNY", "op_cost": 5.0, "op_max": 0.0,
                      "inv_cost": 100.0, "metrics": { "CO2": 0.4 },
                      "capacity_loss": { "storm": 0.5 } },
                    { "from": "ELNY", "to": "ELPA", "step": "Y1B1", "op_max": 3.0 }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_records_expand_over_horizon() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let network = Network::from_document(&document(), &ctx).unwrap();
        assert_eq!(network.nodes.len(), 8);
        assert_eq!(network.arcs.len(), 5);
        assert_eq!(network.nodes[3].step_length, 20.0);
        assert_eq!(network.nodes[4].site, 1);
        assert_eq!(network.arcs[4].asset, 1);
        assert_eq!(network.arcs[0].metric_rates, vec![0.4]);
        assert_eq!(network.arcs[0].capacity_loss, vec![0.5]);
        assert_eq!(network.arcs_in_year(2).count(), 2);
        assert_eq!(network.nodes_in_year(1).count(), 4);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut doc = document();
        doc.arcs[0].metrics.insert("SO2".into(), 1.0);
        assert!(Network::from_document(&doc, &ctx).is_err());
    }

    #[test]
    fn test_reserve_arc_needs_node_requirements() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut doc = document();
        doc.arcs[0].ramp_rate = 0.5;

        let message = |doc: &NetworkDocument| match Network::from_document(doc, &ctx) {
            Err(GridplanError::Validation(message)) => message,
            other => panic!("expected a validation error, got {:?}", other.map(|_| ())),
        };
        let missing = message(&doc);
        assert!(missing.contains("XXNYY1B1_ELNYY1B1"), "{missing}");
        assert!(missing.contains("contingency_reserve"), "{missing}");

        doc.nodes[0].contingency_reserve = Some(0.1);
        doc.nodes[0].regulation = Some(0.1);
        let missing = message(&doc);
        assert!(missing.contains("margin") && missing.contains("peak_power"), "{missing}");

        doc.nodes[0].peak_power = Some(1.0);
        assert!(Network::from_document(&doc, &ctx).is_ok());
    }

    #[test]
    fn test_capacity_factor_needs_peak_rows() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut doc = document();
        doc.arcs[0].capacity_factor = 0.9;
        assert!(Network::from_document(&doc, &ctx).is_err());
        doc.nodes[0].peak_power = Some(1.0);
        assert!(Network::from_document(&doc, &ctx).is_ok());
    }

    #[test]
    fn test_duplicate_arc_rejected() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut doc = document();
        let copy = doc.arcs[1].clone();
        doc.arcs.push(copy);
        let err = Network::from_document(&doc, &ctx).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_dc_arc_needs_susceptance() {
        let mut config = config();
        config.use_dc_flow = true;
        let ctx = ModelContext::new(&config).unwrap();
        assert!(Network::from_document(&document(), &ctx).is_err());
        let mut doc = document();
        doc.arcs[1].susceptance = 10.0;
        assert!(Network::from_document(&doc, &ctx).is_ok());
    }

    #[test]
    fn test_adjustments() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut doc = document();
        doc.adjustments.push(Adjustment {
            target: AdjustmentTarget::Nodes,
            matches: "ELPA".into(),
            attribute: "demand".into(),
            factor: 1.5,
        });
        let mut network = Network::from_document(&doc, &ctx).unwrap();
        assert_eq!(network.nodes[4].demand, Some(15.0));

        let touched = network
            .apply_adjustment(
                &Adjustment {
                    target: AdjustmentTarget::Arcs,
                    matches: "XXNY".into(),
                    attribute: "op_cost".into(),
                    factor: 2.0,
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(touched, 4);
        assert_eq!(network.arcs[0].op_cost, 10.0);
    }
}
