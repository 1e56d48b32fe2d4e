use gridplan_core::{ModelContext, Network, PlanConfig};

const CONFIG: &str = r#"
metrics = ["CO2"]

[horizon]
levels = [{ name = "Y", length = 2 }, { name = "B", length = 2 }]
step_hours = [4380.0, 4380.0]

[[events]]
name = "storm"
years = [2]
"#;

const NETWORK: &str = r#"{
  "nodes": [
    { "code": "ELNY", "demand": 0.0, "unserved_cost": 1000.0 },
    { "code": "ELPA", "demand": 10.0, "unserved_cost": 1000.0 }
  ],
  "arcs": [
    { "from": "XXNY", "to": "ELNY", "op_cost": 5.0, "op_max": 0.0, "inv_cost": 100.0,
      "metrics": { "CO2": 0.5 }, "capacity_loss": { "storm": 0.25 } },
    { "from": "ELNY", "to": "ELPA", "op_cost": 1.0, "op_max": 0.0, "inv_cost": 50.0 }
  ],
  "adjustments": []
}"#;

#[test]
fn loads_config_and_network_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("plan.toml");
    let network_path = dir.path().join("network.json");
    std::fs::write(&config_path, CONFIG).unwrap();
    std::fs::write(&network_path, NETWORK).unwrap();

    let config = PlanConfig::from_path(&config_path).unwrap();
    config.validate().unwrap();
    let ctx = ModelContext::new(&config).unwrap();
    let network = Network::from_path(&network_path, &ctx).unwrap();

    // Records without a step cover every step of the horizon.
    assert_eq!(network.nodes.len(), 8);
    assert_eq!(network.nodes_in_year(1).count(), 4);
    assert_eq!(network.arcs.len(), 8);
    assert_eq!(network.arcs_in_year(2).count(), 4);

    let generator = network.arcs.iter().find(|a| a.year() == 2).unwrap();
    assert_eq!(generator.event_multipliers(&ctx).unwrap(), vec![1.0, 0.25]);
    assert!(network.arcs.iter().all(|a| a.asset < 2));
}

#[test]
fn rejects_unknown_event_and_bad_extension() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("plan.toml");
    std::fs::write(&config_path, CONFIG.replace("storm", "flood")).unwrap();
    let network_path = dir.path().join("network.json");
    std::fs::write(&network_path, NETWORK).unwrap();

    let config = PlanConfig::from_path(&config_path).unwrap();
    let ctx = ModelContext::new(&config).unwrap();
    assert!(Network::from_path(&network_path, &ctx).is_err());

    let yaml = dir.path().join("plan.yaml");
    std::fs::write(&yaml, CONFIG).unwrap();
    assert!(PlanConfig::from_path(&yaml).is_err());
}
