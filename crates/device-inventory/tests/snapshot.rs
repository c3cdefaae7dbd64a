use device_inventory::{snapshot_from_str, Snapshot, StaticRegistry};
use directive_engine::{ConfigError, LoadOptions};
use host_resolver::StaticResolver;

const DIRECTIVES: &str = r#"
directives:
  - id: bgp_route
    name: BGP Route
    field:
      type: text
      description: IP Prefix
    groups: [BGP]
    rules:
      - condition: "192.0.2.0/24"
        ge: 24
        le: 32
        command: "show ip bgp {target}"
      - condition: "0.0.0.0/0"
        action: deny
  - id: bgp_community
    name: BGP Community
    field:
      type: select
      description: Community
      options:
        - name: Customers
          value: "65000:1"
    rules:
      - condition: "65000:1"
        command: "show ip bgp community {target}"
  - id: circuit
    name: Circuit
    rules:
      - command: "show interface {circuit_id}"
"#;

const DEVICES: &str = r#"
devices:
  - name: Frankfurt Core
    address: 192.0.2.1
    group: Europe
    platform: cisco_ios
    description: FRA1 edge
    credential: {username: lg, password: hunter2}
    directives: [bgp_route, bgp_community]
  - name: Tokyo
    address: tyo.example.net
    group: Asia
    platform: junos
    directives: [bgp_route]
  - name: Amsterdam
    address: "2001:db8::1"
    group: Europe
    platform: arista
    directives:
      - circuit
      - builtins: false
    attrs:
      circuit_id: Et1
"#;

fn resolver() -> StaticResolver {
    StaticResolver::new().with_host("tyo.example.net", &["198.51.100.7".parse().unwrap()])
}

fn build(directives: &str, devices: &str) -> anyhow::Result<Snapshot> {
    snapshot_from_str(
        directives,
        devices,
        &LoadOptions::default(),
        &StaticRegistry::builtin(),
        &resolver(),
    )
}

fn snapshot() -> Snapshot {
    build(DIRECTIVES, DEVICES).expect("fixture should load")
}

#[test]
fn indexes_follow_configuration_order() {
    let s = snapshot();
    let devices = s.devices();
    assert_eq!(devices.hostnames(), vec!["Frankfurt Core", "Tokyo", "Amsterdam"]);
    assert_eq!(devices.groups(), vec!["Europe", "Asia"]);

    let europe: Vec<&str> = devices
        .by_group(Some("Europe"))
        .into_iter()
        .map(|d| d.id())
        .collect();
    assert_eq!(europe, vec!["frankfurt_core", "amsterdam"]);

    assert_eq!(devices.find("Tokyo").map(|d| d.id()), Some("tokyo"));
    assert!(devices.valid_id_or_name("frankfurt_core"));
    assert!(devices.valid_id_or_name("Frankfurt Core"));
    assert!(!devices.valid_id_or_name("Paris"));
}

#[test]
fn duplicate_derived_ids_are_rejected() {
    let devices = r#"
devices:
  - name: Core 1
    address: 192.0.2.1
    platform: cisco_ios
  - name: "core   1"
    address: 192.0.2.2
    platform: cisco_ios
"#;
    let err = build(DIRECTIVES, devices).unwrap_err();
    let config = err
        .downcast_ref::<device_inventory::DeviceError>()
        .expect("device error");
    assert!(matches!(
        config,
        device_inventory::DeviceError::Config(ConfigError::DuplicateKey { kind: "device", key }) if key == "core_1"
    ));
}

#[test]
fn missing_attribute_aborts_the_load() {
    let devices = r#"
devices:
  - name: edge1
    address: 192.0.2.1
    platform: cisco_ios
    directives: [circuit]
"#;
    let err = build(DIRECTIVES, devices).unwrap_err();
    assert_eq!(
        err.to_string(),
        "device 'edge1' has a command that references attribute 'circuit_id', \
         but 'circuit_id' is missing from device attributes"
    );
}

#[test]
fn authorize_decisions() {
    let s = snapshot();

    let permit = s
        .authorize("frankfurt_core", "bgp_route", "192.0.2.1/32")
        .unwrap();
    assert_eq!(permit.commands, vec!["show ip bgp 192.0.2.1/32"]);

    let err = s
        .authorize("frankfurt_core", "bgp_route", "203.0.113.1/32")
        .unwrap_err();
    assert_eq!(err.code(), "network_denied");

    let permit = s
        .authorize("frankfurt_core", "bgp_community", "65000:1")
        .unwrap();
    assert_eq!(permit.commands, vec!["show ip bgp community 65000:1"]);

    let err = s
        .authorize("frankfurt_core", "bgp_community", "65000:2")
        .unwrap_err();
    assert_eq!(err.code(), "no_matching_rule");

    let permit = s.authorize("amsterdam", "circuit", "ignored").unwrap();
    assert_eq!(permit.commands, vec!["show interface Et1"]);

    let err = s.authorize("tokyo", "circuit", "x").unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn public_inventory_has_no_sensitive_fields() {
    let json = serde_json::to_value(snapshot().export_public_inventory()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"id": "frankfurt_core", "name": "Frankfurt Core", "group": "Europe"},
            {"id": "tokyo", "name": "Tokyo", "group": "Asia"},
            {"id": "amsterdam", "name": "Amsterdam", "group": "Europe"},
        ])
    );
    let text = json.to_string();
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("192.0.2.1"));
}

#[test]
fn frontend_catalog_groups_devices() {
    let json = serde_json::to_value(snapshot().export_frontend_catalog()).unwrap();
    let groups = json.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["group"], "Europe");
    assert_eq!(groups[1]["group"], "Asia");

    let europe = groups[0]["locations"].as_array().unwrap();
    assert_eq!(europe.len(), 2);
    assert_eq!(europe[0]["id"], "frankfurt_core");
    assert_eq!(europe[0]["description"], "FRA1 edge");
    assert_eq!(europe[0]["avatar"], serde_json::Value::Null);

    let directives = europe[0]["directives"].as_array().unwrap();
    assert_eq!(directives[0]["id"], "bgp_route");
    assert_eq!(directives[0]["field_type"], "text");
    assert_eq!(directives[0]["description"], "IP Prefix");
    assert_eq!(directives[0]["groups"], serde_json::json!(["BGP"]));
    assert!(directives[0].get("options").is_none());
    assert_eq!(directives[1]["options"][0]["value"], "65000:1");

    let text = json.to_string();
    assert!(!text.contains("show ip bgp"), "command templates leaked");
    assert!(!text.contains("condition"), "rule internals leaked");
}

#[test]
fn shipped_builtins_attach_by_platform() {
    let options = LoadOptions {
        include_builtins: true,
        ..Default::default()
    };
    let s = snapshot_from_str(
        DIRECTIVES,
        DEVICES,
        &options,
        &StaticRegistry::builtin(),
        &resolver(),
    )
    .unwrap();

    let tokyo = s.devices().get("tokyo").unwrap();
    assert!(tokyo.structured_output());
    assert!(tokyo.has_directives(&["__juniper_bgp_route_table__"]));
    assert!(!tokyo.has_directives(&["__juniper_bgp_route__"]));

    let amsterdam = s.devices().get("amsterdam").unwrap();
    assert_eq!(amsterdam.directive_ids(), vec!["circuit"]);

    let permit = s
        .authorize("frankfurt_core", "__cisco_ios_ping__", "2001:db8::/64")
        .unwrap();
    assert_eq!(permit.commands, vec!["ping ipv6 2001:db8::/64 repeat 5"]);
}

#[test]
fn foreign_builtin_listed_by_id_is_not_authorized() {
    let options = LoadOptions {
        include_builtins: true,
        ..Default::default()
    };
    let devices = r#"
devices:
  - name: Edge
    address: 192.0.2.9
    platform: cisco_ios
    directives:
      - __juniper_bgp_route_table__
      - bgp_route
      - builtins: false
"#;
    let s = snapshot_from_str(
        DIRECTIVES,
        devices,
        &options,
        &StaticRegistry::builtin(),
        &resolver(),
    )
    .unwrap();

    let edge = s.devices().get("edge").unwrap();
    assert_eq!(edge.directive_ids(), vec!["bgp_route"]);

    let err = s
        .authorize("edge", "__juniper_bgp_route_table__", "192.0.2.0/24")
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn directive_plugins_map_paths_to_directives() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("community.py"), "").unwrap();
    let directives = r#"
directives:
  - id: a
    name: A
    plugins: [community]
  - id: b
    name: B
    plugins: [community.py, missing]
"#;
    let devices = r#"
devices:
  - name: r1
    address: 192.0.2.1
    platform: cisco_ios
    directives: [a, b]
"#;
    let options = LoadOptions {
        plugin_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let s = snapshot_from_str(
        directives,
        devices,
        &options,
        &StaticRegistry::builtin(),
        &resolver(),
    )
    .unwrap();

    let plugins = s.devices().directive_plugins();
    assert_eq!(plugins.len(), 1);
    let (path, ids) = plugins.iter().next().unwrap();
    assert_eq!(path.file_name().unwrap(), "community.py");
    assert_eq!(ids, &vec!["a".to_string(), "b".to_string()]);
}
