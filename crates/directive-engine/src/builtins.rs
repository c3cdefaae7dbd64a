//! Directives shipped with glass-gate.
//!
//! Each entry applies to the listed platforms without any per-device
//! authoring. Builtin ids are wrapped in double underscores so they never
//! collide with operator-chosen ids by accident. Entries with
//! `table_output` set produce structured output and are only attached to
//! devices with structured output enabled.

use crate::schema::{Action, Commands, Field, RawDirective, RawRule};

pub struct BuiltinRule {
    pub condition: &'static str,
    pub command: &'static str,
}

pub struct BuiltinDirective {
    pub id: &'static str,
    pub name: &'static str,
    pub platforms: &'static [&'static str],
    pub table_output: bool,
    pub description: &'static str,
    pub rules: &'static [BuiltinRule],
}

const PREFIX_TARGET: &str = "IP Address or Prefix";
const ADDRESS_TARGET: &str = "IP Address";

const fn v4(command: &'static str) -> BuiltinRule {
    BuiltinRule {
        condition: "0.0.0.0/0",
        command,
    }
}

const fn v6(command: &'static str) -> BuiltinRule {
    BuiltinRule {
        condition: "::/0",
        command,
    }
}

pub static BUILTINS: &[BuiltinDirective] = &[
    // -- Juniper --
    BuiltinDirective {
        id: "__juniper_bgp_route__",
        name: "BGP Route",
        platforms: &["juniper"],
        table_output: false,
        description: PREFIX_TARGET,
        rules: &[
            v4("show route protocol bgp table inet.0 {target} detail"),
            v6("show route protocol bgp table inet6.0 {target} detail"),
        ],
    },
    BuiltinDirective {
        id: "__juniper_bgp_route_table__",
        name: "BGP Route",
        platforms: &["juniper"],
        table_output: true,
        description: PREFIX_TARGET,
        rules: &[
            v4("show route protocol bgp table inet.0 {target} best detail | display xml"),
            v6("show route protocol bgp table inet6.0 {target} best detail | display xml"),
        ],
    },
    BuiltinDirective {
        id: "__juniper_ping__",
        name: "Ping",
        platforms: &["juniper"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[
            v4("ping inet {target} count 5"),
            v6("ping inet6 {target} count 5"),
        ],
    },
    BuiltinDirective {
        id: "__juniper_traceroute__",
        name: "Traceroute",
        platforms: &["juniper"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[
            v4("traceroute inet {target} wait 1"),
            v6("traceroute inet6 {target} wait 2"),
        ],
    },
    // -- Arista EOS --
    BuiltinDirective {
        id: "__arista_eos_bgp_route__",
        name: "BGP Route",
        platforms: &["arista_eos"],
        table_output: false,
        description: PREFIX_TARGET,
        rules: &[
            v4("show ip bgp {target}"),
            v6("show ipv6 bgp {target}"),
        ],
    },
    BuiltinDirective {
        id: "__arista_eos_bgp_route_table__",
        name: "BGP Route",
        platforms: &["arista_eos"],
        table_output: true,
        description: PREFIX_TARGET,
        rules: &[
            v4("show ip bgp {target} | json"),
            v6("show ipv6 bgp {target} | json"),
        ],
    },
    BuiltinDirective {
        id: "__arista_eos_ping__",
        name: "Ping",
        platforms: &["arista_eos"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[v4("ping ip {target}"), v6("ping ipv6 {target}")],
    },
    BuiltinDirective {
        id: "__arista_eos_traceroute__",
        name: "Traceroute",
        platforms: &["arista_eos"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[v4("traceroute ip {target}"), v6("traceroute ipv6 {target}")],
    },
    // -- Cisco IOS / IOS-XE --
    BuiltinDirective {
        id: "__cisco_ios_bgp_route__",
        name: "BGP Route",
        platforms: &["cisco_ios", "cisco_xe"],
        table_output: false,
        description: PREFIX_TARGET,
        rules: &[
            v4("show bgp ipv4 unicast {target}"),
            v6("show bgp ipv6 unicast {target}"),
        ],
    },
    BuiltinDirective {
        id: "__cisco_ios_ping__",
        name: "Ping",
        platforms: &["cisco_ios", "cisco_xe"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[
            v4("ping {target} repeat 5"),
            v6("ping ipv6 {target} repeat 5"),
        ],
    },
    BuiltinDirective {
        id: "__cisco_ios_traceroute__",
        name: "Traceroute",
        platforms: &["cisco_ios", "cisco_xe"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[
            v4("traceroute {target} timeout 1 probe 2"),
            v6("traceroute ipv6 {target} timeout 1 probe 2"),
        ],
    },
    // -- FRRouting --
    BuiltinDirective {
        id: "__frr_bgp_route__",
        name: "BGP Route",
        platforms: &["frr"],
        table_output: false,
        description: PREFIX_TARGET,
        rules: &[
            v4("vtysh -c \"show bgp ipv4 unicast {target}\""),
            v6("vtysh -c \"show bgp ipv6 unicast {target}\""),
        ],
    },
    BuiltinDirective {
        id: "__frr_ping__",
        name: "Ping",
        platforms: &["frr"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[v4("ping -4 -c 5 {target}"), v6("ping -6 -c 5 {target}")],
    },
    BuiltinDirective {
        id: "__frr_traceroute__",
        name: "Traceroute",
        platforms: &["frr"],
        table_output: false,
        description: ADDRESS_TARGET,
        rules: &[
            v4("traceroute -4 -w 1 -q 1 {target}"),
            v6("traceroute -6 -w 1 -q 1 {target}"),
        ],
    },
];

/// The builtin table as raw records, ready for validation.
pub fn records() -> Vec<RawDirective> {
    BUILTINS
        .iter()
        .map(|b| RawDirective {
            id: b.id.to_string(),
            name: b.name.to_string(),
            rules: b
                .rules
                .iter()
                .map(|r| RawRule {
                    condition: Some(r.condition.to_string()),
                    action: Action::Permit,
                    command: Commands::One(r.command.to_string()),
                    ge: None,
                    le: None,
                })
                .collect(),
            field: Some(Field::Text {
                description: b.description.to_string(),
                validation: None,
            }),
            info: None,
            plugins: Vec::new(),
            groups: Vec::new(),
            table_output: b.table_output,
            builtin: true,
            platforms: b.platforms.iter().map(|p| p.to_string()).collect(),
        })
        .collect()
}
