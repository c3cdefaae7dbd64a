use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::decision::Rejection;
use crate::error::ConfigError;
use crate::schema::{Action, RawRule};
use crate::template;

// ---------------------------------------------------------------------------
// Rule variants
// ---------------------------------------------------------------------------

/// A single permit/deny predicate over a query target.
#[derive(Debug, Clone)]
pub enum Rule {
    Ipv4(NetworkRule),
    Ipv6(NetworkRule),
    Pattern(PatternRule),
    Null(NullRule),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Ipv4,
    Ipv6,
    Pattern,
    Null,
}

/// IP membership rule. `ge`/`le` are inclusive prefix-length bounds.
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub condition: IpNet,
    pub ge: u8,
    pub le: u8,
    pub action: Action,
    pub commands: Vec<String>,
}

/// Case-insensitive regex rule, anchored at the start of the target.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// The pattern as configured (`*` means "anything").
    pub pattern: String,
    regex: Regex,
    pub action: Action,
    pub commands: Vec<String>,
}

/// Always permits. Used by directives that take no validated input.
#[derive(Debug, Clone)]
pub struct NullRule {
    pub commands: Vec<String>,
}

/// What a single rule concluded about a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Permit,
    Reject(Rejection),
    /// The rule does not apply; evaluation moves on to the next rule.
    Inconclusive,
}

impl Rule {
    /// Validate a raw rule record belonging to `directive`.
    pub fn compile(directive: &str, raw: RawRule) -> Result<Self, ConfigError> {
        let commands = raw.command.into_vec();
        for command in &commands {
            template::placeholders(command).map_err(|source| ConfigError::InvalidTemplate {
                directive: directive.to_string(),
                source,
            })?;
        }

        let condition = match raw.condition {
            None => return Ok(Rule::Null(NullRule { commands })),
            Some(c) => c,
        };

        match parse_condition(directive, &condition)? {
            Some(network) => {
                let max = max_prefix(&network);
                let ge = raw.ge.unwrap_or(0);
                let le = raw.le.unwrap_or(max);
                if ge > le || le > max {
                    return Err(ConfigError::InvalidPrefixBounds {
                        directive: directive.to_string(),
                        condition,
                        ge,
                        le,
                        max,
                    });
                }
                let rule = NetworkRule {
                    condition: network,
                    ge,
                    le,
                    action: raw.action,
                    commands,
                };
                Ok(match network {
                    IpNet::V4(_) => Rule::Ipv4(rule),
                    IpNet::V6(_) => Rule::Ipv6(rule),
                })
            }
            None => {
                let source = if condition == "*" {
                    "(?i)^.+".to_string()
                } else {
                    format!("(?i)^(?:{condition})")
                };
                let regex = Regex::new(&source).map_err(|source| ConfigError::InvalidPattern {
                    directive: directive.to_string(),
                    pattern: condition.clone(),
                    source,
                })?;
                Ok(Rule::Pattern(PatternRule {
                    pattern: condition,
                    regex,
                    action: raw.action,
                    commands,
                }))
            }
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Ipv4(_) => RuleKind::Ipv4,
            Self::Ipv6(_) => RuleKind::Ipv6,
            Self::Pattern(_) => RuleKind::Pattern,
            Self::Null(_) => RuleKind::Null,
        }
    }

    /// Command templates run when this rule permits a target.
    pub fn commands(&self) -> &[String] {
        match self {
            Self::Ipv4(r) | Self::Ipv6(r) => &r.commands,
            Self::Pattern(r) => &r.commands,
            Self::Null(r) => &r.commands,
        }
    }

    /// Evaluate `target` against this rule alone.
    pub fn evaluate(&self, target: &str) -> Verdict {
        match self {
            Self::Ipv4(r) | Self::Ipv6(r) => r.evaluate(target),
            Self::Pattern(r) => r.evaluate(target),
            Self::Null(_) => Verdict::Permit,
        }
    }
}

impl NetworkRule {
    /// `true` when `network` covers the whole address range of `target`.
    pub fn contains(&self, target: &IpNet) -> bool {
        self.condition.network() <= target.network()
            && self.condition.broadcast() >= target.broadcast()
    }

    pub fn in_range(&self, target: &IpNet) -> bool {
        (self.ge..=self.le).contains(&target.prefix_len())
    }

    fn evaluate(&self, target: &str) -> Verdict {
        let network = match parse_target(target) {
            Ok(network) => network,
            Err(reason) => {
                return Verdict::Reject(Rejection::MalformedTarget {
                    target: target.to_string(),
                    reason,
                })
            }
        };

        if !same_family(&self.condition, &network) {
            return Verdict::Inconclusive;
        }

        trace!(target = %network, condition = %self.condition, "checking membership");
        if !self.contains(&network) {
            return Verdict::Inconclusive;
        }

        if !self.in_range(&network) {
            return Verdict::Reject(Rejection::PrefixLengthOutOfRange {
                target: target.to_string(),
                ge: self.ge,
                le: self.le,
            });
        }

        match self.action {
            Action::Permit => Verdict::Permit,
            Action::Deny => Verdict::Reject(Rejection::NetworkDenied {
                target: target.to_string(),
                network: self.condition,
            }),
        }
    }
}

impl PatternRule {
    pub fn is_match(&self, target: &str) -> bool {
        self.regex.is_match(target)
    }

    fn evaluate(&self, target: &str) -> Verdict {
        if !self.is_match(target) {
            return Verdict::Inconclusive;
        }
        match self.action {
            Action::Permit => Verdict::Permit,
            Action::Deny => Verdict::Reject(Rejection::PatternDenied {
                target: target.to_string(),
                pattern: self.pattern.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn max_prefix(network: &IpNet) -> u8 {
    match network {
        IpNet::V4(_) => 32,
        IpNet::V6(_) => 128,
    }
}

fn same_family(a: &IpNet, b: &IpNet) -> bool {
    matches!(
        (a, b),
        (IpNet::V4(_), IpNet::V4(_)) | (IpNet::V6(_), IpNet::V6(_))
    )
}

/// Parse a strict IP network: a bare address is a host network, and a
/// network with host bits set is invalid.
fn parse_network(value: &str) -> Option<Result<IpNet, String>> {
    if value.contains('/') {
        let network = value.parse::<IpNet>().ok()?;
        if network.trunc() != network {
            return Some(Err(format!("{value} has host bits set")));
        }
        Some(Ok(network))
    } else {
        let addr = value.parse::<IpAddr>().ok()?;
        let prefix = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Some(IpNet::new(addr, prefix).map_err(|e| e.to_string()))
    }
}

/// A rule condition is an IP network when it parses as one; any other
/// string is a pattern.
fn parse_condition(directive: &str, condition: &str) -> Result<Option<IpNet>, ConfigError> {
    match parse_network(condition) {
        None => Ok(None),
        Some(Ok(network)) => Ok(Some(network)),
        Some(Err(reason)) => Err(ConfigError::InvalidCondition {
            directive: directive.to_string(),
            condition: condition.to_string(),
            reason,
        }),
    }
}

fn parse_target(target: &str) -> Result<IpNet, String> {
    parse_network(target).unwrap_or_else(|| {
        Err(format!(
            "'{target}' does not appear to be an IPv4 or IPv6 network"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip_rule(condition: &str, action: Action, ge: Option<u8>, le: Option<u8>) -> Rule {
        Rule::compile(
            "test",
            RawRule {
                condition: Some(condition.to_string()),
                action,
                ge,
                le,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn pattern_rule(condition: &str, action: Action) -> Rule {
        Rule::compile(
            "test",
            RawRule {
                condition: Some(condition.to_string()),
                action,
                ..Default::default()
            },
        )
        .unwrap()
    }

    // ---- variant selection ----

    #[test]
    fn condition_selects_variant() {
        assert_eq!(ip_rule("192.0.2.0/24", Action::Permit, None, None).kind(), RuleKind::Ipv4);
        assert_eq!(ip_rule("2001:db8::/32", Action::Permit, None, None).kind(), RuleKind::Ipv6);
        assert_eq!(pattern_rule("^65000:.*", Action::Permit).kind(), RuleKind::Pattern);
        let null = Rule::compile("test", RawRule::default()).unwrap();
        assert_eq!(null.kind(), RuleKind::Null);
    }

    #[test]
    fn bounds_default_to_family_range() {
        match ip_rule("2001:db8::/32", Action::Permit, None, None) {
            Rule::Ipv6(r) => {
                assert_eq!(r.ge, 0);
                assert_eq!(r.le, 128);
            }
            other => panic!("expected Ipv6 rule, got {:?}", other),
        }
    }

    #[test]
    fn bare_address_condition_is_host_network() {
        match ip_rule("192.0.2.1", Action::Permit, None, None) {
            Rule::Ipv4(r) => assert_eq!(r.condition.prefix_len(), 32),
            other => panic!("expected Ipv4 rule, got {:?}", other),
        }
    }

    #[test]
    fn invalid_bounds_rejected_at_compile() {
        let err = Rule::compile(
            "bgp",
            RawRule {
                condition: Some("192.0.2.0/24".into()),
                ge: Some(28),
                le: Some(24),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefixBounds { .. }));

        let err = Rule::compile(
            "bgp",
            RawRule {
                condition: Some("192.0.2.0/24".into()),
                le: Some(33),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("le=33"));
    }

    #[test]
    fn host_bits_in_condition_rejected() {
        let err = Rule::compile(
            "bgp",
            RawRule {
                condition: Some("192.0.2.1/24".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCondition { .. }));
    }

    #[test]
    fn invalid_regex_rejected_at_compile() {
        let err = Rule::compile(
            "community",
            RawRule {
                condition: Some("[invalid".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(err.to_string().contains("community"));
    }

    #[test]
    fn invalid_template_rejected_at_compile() {
        let err = Rule::compile(
            "bgp",
            RawRule {
                condition: Some("0.0.0.0/0".into()),
                command: crate::schema::Commands::One("show {target".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
    }

    // ---- IP evaluation ----

    #[test]
    fn member_in_range_permit() {
        let rule = ip_rule("192.0.2.0/24", Action::Permit, Some(24), Some(32));
        assert_eq!(rule.evaluate("192.0.2.1/32"), Verdict::Permit);
        assert_eq!(rule.evaluate("192.0.2.1"), Verdict::Permit);
        assert_eq!(rule.evaluate("192.0.2.0/24"), Verdict::Permit);
    }

    #[test]
    fn member_out_of_range_is_hard_stop_even_for_permit() {
        let rule = ip_rule("192.0.2.0/24", Action::Permit, Some(24), Some(32));
        // A /23 is wider than the condition, so it is not a member.
        assert_eq!(rule.evaluate("192.0.2.0/23"), Verdict::Inconclusive);

        let rule = ip_rule("192.0.0.0/16", Action::Permit, Some(24), Some(32));
        assert_eq!(
            rule.evaluate("192.0.2.0/23"),
            Verdict::Reject(Rejection::PrefixLengthOutOfRange {
                target: "192.0.2.0/23".into(),
                ge: 24,
                le: 32,
            })
        );
    }

    #[test]
    fn member_in_range_deny() {
        let rule = ip_rule("0.0.0.0/0", Action::Deny, Some(0), Some(32));
        assert_eq!(
            rule.evaluate("203.0.113.1/32"),
            Verdict::Reject(Rejection::NetworkDenied {
                target: "203.0.113.1/32".into(),
                network: "0.0.0.0/0".parse().unwrap(),
            })
        );
    }

    #[test]
    fn non_member_is_inconclusive() {
        let rule = ip_rule("10.0.0.0/8", Action::Permit, None, None);
        assert_eq!(rule.evaluate("8.8.8.8/32"), Verdict::Inconclusive);
    }

    #[test]
    fn other_family_is_inconclusive() {
        let rule = ip_rule("0.0.0.0/0", Action::Deny, None, None);
        assert_eq!(rule.evaluate("2001:db8::1"), Verdict::Inconclusive);
    }

    #[test]
    fn ipv6_membership() {
        let rule = ip_rule("2001:db8::/32", Action::Permit, Some(32), Some(64));
        assert_eq!(rule.evaluate("2001:db8:1::/48"), Verdict::Permit);
        assert!(matches!(
            rule.evaluate("2001:db8::1"),
            Verdict::Reject(Rejection::PrefixLengthOutOfRange { ge: 32, le: 64, .. })
        ));
        assert_eq!(rule.evaluate("2001:db9::/48"), Verdict::Inconclusive);
    }

    #[test]
    fn malformed_target_is_rejection_not_skip() {
        let rule = ip_rule("0.0.0.0/0", Action::Permit, None, None);
        match rule.evaluate("not-an-ip") {
            Verdict::Reject(Rejection::MalformedTarget { target, reason }) => {
                assert_eq!(target, "not-an-ip");
                assert!(reason.contains("does not appear to be"));
            }
            other => panic!("expected MalformedTarget, got {:?}", other),
        }
    }

    #[test]
    fn target_with_host_bits_is_malformed() {
        let rule = ip_rule("0.0.0.0/0", Action::Permit, None, None);
        assert!(matches!(
            rule.evaluate("192.0.2.1/24"),
            Verdict::Reject(Rejection::MalformedTarget { .. })
        ));
    }

    // ---- pattern evaluation ----

    #[test]
    fn wildcard_matches_anything_non_empty() {
        let rule = pattern_rule("*", Action::Permit);
        assert_eq!(rule.evaluate("not an ip at all"), Verdict::Permit);
        assert_eq!(rule.evaluate("65000:1"), Verdict::Permit);
        assert_eq!(rule.evaluate(""), Verdict::Inconclusive);
    }

    #[test]
    fn pattern_is_case_insensitive_and_start_anchored() {
        let rule = pattern_rule("as\\d+", Action::Permit);
        assert_eq!(rule.evaluate("AS65000"), Verdict::Permit);
        assert_eq!(rule.evaluate("path AS65000"), Verdict::Inconclusive);
    }

    #[test]
    fn pattern_deny() {
        let rule = pattern_rule("^65535:", Action::Deny);
        assert_eq!(
            rule.evaluate("65535:666"),
            Verdict::Reject(Rejection::PatternDenied {
                target: "65535:666".into(),
                pattern: "^65535:".into(),
            })
        );
    }

    #[test]
    fn null_rule_always_permits() {
        let rule = Rule::compile(
            "test",
            RawRule {
                action: Action::Deny,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rule.evaluate(""), Verdict::Permit);
        assert_eq!(rule.evaluate("anything"), Verdict::Permit);
    }
}
