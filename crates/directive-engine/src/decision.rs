use std::fmt;

use ipnet::IpNet;
use serde::Serialize;
use thiserror::Error;

use crate::rule::RuleKind;

/// Why a query was refused.
///
/// Every variant carries the offending target and enough context for a
/// transport layer to render a precise client-error message without
/// re-evaluating anything.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// The target is not a valid IP network where one was required.
    #[error("{reason}")]
    MalformedTarget { target: String, reason: String },

    /// The target is inside an IP rule's network but its prefix length is
    /// outside the rule's `ge`/`le` window.
    #[error("Prefix-length is not within range {ge}-{le}")]
    PrefixLengthOutOfRange { target: String, ge: u8, le: u8 },

    /// The target is inside a network a deny rule covers.
    #[error("Member of denied network '{network}'")]
    NetworkDenied { target: String, network: IpNet },

    /// The target matched a deny pattern.
    #[error("Denied")]
    PatternDenied { target: String, pattern: String },

    /// No rule made a decision.
    #[error("No matched validation rules")]
    NoMatchingRule { target: String },

    /// The device or directive does not exist in the current snapshot.
    #[error("{resource} '{id}' not found")]
    NotFound {
        target: String,
        resource: Resource,
        id: String,
    },

    /// A permitting rule's command could not be rendered for the device.
    #[error("Directive '{directive}' has no usable command for this device")]
    CommandUnavailable {
        target: String,
        directive: String,
        reason: String,
    },
}

impl Rejection {
    /// The caller-supplied target this rejection is about.
    pub fn target(&self) -> &str {
        match self {
            Self::MalformedTarget { target, .. }
            | Self::PrefixLengthOutOfRange { target, .. }
            | Self::NetworkDenied { target, .. }
            | Self::PatternDenied { target, .. }
            | Self::NoMatchingRule { target }
            | Self::NotFound { target, .. }
            | Self::CommandUnavailable { target, .. } => target,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTarget { .. } => "malformed_target",
            Self::PrefixLengthOutOfRange { .. } => "prefix_length_out_of_range",
            Self::NetworkDenied { .. } => "network_denied",
            Self::PatternDenied { .. } => "pattern_denied",
            Self::NoMatchingRule { .. } => "no_matching_rule",
            Self::NotFound { .. } => "not_found",
            Self::CommandUnavailable { .. } => "command_unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Device,
    Directive,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "Device"),
            Self::Directive => write!(f, "Directive"),
        }
    }
}

/// The outcome of evaluating a target against one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Permitted by the rule at `rule` (index into the directive's rules).
    Permitted { rule: usize },
    Rejected(Rejection),
}

/// Diagnostic record of a single rule's part in a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTrace {
    pub index: usize,
    pub kind: RuleKind,
    /// `Some(true)` permitted, `Some(false)` rejected, `None` inconclusive.
    pub passed: Option<bool>,
}

/// The result of [`Directive::evaluate`](crate::Directive::evaluate): the
/// outcome plus the per-rule trace, in evaluation order.
#[derive(Debug, Clone)]
pub struct Decision {
    pub directive: String,
    pub outcome: Outcome,
    pub trace: Vec<RuleTrace>,
}

impl Decision {
    pub fn is_permitted(&self) -> bool {
        matches!(self.outcome, Outcome::Permitted { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.outcome {
            Outcome::Rejected(r) => Some(r),
            Outcome::Permitted { .. } => None,
        }
    }

    /// Index of the permitting rule, or the rejection.
    pub fn into_result(self) -> Result<usize, Rejection> {
        match self.outcome {
            Outcome::Permitted { rule } => Ok(rule),
            Outcome::Rejected(r) => Err(r),
        }
    }
}
