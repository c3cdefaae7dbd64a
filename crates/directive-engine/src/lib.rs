//! # directive-engine
//!
//! Authorization core for glass-gate. A *directive* is a named bundle of
//! command templates guarded by an ordered list of rules; this crate loads
//! directives from YAML, pre-compiles their rules and decides whether a
//! caller-supplied query target is permitted.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use directive_engine::{loader, LoadOptions};
//!
//! let catalog = loader::load_directives("directives.yaml", &LoadOptions::default()).unwrap();
//! let directive = catalog.get("bgp_route").unwrap();
//! let decision = directive.evaluate("192.0.2.0/24");
//! println!("{:?}", decision.outcome);
//! ```

pub mod builtins;
mod collection;
mod decision;
mod directive;
mod error;
mod evaluator;
pub mod loader;
mod rule;
mod schema;
pub mod template;

// Re-export primary public API at crate root.
pub use collection::{Collection, Keyed};
pub use decision::{Decision, Outcome, Rejection, Resource, RuleTrace};
pub use directive::{Directive, DirectiveExport, HelpExport};
pub use error::ConfigError;
pub use loader::LoadOptions;
pub use rule::{NetworkRule, NullRule, PatternRule, Rule, RuleKind, Verdict};
pub use schema::{Action, DirectiveFile, Field, RawDirective, RawRule, SelectOption};
