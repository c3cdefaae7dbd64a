use std::sync::Arc;

use directive_engine::template::{self, TARGET};
use directive_engine::{Collection, Directive, Rejection, Resource, RuleTrace};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::device::{Device, PublicDevice};
use crate::inventory::{DeviceCollection, FrontendGroup};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The immutable result of one configuration load: the directive catalog
/// and every resolved device.
#[derive(Debug, Default)]
pub struct Snapshot {
    directives: Collection<Directive>,
    devices: DeviceCollection,
}

/// A permitted query, ready for an execution driver.
#[derive(Debug, Clone, Serialize)]
pub struct Permit {
    pub device: String,
    pub directive: String,
    pub target: String,
    /// Index of the permitting rule.
    pub rule: usize,
    /// The permitting rule's commands with `{target}` and device
    /// attributes substituted.
    pub commands: Vec<String>,
    pub trace: Vec<RuleTrace>,
}

impl Snapshot {
    pub fn new(directives: Collection<Directive>, devices: DeviceCollection) -> Self {
        Self {
            directives,
            devices,
        }
    }

    pub fn directives(&self) -> &Collection<Directive> {
        &self.directives
    }

    pub fn devices(&self) -> &DeviceCollection {
        &self.devices
    }

    /// Decide whether `target` may be queried with `directive_id` on
    /// `device_id`.
    ///
    /// Only directives attached to the device are eligible; anything else
    /// is reported as not found.
    pub fn authorize(
        &self,
        device_id: &str,
        directive_id: &str,
        target: &str,
    ) -> Result<Permit, Rejection> {
        let device = self
            .devices
            .get(device_id)
            .ok_or_else(|| Rejection::NotFound {
                target: target.to_string(),
                resource: Resource::Device,
                id: device_id.to_string(),
            })?;
        let directive = device
            .directives()
            .get(directive_id)
            .ok_or_else(|| Rejection::NotFound {
                target: target.to_string(),
                resource: Resource::Directive,
                id: directive_id.to_string(),
            })?;

        let decision = directive.evaluate(target);
        let trace = decision.trace.clone();
        let rule = match decision.into_result() {
            Ok(rule) => rule,
            Err(rejection) => {
                debug!(
                    device = device_id,
                    directive = directive_id,
                    target,
                    reason = rejection.code(),
                    ?trace,
                    "query rejected"
                );
                return Err(rejection);
            }
        };

        let commands = directive
            .rules()
            .get(rule)
            .map(|r| r.commands())
            .unwrap_or_default()
            .iter()
            .map(|command| render_command(command, device, directive, target))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(device = device_id, directive = directive_id, target, rule, "query permitted");

        Ok(Permit {
            device: device.id().to_string(),
            directive: directive.id().to_string(),
            target: target.to_string(),
            rule,
            commands,
            trace,
        })
    }

    pub fn export_public_inventory(&self) -> Vec<PublicDevice> {
        self.devices.export_public_inventory()
    }

    pub fn export_frontend_catalog(&self) -> Vec<FrontendGroup> {
        self.devices.export_frontend_catalog()
    }
}

fn render_command(
    command: &str,
    device: &Device,
    directive: &Directive,
    target: &str,
) -> Result<String, Rejection> {
    template::render(command, |name| {
        if name == TARGET {
            Some(target)
        } else {
            device.attr(name)
        }
    })
    .map_err(|e| {
        // Templates and attributes are checked when the device is built.
        error!(
            device = device.id(),
            directive = directive.id(),
            error = %e,
            "command template failed to render"
        );
        Rejection::CommandUnavailable {
            target: target.to_string(),
            directive: directive.id().to_string(),
            reason: e.to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// Process-wide holder of the current snapshot.
///
/// Readers take an `Arc` to the snapshot that is current when they start
/// and keep using it even if a reload publishes a newer one meanwhile.
#[derive(Debug)]
pub struct SnapshotStore {
    current: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        let (current, _) = watch::channel(Arc::new(initial));
        Self { current }
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Replace the current snapshot wholesale.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.send_replace(Arc::clone(&snapshot));
        info!(
            devices = snapshot.devices().len(),
            directives = snapshot.directives().len(),
            "snapshot published"
        );
        snapshot
    }

    /// Build a new snapshot and publish it only if building succeeded.
    ///
    /// On failure the current snapshot stays in effect and the error is
    /// handed back to the caller.
    pub fn reload<F, E>(&self, build: F) -> Result<Arc<Snapshot>, E>
    where
        F: FnOnce() -> Result<Snapshot, E>,
        E: std::fmt::Display,
    {
        match build() {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(e) => {
                warn!(error = %e, "snapshot reload failed, keeping current snapshot");
                Err(e)
            }
        }
    }

    /// Receive a notification each time a snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }
}
