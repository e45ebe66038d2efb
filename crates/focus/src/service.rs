//! The arbiter facade the host service talks to.
//!
//! `AudioArbiter` wires the pieces together: classifier → engine →
//! ducking resolver → gain commit → listener dispatch. It owns the one
//! piece of cross-component state the engine does not track, the set of
//! output addresses attenuated by the previous ducking resolution per
//! zone.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use aa_common::{
    ArbiterError, AudioGainBackend, AudioUsage, ClientId, FocusDecision, FocusListener,
    FocusRequest, GainIndex, GainRequestKind, GroupId, OutputAddress, ZoneId,
};
use aa_gain::{GainController, GainError, GainEventReason, GroupConfig};
use aa_policy::{ContextClassifier, DuckingPolicy, InteractionMatrix};

use crate::engine::{FocusArbitrationEngine, LossPolicy};
use crate::resolver::{resolve_ducking, ZoneTopology};

/// Declarative wiring of one arbitration zone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: ZoneId,
    pub topology: ZoneTopology,
}

/// Everything the arbiter needs at construction time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArbiterConfig {
    pub zones: Vec<ZoneConfig>,
    pub groups: Vec<GroupConfig>,
    /// How displaced entries lose focus; deployments pick per platform.
    #[serde(default)]
    pub loss_policy: LossPolicy,
}

/// A focus request as the host hands it over, before classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusAttributes {
    pub client: ClientId,
    pub zone: ZoneId,
    pub usage: AudioUsage,
    pub kind: GainRequestKind,
    pub accepts_delay: bool,
    pub accepts_duck: bool,
}

impl FocusAttributes {
    pub fn new(client: ClientId, zone: ZoneId, usage: AudioUsage, kind: GainRequestKind) -> Self {
        Self {
            client,
            zone,
            usage,
            kind,
            accepts_delay: false,
            accepts_duck: true,
        }
    }

    pub fn with_delay_accepted(mut self, accepts: bool) -> Self {
        self.accepts_delay = accepts;
        self
    }

    pub fn with_duck_accepted(mut self, accepts: bool) -> Self {
        self.accepts_duck = accepts;
        self
    }
}

/// The root arbiter object.
pub struct AudioArbiter {
    classifier: ContextClassifier,
    engine: FocusArbitrationEngine,
    gain: GainController,
    duck_policy: DuckingPolicy,
    topologies: HashMap<ZoneId, ZoneTopology>,
    /// Addresses attenuated by the last resolution, per zone.
    prev_ducked: Mutex<HashMap<ZoneId, BTreeSet<OutputAddress>>>,
}

impl AudioArbiter {
    pub fn new(
        config: ArbiterConfig,
        classifier: ContextClassifier,
        matrix: InteractionMatrix,
        duck_policy: DuckingPolicy,
        backend: Arc<dyn AudioGainBackend>,
        listener: Arc<dyn FocusListener>,
    ) -> Result<Self, GainError> {
        let zone_ids: Vec<ZoneId> = config.zones.iter().map(|z| z.id).collect();
        let topologies = config
            .zones
            .into_iter()
            .map(|z| (z.id, z.topology))
            .collect();
        let gain = GainController::new(config.groups, backend)?;
        tracing::debug!(zones = zone_ids.len(), "Audio arbiter built");
        Ok(Self {
            classifier,
            engine: FocusArbitrationEngine::new(&zone_ids, matrix, config.loss_policy, listener),
            gain,
            duck_policy,
            topologies,
            prev_ducked: Mutex::new(HashMap::new()),
        })
    }

    /// Classify and arbitrate one focus request, then recompute ducking
    /// for the zone if anything changed.
    pub fn request_focus(
        &self,
        attributes: FocusAttributes,
    ) -> Result<FocusDecision, ArbiterError> {
        let context = self.classifier.classify(attributes.usage);
        let zone = attributes.zone;
        let request = FocusRequest {
            client: attributes.client,
            zone,
            context,
            kind: attributes.kind,
            accepts_delay: attributes.accepts_delay,
            accepts_duck: attributes.accepts_duck,
        };
        let decision = self.engine.request_focus(request)?;
        if decision != FocusDecision::Rejected {
            self.refresh_ducking(zone)?;
        }
        Ok(decision)
    }

    /// Release everything the client has, in any zone. Unknown clients
    /// are logged and ignored.
    pub fn release_focus(&self, client: &ClientId) -> Result<(), ArbiterError> {
        let mut found_any = false;
        for zone in self.engine.zone_ids() {
            if self.engine.release_focus(zone, client)? {
                found_any = true;
                self.refresh_ducking(zone)?;
            }
        }
        if !found_any {
            tracing::warn!(client = %client, "Release for client with no outstanding request");
        }
        Ok(())
    }

    /// Set or clear the zone-wide restriction (e.g. power-save sweep).
    pub fn set_restricted(&self, zone: ZoneId, restricted: bool) -> Result<(), ArbiterError> {
        self.engine.set_restricted(zone, restricted)?;
        self.refresh_ducking(zone)
    }

    /// Snapshot of the zone's current holders.
    pub fn current_holders(&self, zone: ZoneId) -> Result<Vec<FocusRequest>, ArbiterError> {
        self.engine.current_holders(zone)
    }

    /// Snapshot of the zone's current losers.
    pub fn current_losers(&self, zone: ZoneId) -> Result<Vec<FocusRequest>, ArbiterError> {
        self.engine.current_losers(zone)
    }

    /// User/platform volume on a group.
    pub fn set_group_requested_index(
        &self,
        group: GroupId,
        index: GainIndex,
    ) -> Result<(), GainError> {
        self.gain.set_requested_index(group, index)
    }

    /// Mute or unmute a group.
    pub fn set_group_muted(&self, group: GroupId, muted: bool) -> Result<(), GainError> {
        self.gain.set_muted(group, muted)
    }

    /// The group's current effective index.
    pub fn group_effective_index(&self, group: GroupId) -> Result<GainIndex, GainError> {
        self.gain.effective_index(group)
    }

    /// Backend-originated gain event (thermal limits, remote block, ...).
    pub fn on_gain_event(
        &self,
        group: GroupId,
        reasons: &BTreeSet<GainEventReason>,
        reported_index: GainIndex,
    ) -> Result<(), GainError> {
        self.gain.on_gain_event(group, reasons, reported_index)
    }

    /// Re-resolve ducking for one zone from its current holder set and
    /// commit the delta through the gain controller.
    fn refresh_ducking(&self, zone: ZoneId) -> Result<(), ArbiterError> {
        let Some(topology) = self.topologies.get(&zone) else {
            // Zones are created from the same config as topologies.
            debug_assert!(false, "no topology for {zone}");
            return Ok(());
        };
        let held: BTreeSet<_> = self
            .engine
            .current_holders(zone)?
            .into_iter()
            .map(|r| r.context)
            .collect();

        let mut prev_ducked = self.prev_ducked.lock();
        let previous = prev_ducked.entry(zone).or_default();
        let update = resolve_ducking(previous, &held, &self.duck_policy, topology);
        if !update.is_noop() {
            tracing::debug!(
                zone = %zone,
                ducked = update.to_duck.len(),
                restored = update.to_unduck.len(),
                "Ducking update"
            );
            let to_duck: Vec<OutputAddress> = update.to_duck.iter().cloned().collect();
            let to_unduck: Vec<OutputAddress> = update.to_unduck.iter().cloned().collect();
            self.gain.apply_duck_update(&to_duck, &to_unduck);
        }
        self.engine.mark_ducked(zone, &update.ducked_contexts)?;
        *previous = update.to_duck;
        Ok(())
    }
}
