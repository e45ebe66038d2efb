//! The gain controller: per-group serialization and backend commit.
//!
//! Two paths mutate a group's override state — explicit user/platform
//! volume calls and the ducking/HAL-event path — and both can touch
//! overlapping overlay fields. They serialize through the same per-group
//! `parking_lot::Mutex` so the precedence chain always observes a
//! consistent snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use aa_common::{AudioGainBackend, GainIndex, GroupId, OutputAddress};

use crate::error::GainError;
use crate::group::GainOverrideState;
use crate::reasons::{apply_gain_event, GainEventReason};

/// Declarative configuration of one volume group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: GroupId,
    /// Output addresses sharing this group's volume.
    pub addresses: Vec<OutputAddress>,
    pub min_index: GainIndex,
    pub max_index: GainIndex,
    /// Index restored at startup (persisted per user by the host).
    pub default_index: GainIndex,
    /// Index applied while this group is ducked by the focus engine.
    pub attenuated_index: GainIndex,
}

struct GroupSlot {
    config: GroupConfig,
    state: Mutex<GainOverrideState>,
}

/// Owns every volume group's override state and drives the backend.
pub struct GainController {
    groups: HashMap<GroupId, GroupSlot>,
    address_to_group: HashMap<OutputAddress, GroupId>,
    backend: Arc<dyn AudioGainBackend>,
}

impl GainController {
    /// Build the controller from group configurations.
    ///
    /// An address appearing in two groups is a configuration error and is
    /// reported, never silently resolved.
    pub fn new(
        configs: Vec<GroupConfig>,
        backend: Arc<dyn AudioGainBackend>,
    ) -> Result<Self, GainError> {
        let mut groups = HashMap::with_capacity(configs.len());
        let mut address_to_group = HashMap::new();
        for config in configs {
            for address in &config.addresses {
                if let Some(existing) = address_to_group.insert(address.clone(), config.id) {
                    return Err(GainError::DuplicateAddress {
                        address: address.clone(),
                        first: existing,
                        second: config.id,
                    });
                }
            }
            let state = GainOverrideState::new(
                config.min_index,
                config.max_index,
                config.default_index,
            );
            groups.insert(
                config.id,
                GroupSlot {
                    config,
                    state: Mutex::new(state),
                },
            );
        }
        tracing::debug!(groups = groups.len(), "Gain controller built");
        Ok(Self {
            groups,
            address_to_group,
            backend,
        })
    }

    /// Set the user-requested index on a group and commit the result.
    pub fn set_requested_index(&self, group: GroupId, index: GainIndex) -> Result<(), GainError> {
        let slot = self.slot(group)?;
        let mut state = slot.state.lock();
        state.set_requested(index);
        self.commit(slot, &state);
        Ok(())
    }

    /// Mute or unmute a group and commit the result.
    pub fn set_muted(&self, group: GroupId, muted: bool) -> Result<(), GainError> {
        let slot = self.slot(group)?;
        let mut state = slot.state.lock();
        state.set_muted(muted);
        self.commit(slot, &state);
        Ok(())
    }

    /// The group's current effective index.
    pub fn effective_index(&self, group: GroupId) -> Result<GainIndex, GainError> {
        Ok(self.slot(group)?.state.lock().effective_index())
    }

    /// Translate a backend-originated gain event into overlay updates.
    ///
    /// The backend already applied `reported_index` on its own; the state
    /// is recommitted only if the override chain resolves differently
    /// (e.g. a mute is in force).
    pub fn on_gain_event(
        &self,
        group: GroupId,
        reasons: &std::collections::BTreeSet<GainEventReason>,
        reported_index: GainIndex,
    ) -> Result<(), GainError> {
        let slot = self.slot(group)?;
        let mut state = slot.state.lock();
        apply_gain_event(&mut state, reasons, reported_index);
        if state.effective_index() != reported_index {
            self.commit(slot, &state);
        }
        Ok(())
    }

    /// Apply a ducking update from the focus engine.
    ///
    /// A group is attenuated if any of its addresses is in `to_duck`, and
    /// restored if any is in `to_unduck`. Addresses not belonging to any
    /// group are logged and skipped.
    pub fn apply_duck_update(&self, to_duck: &[OutputAddress], to_unduck: &[OutputAddress]) {
        for (attenuate, addresses) in [(true, to_duck), (false, to_unduck)] {
            for group in self.groups_for(addresses) {
                // groups_for only yields ids taken from the address map,
                // which is built from the same group set.
                let Some(slot) = self.groups.get(&group) else {
                    debug_assert!(false, "address map references missing group {group}");
                    continue;
                };
                let mut state = slot.state.lock();
                let value = attenuate.then_some(slot.config.attenuated_index);
                state.set_attenuated(value);
                self.commit(slot, &state);
            }
        }
    }

    /// Group ids configured on this controller, in stable order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.keys().copied().collect();
        ids.sort();
        ids
    }

    fn slot(&self, group: GroupId) -> Result<&GroupSlot, GainError> {
        self.groups.get(&group).ok_or(GainError::UnknownGroup(group))
    }

    /// Deduplicated groups owning any of `addresses`.
    fn groups_for(&self, addresses: &[OutputAddress]) -> Vec<GroupId> {
        let mut ids = Vec::new();
        for address in addresses {
            match self.address_to_group.get(address) {
                Some(id) if !ids.contains(id) => ids.push(*id),
                Some(_) => {}
                None => {
                    tracing::warn!(address = %address, "Duck update for unknown address; skipped");
                }
            }
        }
        ids
    }

    /// Push the group's effective state to every address it owns.
    ///
    /// Backend failures are logged and do not roll back the committed
    /// state: the bookkeeping must stay consistent independent of
    /// whether hardware accepted the change.
    fn commit(&self, slot: &GroupSlot, state: &GainOverrideState) {
        let effective = state.effective_index();
        for address in &slot.config.addresses {
            if let Err(err) = self.backend.apply_mute(address, state.is_muted()) {
                tracing::error!(address = %address, error = %err, "Backend mute apply failed");
            }
            if let Err(err) = self.backend.apply_gain(address, effective) {
                tracing::error!(address = %address, error = %err, "Backend gain apply failed");
            }
        }
        tracing::debug!(
            group = %slot.config.id,
            effective = %effective,
            muted = state.is_muted(),
            "Gain committed"
        );
    }
}
