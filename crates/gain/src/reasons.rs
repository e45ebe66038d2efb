//! Backend-reported gain event reasons and their overlay mapping.
//!
//! The audio HAL reports gain changes it performed on its own (thermal
//! limiting, external amplifier mute, ADAS ducking, ...) as a set of
//! reasons plus the index it applied. Each reason classifies as exactly
//! one overlay kind, and `apply_gain_event` is the single pure function
//! that turns a reason set into overlay updates: a kind present in the
//! set installs its overlay at the reported index, a kind absent clears
//! it. No ad hoc boolean chains.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use aa_common::GainIndex;

use crate::group::GainOverrideState;

/// A reason the backend reports alongside a self-applied gain change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GainEventReason {
    /// An external unit (telematics) muted the output outright.
    TcuMute,
    /// A remote amplifier refuses gain changes.
    RemoteBlock,
    /// Thermal protection capped the gain.
    ThermalLimitation,
    /// Platform suspend capped the gain.
    SuspendLimitation,
    /// Driver-assistance system requested attenuation.
    AdasDucking,
    /// Navigation hardware path requested attenuation.
    NavDucking,
    /// Phone projection requested attenuation.
    ProjectionDucking,
}

/// The overlay a reason drives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReasonKind {
    Block,
    Limit,
    Attenuate,
}

impl GainEventReason {
    /// Classify this reason into the overlay it drives.
    pub fn kind(self) -> ReasonKind {
        match self {
            GainEventReason::TcuMute | GainEventReason::RemoteBlock => ReasonKind::Block,
            GainEventReason::ThermalLimitation | GainEventReason::SuspendLimitation => {
                ReasonKind::Limit
            }
            GainEventReason::AdasDucking
            | GainEventReason::NavDucking
            | GainEventReason::ProjectionDucking => ReasonKind::Attenuate,
        }
    }
}

/// Translate one backend gain event into overlay updates on `state`.
///
/// For each overlay kind: if any reason of that kind is present, the
/// overlay is set to `reported_index`; otherwise the overlay is cleared.
/// Evaluating presence and absence together keeps the state consistent
/// when a reason disappears between two events.
pub fn apply_gain_event(
    state: &mut GainOverrideState,
    reasons: &BTreeSet<GainEventReason>,
    reported_index: GainIndex,
) {
    let mut block = false;
    let mut limit = false;
    let mut attenuate = false;
    for reason in reasons {
        match reason.kind() {
            ReasonKind::Block => block = true,
            ReasonKind::Limit => limit = true,
            ReasonKind::Attenuate => attenuate = true,
        }
    }

    state.set_blocked(block.then_some(reported_index));
    state.set_limited(limit.then_some(reported_index));
    state.set_attenuated(attenuate.then_some(reported_index));

    tracing::debug!(
        ?reasons,
        index = %reported_index,
        block,
        limit,
        attenuate,
        "Gain event applied"
    );
}
