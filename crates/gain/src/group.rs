//! The per-group gain override state machine.

use aa_common::GainIndex;

/// Layered gain state for one volume group.
///
/// The base `requested` index is what the user last asked for. On top of
/// it sit four independently-settable overlays. `effective_index`
/// resolves them with a fixed precedence, evaluated top to bottom, first
/// match wins:
///
/// 1. muted → min
/// 2. blocked → blocked value
/// 3. attenuated → attenuated value
/// 4. requested > limit → limit value
/// 5. otherwise → requested
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GainOverrideState {
    min: GainIndex,
    max: GainIndex,
    requested: GainIndex,
    muted: bool,
    blocked: Option<GainIndex>,
    limited: Option<GainIndex>,
    attenuated: Option<GainIndex>,
}

impl GainOverrideState {
    /// Create the state for one group.
    ///
    /// `initial` is the persisted user index; it is clamped into
    /// `[min, max]`. If `min > max` the range is repaired to `min..=min`
    /// and an error is logged (invariant violation in configuration).
    pub fn new(min: GainIndex, max: GainIndex, initial: GainIndex) -> Self {
        let max = if min > max {
            tracing::error!(%min, %max, "Gain range inverted; clamping max to min");
            debug_assert!(min <= max, "gain range inverted");
            min
        } else {
            max
        };
        Self {
            min,
            max,
            requested: initial.clamp(min, max),
            muted: false,
            blocked: None,
            limited: None,
            attenuated: None,
        }
    }

    /// Set the user-requested index, clamped to `[min, max]`.
    ///
    /// The index is always remembered, but while the group is blocked the
    /// change is structurally a no-op: the blocked value keeps winning and
    /// the mute/attenuation side effects are skipped (the output device
    /// itself refuses the change).
    ///
    /// Otherwise an explicit volume action clears mute and clears any
    /// externally-applied attenuation.
    pub fn set_requested(&mut self, index: GainIndex) {
        // User volume calls clamp as normal behavior; only overlay values
        // arriving out of range are engine bugs.
        let clamped = index.clamp(self.min, self.max);
        self.requested = clamped;
        if self.blocked.is_some() {
            tracing::debug!(index = %clamped, "Requested index remembered while blocked");
            return;
        }
        if self.muted {
            self.muted = false;
            tracing::debug!("Explicit volume change cleared mute");
        }
        if self.attenuated.take().is_some() {
            tracing::debug!("Explicit volume change cleared attenuation");
        }
        tracing::debug!(index = %clamped, "Requested index set");
    }

    /// Mute or unmute the group.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            tracing::debug!(muted, "Mute changed");
        }
    }

    /// Set or clear the blocked overlay (the device refuses gain changes
    /// while set).
    pub fn set_blocked(&mut self, index: Option<GainIndex>) {
        self.blocked = index.map(|i| self.check_range("blocked", i));
        tracing::debug!(blocked = ?self.blocked, "Blocked overlay changed");
    }

    /// Set or clear the limit overlay. Absent means no limit (max).
    pub fn set_limited(&mut self, index: Option<GainIndex>) {
        self.limited = index.map(|i| self.check_range("limited", i));
        tracing::debug!(limited = ?self.limited, "Limit overlay changed");
    }

    /// Set or clear the attenuation (duck) overlay.
    pub fn set_attenuated(&mut self, index: Option<GainIndex>) {
        self.attenuated = index.map(|i| self.check_range("attenuated", i));
        tracing::debug!(attenuated = ?self.attenuated, "Attenuation overlay changed");
    }

    /// Resolve the override chain to the one index the hardware should
    /// apply.
    pub fn effective_index(&self) -> GainIndex {
        if self.muted {
            return self.min;
        }
        if let Some(blocked) = self.blocked {
            return blocked;
        }
        if let Some(attenuated) = self.attenuated {
            return attenuated;
        }
        if let Some(limit) = self.limited {
            if self.requested > limit {
                return limit;
            }
        }
        self.requested
    }

    /// The last user-requested index (remembered even while blocked).
    pub fn requested_index(&self) -> GainIndex {
        self.requested
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    pub fn is_attenuated(&self) -> bool {
        self.attenuated.is_some()
    }

    pub fn is_limited(&self) -> bool {
        self.limited.is_some()
    }

    pub fn min_index(&self) -> GainIndex {
        self.min
    }

    pub fn max_index(&self) -> GainIndex {
        self.max
    }

    /// An index outside `[min, max]` reaching this state is an engine bug:
    /// assert in debug builds, log and clamp in release.
    fn check_range(&self, field: &'static str, index: GainIndex) -> GainIndex {
        if index.in_range(self.min, self.max) {
            return index;
        }
        tracing::error!(
            field,
            index = %index,
            min = %self.min,
            max = %self.max,
            "Gain index out of range; clamping"
        );
        debug_assert!(false, "{field} gain index {index} outside [{}, {}]", self.min, self.max);
        index.clamp(self.min, self.max)
    }
}
