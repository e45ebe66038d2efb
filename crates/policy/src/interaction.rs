//! The interaction table: what happens when a new request meets an
//! existing holder or loser.
//!
//! The table is directional. A cell is looked up as
//! `(existing holder's context, new requester's context)` and the same
//! pair in the opposite order may hold a different value (navigation may
//! duck music, while music never ducks navigation).
//!
//! `evaluate` layers the two per-request flags on top of the raw cell:
//! a rejected requester that accepts delay is delayed instead, and a
//! concurrent grant over a holder that refuses duck signals escalates to
//! a transient loss for that holder.

use std::collections::HashMap;

use aa_common::AudioContext;

/// Raw table cell: the relation between a holding context and a
/// requesting context before request flags are considered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// The requester wins; the holder loses focus.
    Allow,
    /// Both play concurrently; the holder is a candidate for attenuation.
    AllowWithDuck,
    /// The requester is refused.
    Reject,
}

/// Per-entry outcome of `evaluate`, after request flags are applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InteractionDecision {
    /// Grant; this existing entry loses focus.
    Allow,
    /// Grant; this existing entry keeps focus and may be attenuated.
    AllowWithDuck,
    /// Grant; this existing entry takes a transient loss. Produced when a
    /// holder refuses the duck signal a concurrent grant would send it.
    AllowTransient,
    /// Refuse the request.
    Reject,
    /// Park the request for later re-evaluation.
    Delay,
}

/// Immutable (holder, requester) → interaction table.
///
/// Constructed once at startup and injected into the engine. The default
/// cell values are configuration; `with_cell` lets deployments and tests
/// override individual pairs.
#[derive(Clone, Debug)]
pub struct InteractionMatrix {
    cells: HashMap<(AudioContext, AudioContext), Interaction>,
}

impl Default for InteractionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionMatrix {
    /// Build the matrix with the stock cell values.
    pub fn new() -> Self {
        let mut cells = HashMap::new();
        for holder in AudioContext::ARBITRABLE {
            for requester in AudioContext::ARBITRABLE {
                cells.insert((holder, requester), default_cell(holder, requester));
            }
        }
        Self { cells }
    }

    /// Override a single cell. Builder-style, used by deployment config
    /// and by tests.
    pub fn with_cell(
        mut self,
        holder: AudioContext,
        requester: AudioContext,
        interaction: Interaction,
    ) -> Self {
        self.cells.insert((holder, requester), interaction);
        self
    }

    /// Raw cell lookup, before request flags.
    ///
    /// Pairs involving `Invalid` are not in the table; they answer
    /// `Reject` so a bad lookup can never grant focus.
    pub fn cell(&self, holder: AudioContext, requester: AudioContext) -> Interaction {
        match self.cells.get(&(holder, requester)) {
            Some(interaction) => *interaction,
            None => {
                tracing::error!(
                    holder = %holder,
                    requester = %requester,
                    "Interaction lookup outside the table; rejecting"
                );
                debug_assert!(
                    false,
                    "interaction lookup for ({holder}, {requester}) outside the table"
                );
                Interaction::Reject
            }
        }
    }

    /// Decide the fate of one (existing entry, new request) pair.
    ///
    /// `holder_accepts_duck` is the existing entry's willingness to keep
    /// playing attenuated; `requester_accepts_delay` is the new request's
    /// willingness to wait instead of being refused.
    pub fn evaluate(
        &self,
        holder: AudioContext,
        requester: AudioContext,
        holder_accepts_duck: bool,
        requester_accepts_delay: bool,
    ) -> InteractionDecision {
        match self.cell(holder, requester) {
            Interaction::Allow => InteractionDecision::Allow,
            Interaction::AllowWithDuck if holder_accepts_duck => {
                InteractionDecision::AllowWithDuck
            }
            // Duck escalates to a transient loss when the holder refuses
            // duck signals, whatever the new request's kind.
            Interaction::AllowWithDuck => InteractionDecision::AllowTransient,
            Interaction::Reject if requester_accepts_delay => InteractionDecision::Delay,
            Interaction::Reject => InteractionDecision::Reject,
        }
    }
}

/// Stock cell values, one row per holding context.
///
/// These values are deployment configuration. The shape to preserve when
/// editing: critical holders (emergency/safety) are never assigned
/// `Allow` for a non-critical requester, because `Allow` demotes the
/// holder and critical contexts must not be preempted.
fn default_cell(holder: AudioContext, requester: AudioContext) -> Interaction {
    use AudioContext::*;
    use Interaction::*;

    match holder {
        Music => match requester {
            Navigation | Notification | SystemSound | Safety | VehicleStatus => AllowWithDuck,
            _ => Allow,
        },
        Navigation => match requester {
            Navigation | VoiceCommand | Emergency => Allow,
            _ => AllowWithDuck,
        },
        VoiceCommand => match requester {
            VoiceCommand | CallRing | Call | Emergency => Allow,
            Navigation | Safety | VehicleStatus => AllowWithDuck,
            _ => Reject,
        },
        CallRing => match requester {
            CallRing | Call | Emergency => Allow,
            Navigation | SystemSound | Safety | VehicleStatus => AllowWithDuck,
            _ => Reject,
        },
        Call => match requester {
            Call => Allow,
            Navigation | CallRing | Alarm | Notification | SystemSound | Emergency | Safety
            | VehicleStatus => AllowWithDuck,
            _ => Reject,
        },
        Alarm => match requester {
            VoiceCommand | CallRing | Call | Alarm | Emergency => Allow,
            Navigation | Notification | SystemSound | Safety | VehicleStatus => AllowWithDuck,
            _ => Reject,
        },
        Notification => match requester {
            Music | VoiceCommand | CallRing | Call | Alarm | Emergency | Announcement => Allow,
            _ => AllowWithDuck,
        },
        SystemSound => match requester {
            Music | VoiceCommand | CallRing | Call | Alarm | Emergency | Announcement => Allow,
            _ => AllowWithDuck,
        },
        Emergency => match requester {
            Emergency | Safety | Call => AllowWithDuck,
            _ => Reject,
        },
        Safety => match requester {
            Emergency => Allow,
            Navigation | VoiceCommand | CallRing | Call | Safety | VehicleStatus => AllowWithDuck,
            _ => Reject,
        },
        VehicleStatus => match requester {
            Emergency => Allow,
            _ => AllowWithDuck,
        },
        Announcement => match requester {
            Music | VoiceCommand | CallRing | Call | Alarm | Emergency | Safety | Announcement => {
                Allow
            }
            _ => AllowWithDuck,
        },
        // Invalid never holds focus; rows for it are not generated.
        Invalid => Reject,
    }
}
