//! Focus request and response types: what a requester asks for, what the
//! engine answers synchronously, and what it notifies asynchronously.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::AudioContext;
use crate::types::{ClientId, ZoneId};

/// How long and how exclusively a requester intends to use the output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainRequestKind {
    /// Open-ended possession (e.g. music playback). Preempted holders are
    /// permanently evicted rather than parked as losers.
    Permanent,
    /// Short-lived possession; preempted holders wait to regain focus.
    Transient,
    /// Short-lived and exclusive: while held, notification-class requests
    /// are rejected outright.
    TransientExclusive,
    /// Short-lived, and concurrent holders may keep playing attenuated
    /// instead of losing focus.
    TransientMayDuck,
}

impl GainRequestKind {
    /// Whether a grant of this kind permanently displaces what it preempts.
    pub fn is_permanent(self) -> bool {
        matches!(self, GainRequestKind::Permanent)
    }
}

impl fmt::Display for GainRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GainRequestKind::Permanent => "permanent",
            GainRequestKind::Transient => "transient",
            GainRequestKind::TransientExclusive => "transient_exclusive",
            GainRequestKind::TransientMayDuck => "transient_may_duck",
        };
        f.write_str(name)
    }
}

/// A focus request as the engine sees it, after usage classification.
///
/// Invariant: a given client has at most one outstanding request at any
/// time. A repeat request from the same client either replaces the prior
/// one (same context, or the ring/call swap) or is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    /// Requester identity.
    pub client: ClientId,
    /// Arbitration scope this request targets.
    pub zone: ZoneId,
    /// Logical context resolved by the classifier.
    pub context: AudioContext,
    /// Possession kind (permanent/transient/exclusive/may-duck).
    pub kind: GainRequestKind,
    /// Whether the requester accepts a DELAYED answer instead of REJECTED.
    pub accepts_delay: bool,
    /// Whether the requester, as a holder, accepts being attenuated instead
    /// of losing focus when a concurrent request arrives.
    pub accepts_duck: bool,
}

impl FocusRequest {
    /// Convenience constructor for the common case: delay not accepted,
    /// ducking accepted.
    pub fn new(
        client: ClientId,
        zone: ZoneId,
        context: AudioContext,
        kind: GainRequestKind,
    ) -> Self {
        Self {
            client,
            zone,
            context,
            kind,
            accepts_delay: false,
            accepts_duck: true,
        }
    }

    /// Builder-style toggle for the delay-acceptable flag.
    pub fn with_delay_accepted(mut self, accepts: bool) -> Self {
        self.accepts_delay = accepts;
        self
    }

    /// Builder-style toggle for duck acceptance.
    pub fn with_duck_accepted(mut self, accepts: bool) -> Self {
        self.accepts_duck = accepts;
        self
    }
}

/// Synchronous answer to a focus request. These three are the only
/// outcomes; none is ever silently dropped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusDecision {
    /// The request now holds focus.
    Granted,
    /// The request was admitted and parked; it will be re-evaluated after
    /// every eviction or abandonment in its zone.
    Delayed,
    /// The request was refused. No state changed.
    Rejected,
}

impl fmt::Display for FocusDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FocusDecision::Granted => "granted",
            FocusDecision::Delayed => "delayed",
            FocusDecision::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Asynchronous focus change delivered to a requester via `FocusListener`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// The requester (re)gained focus: a promoted loser or a granted
    /// delayed request.
    Gain,
    /// The requester lost focus permanently: evicted, preempted by a
    /// permanent grant, or swept by a zone restriction.
    Loss,
    /// The requester was preempted but is parked as a loser and will
    /// regain focus once its blockers go away.
    LossTransient,
}

impl fmt::Display for FocusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FocusChange::Gain => "gain",
            FocusChange::Loss => "loss",
            FocusChange::LossTransient => "loss_transient",
        };
        f.write_str(name)
    }
}
