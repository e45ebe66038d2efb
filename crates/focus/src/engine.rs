//! The focus arbitration engine: per-zone holders, losers, the delayed
//! slot, and the blocked-by graph.
//!
//! # Locking discipline
//!
//! Each zone has one `parking_lot::Mutex` guarding all of its arbitration
//! state; zones arbitrate independently. Every transition (evictions,
//! demotions, promotions, delayed re-admission) is computed eagerly and
//! completely under the zone lock, while GAIN/LOSS notifications are only
//! *collected* there. Dispatch to the `FocusListener` happens strictly
//! after the lock is released, so a listener may re-enter the engine
//! (e.g. re-request focus right after a loss) without deadlocking.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use aa_common::{
    ArbiterError, AudioContext, ClientId, FocusChange, FocusDecision, FocusListener, FocusRequest,
    GainRequestKind, ZoneId,
};
use aa_policy::{InteractionDecision, InteractionMatrix};

use crate::entry::{EntryId, FocusEntry};

/// Notifications collected under the lock, dispatched after it.
type Notifications = Vec<(ClientId, FocusChange)>;

/// How an entry displaced by a winning request loses focus.
///
/// This governs entries the interaction table hands over with `Allow`.
/// A holder displaced because it refused a duck signal always takes a
/// transient loss, independent of this policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossPolicy {
    /// The new request's kind decides: a permanent grant evicts what it
    /// beats, a transient grant parks it as a loser.
    #[default]
    FollowRequestKind,
    /// Displaced entries always park as losers and return when their
    /// blockers go away, whatever the new request's kind.
    AlwaysPark,
}

/// All arbitration state of one zone.
struct ZoneState {
    zone: ZoneId,
    entries: HashMap<EntryId, FocusEntry>,
    holders: BTreeSet<EntryId>,
    losers: BTreeSet<EntryId>,
    delayed: Option<FocusRequest>,
    restricted: bool,
}

impl ZoneState {
    fn new(zone: ZoneId) -> Self {
        Self {
            zone,
            entries: HashMap::new(),
            holders: BTreeSet::new(),
            losers: BTreeSet::new(),
            delayed: None,
            restricted: false,
        }
    }

    fn entry_for_client(&self, client: &ClientId) -> Option<EntryId> {
        self.entries
            .values()
            .find(|e| e.client() == client)
            .map(|e| e.id)
    }
}

/// Everything `evaluate` derives from one incoming request, before any
/// state is touched. Committing is a separate step so a rejection leaves
/// no trace.
struct Evaluation {
    decision: FocusDecision,
    /// Same-client entry being replaced (same context or ring/call swap).
    replaced: Option<EntryId>,
    /// Entries the new request wins over; the loss policy decides whether
    /// they are evicted or parked.
    beaten: Vec<EntryId>,
    /// Entries that take a transient loss regardless of the loss policy
    /// (a holder that refused the duck signal).
    demoted: Vec<EntryId>,
    /// Holders that keep focus concurrently and become duck candidates.
    ducked: Vec<EntryId>,
}

impl Evaluation {
    fn rejected() -> Self {
        Self {
            decision: FocusDecision::Rejected,
            replaced: None,
            beaten: Vec::new(),
            demoted: Vec::new(),
            ducked: Vec::new(),
        }
    }
}

/// Arbitrates exclusive/shared use of the audio output per zone.
pub struct FocusArbitrationEngine {
    matrix: InteractionMatrix,
    loss_policy: LossPolicy,
    zones: HashMap<ZoneId, Mutex<ZoneState>>,
    listener: Arc<dyn FocusListener>,
    next_entry_id: AtomicU64,
}

impl FocusArbitrationEngine {
    /// Create an engine arbitrating the given zones with the given
    /// interaction table and loss policy.
    pub fn new(
        zones: &[ZoneId],
        matrix: InteractionMatrix,
        loss_policy: LossPolicy,
        listener: Arc<dyn FocusListener>,
    ) -> Self {
        let zones = zones
            .iter()
            .map(|z| (*z, Mutex::new(ZoneState::new(*z))))
            .collect();
        Self {
            matrix,
            loss_policy,
            zones,
            listener,
            next_entry_id: AtomicU64::new(1),
        }
    }

    /// Evaluate one focus request. Returns one of the three synchronous
    /// outcomes; GAIN/LOSS side effects for third parties are dispatched
    /// to the listener before this returns.
    pub fn request_focus(&self, request: FocusRequest) -> Result<FocusDecision, ArbiterError> {
        if !request.context.is_arbitrable() {
            tracing::debug!(client = %request.client, "Request with invalid context rejected");
            return Ok(FocusDecision::Rejected);
        }
        let zone = self.zone(request.zone)?;
        let mut notes = Notifications::new();
        let decision = {
            let mut state = zone.lock();
            let decision = self.admit(&mut state, request, &mut notes);
            self.check_consistency(&state);
            decision
        };
        self.dispatch(notes);
        Ok(decision)
    }

    /// Abandon whatever the client holds, waits on, or has parked in the
    /// delayed slot. Unknown clients are a no-op: double release from
    /// racing abandon/loss paths is expected. Returns whether the client
    /// had anything to release in this zone.
    pub fn release_focus(&self, zone: ZoneId, client: &ClientId) -> Result<bool, ArbiterError> {
        let zone_state = self.zone(zone)?;
        let mut notes = Notifications::new();
        let found = {
            let mut state = zone_state.lock();
            let found = if let Some(id) = state.entry_for_client(client) {
                tracing::debug!(zone = %state.zone, client = %client, "Focus released");
                self.evict(&mut state, id, None, &mut notes);
                self.cascade_unblock(&mut state, &mut notes);
                self.readmit_delayed(&mut state, &mut notes);
                true
            } else if state
                .delayed
                .as_ref()
                .is_some_and(|d| &d.client == client)
            {
                tracing::debug!(zone = %state.zone, client = %client, "Delayed request abandoned");
                state.delayed = None;
                true
            } else {
                tracing::debug!(zone = %state.zone, client = %client, "Release for unknown client ignored");
                false
            };
            self.check_consistency(&state);
            found
        };
        self.dispatch(notes);
        Ok(found)
    }

    /// Set or clear the zone-wide restriction. Setting it evicts every
    /// non-critical holder, loser, and delayed request with a LOSS;
    /// clearing it re-grants nothing (callers must re-request).
    pub fn set_restricted(&self, zone: ZoneId, restricted: bool) -> Result<(), ArbiterError> {
        let zone_state = self.zone(zone)?;
        let mut notes = Notifications::new();
        {
            let mut state = zone_state.lock();
            state.restricted = restricted;
            tracing::debug!(zone = %state.zone, restricted, "Restriction changed");
            if restricted {
                let evictees: Vec<EntryId> = state
                    .entries
                    .values()
                    .filter(|e| !e.request.context.is_critical())
                    .map(|e| e.id)
                    .collect();
                for id in evictees {
                    self.evict(&mut state, id, Some(FocusChange::Loss), &mut notes);
                }
                if state
                    .delayed
                    .as_ref()
                    .is_some_and(|d| !d.context.is_critical())
                {
                    if let Some(delayed) = state.delayed.take() {
                        notes.push((delayed.client, FocusChange::Loss));
                    }
                }
                self.cascade_unblock(&mut state, &mut notes);
                self.readmit_delayed(&mut state, &mut notes);
            }
            self.check_consistency(&state);
        }
        self.dispatch(notes);
        Ok(())
    }

    /// Read-only snapshot of the zone's holders, in arrival order.
    pub fn current_holders(&self, zone: ZoneId) -> Result<Vec<FocusRequest>, ArbiterError> {
        let state = self.zone(zone)?.lock();
        Ok(state
            .holders
            .iter()
            .filter_map(|id| state.entries.get(id))
            .map(|e| e.request.clone())
            .collect())
    }

    /// Read-only snapshot of the zone's losers, in arrival order.
    pub fn current_losers(&self, zone: ZoneId) -> Result<Vec<FocusRequest>, ArbiterError> {
        let state = self.zone(zone)?.lock();
        Ok(state
            .losers
            .iter()
            .filter_map(|id| state.entries.get(id))
            .map(|e| e.request.clone())
            .collect())
    }

    /// Holder snapshots with their current ducked flag.
    pub fn holder_states(&self, zone: ZoneId) -> Result<Vec<(FocusRequest, bool)>, ArbiterError> {
        let state = self.zone(zone)?.lock();
        Ok(state
            .holders
            .iter()
            .filter_map(|id| state.entries.get(id))
            .map(|e| (e.request.clone(), e.ducked))
            .collect())
    }

    /// The zone's delayed request, if any.
    pub fn delayed_request(&self, zone: ZoneId) -> Result<Option<FocusRequest>, ArbiterError> {
        Ok(self.zone(zone)?.lock().delayed.clone())
    }

    /// Record which holder contexts the ducking resolver currently has
    /// attenuated. Holders outside the set have their flag cleared.
    pub fn mark_ducked(
        &self,
        zone: ZoneId,
        contexts: &BTreeSet<AudioContext>,
    ) -> Result<(), ArbiterError> {
        let mut state = self.zone(zone)?.lock();
        let holders: Vec<EntryId> = state.holders.iter().copied().collect();
        for id in holders {
            if let Some(entry) = state.entries.get_mut(&id) {
                entry.ducked = contexts.contains(&entry.request.context);
            }
        }
        Ok(())
    }

    /// The zones this engine arbitrates, in stable order.
    pub fn zone_ids(&self) -> Vec<ZoneId> {
        let mut ids: Vec<ZoneId> = self.zones.keys().copied().collect();
        ids.sort();
        ids
    }

    fn zone(&self, zone: ZoneId) -> Result<&Mutex<ZoneState>, ArbiterError> {
        self.zones.get(&zone).ok_or(ArbiterError::UnknownZone(zone))
    }

    /// Full admission path: evaluate, then commit per decision.
    fn admit(
        &self,
        state: &mut ZoneState,
        request: FocusRequest,
        notes: &mut Notifications,
    ) -> FocusDecision {
        let eval = self.evaluate(state, &request);
        match eval.decision {
            FocusDecision::Rejected => {
                tracing::debug!(
                    zone = %state.zone,
                    client = %request.client,
                    context = %request.context,
                    "Focus rejected"
                );
            }
            FocusDecision::Delayed => self.commit_delay(state, request, &eval, notes),
            FocusDecision::Granted => {
                self.commit_grant(state, request, &eval, notes);
            }
        }
        eval.decision
    }

    /// Pure evaluation of one request against the zone. No mutation: a
    /// rejection must leave no trace.
    fn evaluate(&self, state: &ZoneState, request: &FocusRequest) -> Evaluation {
        // Critical requesters bypass the restriction gate.
        if state.restricted && !request.context.is_critical() {
            tracing::debug!(zone = %state.zone, client = %request.client, "Rejected by restriction gate");
            return Evaluation::rejected();
        }

        // Same-client rules: same context (or the ring/call swap) replaces
        // the outstanding entry; a different context is rejected outright,
        // never delegated to the table.
        let mut replaced = None;
        if let Some(id) = state.entry_for_client(&request.client) {
            let existing = &state.entries[&id].request;
            if existing.context == request.context
                || existing.context.is_ring_call_pair(request.context)
            {
                replaced = Some(id);
            } else {
                tracing::debug!(
                    zone = %state.zone,
                    client = %request.client,
                    held = %existing.context,
                    requested = %request.context,
                    "Conflicting same-client request rejected"
                );
                return Evaluation::rejected();
            }
        }
        if let Some(delayed) = &state.delayed {
            if delayed.client == request.client
                && delayed.context != request.context
                && !delayed.context.is_ring_call_pair(request.context)
            {
                return Evaluation::rejected();
            }
        }

        // A notification never interrupts an exclusive transient holder.
        if request.context == AudioContext::Notification {
            let exclusive_held = state
                .holders
                .iter()
                .filter(|id| Some(**id) != replaced)
                .filter_map(|id| state.entries.get(id))
                .any(|e| e.request.kind == GainRequestKind::TransientExclusive);
            if exclusive_held {
                tracing::debug!(zone = %state.zone, client = %request.client, "Notification rejected by exclusive holder");
                return Evaluation::rejected();
            }
        }

        // Consult the table once per existing holder and loser.
        let mut beaten = Vec::new();
        let mut demoted = Vec::new();
        let mut ducked = Vec::new();
        let mut any_reject = false;
        let mut any_delay = false;
        for id in state.holders.iter().chain(state.losers.iter()) {
            if Some(*id) == replaced {
                continue;
            }
            let Some(entry) = state.entries.get(id) else {
                continue;
            };
            let is_holder = state.holders.contains(id);
            let decision = self.matrix.evaluate(
                entry.request.context,
                request.context,
                entry.request.accepts_duck,
                request.accepts_delay,
            );
            match decision {
                InteractionDecision::Allow => beaten.push(*id),
                InteractionDecision::AllowTransient => demoted.push(*id),
                InteractionDecision::AllowWithDuck => {
                    // A loser is not playing; there is nothing to duck and
                    // no reason to block it further.
                    if is_holder {
                        ducked.push(*id);
                    }
                }
                InteractionDecision::Reject => any_reject = true,
                InteractionDecision::Delay => any_delay = true,
            }
        }

        let decision = if any_reject {
            FocusDecision::Rejected
        } else if any_delay {
            FocusDecision::Delayed
        } else {
            FocusDecision::Granted
        };
        Evaluation {
            decision,
            replaced,
            beaten,
            demoted,
            ducked,
        }
    }

    /// Install a granted request as a holder and apply every consequence.
    fn commit_grant(
        &self,
        state: &mut ZoneState,
        request: FocusRequest,
        eval: &Evaluation,
        notes: &mut Notifications,
    ) {
        // A grant supersedes the client's own parked delayed request.
        if state
            .delayed
            .as_ref()
            .is_some_and(|d| d.client == request.client)
        {
            state.delayed = None;
        }

        let evict_beaten = match self.loss_policy {
            LossPolicy::FollowRequestKind => request.kind.is_permanent(),
            LossPolicy::AlwaysPark => false,
        };
        let new_id = EntryId(self.next_entry_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            zone = %state.zone,
            client = %request.client,
            context = %request.context,
            kind = %request.kind,
            id = %new_id,
            "Focus granted"
        );
        let entry = FocusEntry::new(new_id, request);
        state.entries.insert(new_id, entry);
        state.holders.insert(new_id);

        let mut evicted_any = false;

        // Beaten entries: the loss policy decides whether the grant
        // displaces them for good or parks them behind the new holder.
        for id in &eval.beaten {
            if evict_beaten {
                self.evict(state, *id, Some(FocusChange::Loss), notes);
                evicted_any = true;
            } else {
                self.park(state, *id, new_id, notes);
            }
        }

        // A holder that refused the duck signal takes a transient loss,
        // whatever the loss policy and the new request's kind.
        for id in &eval.demoted {
            self.park(state, *id, new_id, notes);
        }

        // Concurrent holders flagged as duck candidates; the resolver
        // decides which outputs are actually attenuated.
        for id in &eval.ducked {
            if let Some(entry) = state.entries.get_mut(id) {
                entry.ducked = true;
            }
        }

        // The replaced same-client entry goes away silently: from the
        // requester's point of view this is one logical entry, so no LOSS
        // is delivered. Evicting it last keeps it out of its own way.
        if let Some(id) = eval.replaced {
            self.evict(state, id, None, notes);
            evicted_any = true;
        }

        self.cascade_unblock(state, notes);
        if evicted_any {
            self.readmit_delayed(state, notes);
        }
    }

    /// Park a delayed request in the zone's single slot.
    fn commit_delay(
        &self,
        state: &mut ZoneState,
        request: FocusRequest,
        eval: &Evaluation,
        notes: &mut Notifications,
    ) {
        if let Some(prev) = state.delayed.take() {
            // Single-slot invariant: a displaced delayed request from a
            // different client is a loss for that client.
            if prev.client != request.client {
                notes.push((prev.client, FocusChange::Loss));
            }
        }
        tracing::debug!(
            zone = %state.zone,
            client = %request.client,
            context = %request.context,
            "Focus delayed"
        );
        let mut evicted_any = false;
        if let Some(id) = eval.replaced {
            // The client gave up its live entry for a request that can
            // only wait; the entry is replaced, not lost.
            self.evict(state, id, None, notes);
            evicted_any = true;
        }
        state.delayed = Some(request);
        self.cascade_unblock(state, notes);
        if evicted_any {
            self.readmit_delayed(state, notes);
        }
    }

    /// Park one displaced entry behind `blocker`: a holder is demoted to
    /// a loser with a LOSS_TRANSIENT, a loser just gains the edge.
    fn park(
        &self,
        state: &mut ZoneState,
        id: EntryId,
        blocker: EntryId,
        notes: &mut Notifications,
    ) {
        let was_holder = state.holders.remove(&id);
        if was_holder {
            state.losers.insert(id);
        }
        if let Some(entry) = state.entries.get_mut(&id) {
            entry.blocked_by.insert(blocker);
            if was_holder {
                entry.ducked = false;
                notes.push((entry.client().clone(), FocusChange::LossTransient));
                tracing::debug!(zone = %state.zone, id = %id, "Holder demoted to loser");
            }
        }
    }

    /// Remove one entry from the zone and unlink it from every remaining
    /// blocked-by set. Promotions are the caller's job (cascade).
    fn evict(
        &self,
        state: &mut ZoneState,
        id: EntryId,
        note: Option<FocusChange>,
        notes: &mut Notifications,
    ) {
        let Some(entry) = state.entries.remove(&id) else {
            debug_assert!(false, "evicting unknown entry {id}");
            return;
        };
        state.holders.remove(&id);
        state.losers.remove(&id);
        for other in state.entries.values_mut() {
            other.blocked_by.remove(&id);
        }
        if let Some(change) = note {
            notes.push((entry.client().clone(), change));
        }
        tracing::debug!(zone = %state.zone, id = %id, client = %entry.client(), "Entry evicted");
    }

    /// Promote every loser whose blocked-by set has drained, repeatedly
    /// until stable. Promotion never preempts other holders, so this
    /// terminates after at most one pass per loser.
    fn cascade_unblock(&self, state: &mut ZoneState, notes: &mut Notifications) {
        loop {
            let unblocked = state.losers.iter().copied().find(|id| {
                state
                    .entries
                    .get(id)
                    .is_some_and(|e| e.blocked_by.is_empty())
            });
            let Some(id) = unblocked else {
                break;
            };
            state.losers.remove(&id);
            state.holders.insert(id);
            if let Some(entry) = state.entries.get(&id) {
                notes.push((entry.client().clone(), FocusChange::Gain));
                tracing::debug!(zone = %state.zone, id = %id, client = %entry.client(), "Loser promoted to holder");
            }
        }
    }

    /// Re-run the full admission for the delayed slot. Triggered after
    /// every eviction or abandonment, not by any timer.
    fn readmit_delayed(&self, state: &mut ZoneState, notes: &mut Notifications) {
        let Some(request) = state.delayed.take() else {
            return;
        };
        let client = request.client.clone();
        let eval = self.evaluate(state, &request);
        match eval.decision {
            FocusDecision::Granted => {
                self.commit_grant(state, request, &eval, notes);
                notes.push((client, FocusChange::Gain));
            }
            FocusDecision::Rejected => {
                // Conditions changed against the waiter; it is discarded,
                // never silently dropped.
                tracing::debug!(zone = %state.zone, client = %client, "Delayed request rejected on re-admission");
                notes.push((client, FocusChange::Loss));
            }
            FocusDecision::Delayed => {
                state.delayed = Some(request);
            }
        }
    }

    /// Dispatch collected notifications outside the zone lock. A failing
    /// or re-entrant listener cannot corrupt arbitration state.
    fn dispatch(&self, notes: Notifications) {
        for (client, change) in notes {
            tracing::debug!(client = %client, change = %change, "Dispatching focus change");
            self.listener.on_focus_change(&client, change);
        }
    }

    /// Structural invariants. Violations are engine bugs: assert in debug
    /// builds, log loudly in release.
    fn check_consistency(&self, state: &ZoneState) {
        let overlap: Vec<&EntryId> = state.holders.intersection(&state.losers).collect();
        if !overlap.is_empty() {
            tracing::error!(zone = %state.zone, ?overlap, "Entry in both holders and losers");
            debug_assert!(overlap.is_empty(), "entry owned by both collections");
        }
        let tracked = state.holders.len() + state.losers.len();
        if tracked != state.entries.len() {
            tracing::error!(
                zone = %state.zone,
                tracked,
                stored = state.entries.len(),
                "Entry storage out of sync with membership sets"
            );
            debug_assert_eq!(tracked, state.entries.len());
        }
        for id in &state.losers {
            if let Some(entry) = state.entries.get(id) {
                if entry.blocked_by.is_empty() {
                    tracing::error!(zone = %state.zone, id = %id, "Loser with empty blocked-by set");
                    debug_assert!(!entry.blocked_by.is_empty(), "loser {id} has no blockers");
                }
                for blocker in &entry.blocked_by {
                    if !state.entries.contains_key(blocker) {
                        tracing::error!(zone = %state.zone, id = %id, blocker = %blocker, "Dangling blocked-by edge");
                        debug_assert!(false, "dangling blocked-by edge {blocker}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aa_common::NullFocusListener;
    use aa_policy::Interaction;

    fn engine() -> FocusArbitrationEngine {
        engine_with_policy(LossPolicy::FollowRequestKind)
    }

    fn engine_with_policy(loss_policy: LossPolicy) -> FocusArbitrationEngine {
        FocusArbitrationEngine::new(
            &[ZoneId::PRIMARY, ZoneId(1)],
            InteractionMatrix::new(),
            loss_policy,
            Arc::new(NullFocusListener),
        )
    }

    fn request(client: &str, context: AudioContext, kind: GainRequestKind) -> FocusRequest {
        FocusRequest::new(ClientId::new(client), ZoneId::PRIMARY, context, kind)
    }

    #[test]
    fn invalid_context_is_rejected() {
        let engine = engine();
        let decision = engine
            .request_focus(request("x", AudioContext::Invalid, GainRequestKind::Permanent))
            .unwrap();
        assert_eq!(decision, FocusDecision::Rejected);
        assert!(engine.current_holders(ZoneId::PRIMARY).unwrap().is_empty());
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let engine = engine();
        let mut req = request("x", AudioContext::Music, GainRequestKind::Permanent);
        req.zone = ZoneId(9);
        assert!(matches!(
            engine.request_focus(req),
            Err(ArbiterError::UnknownZone(ZoneId(9)))
        ));
    }

    #[test]
    fn zones_are_independent() {
        let engine = engine();
        engine
            .request_focus(request("music", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();

        let mut other = request("call", AudioContext::Call, GainRequestKind::Transient);
        other.zone = ZoneId(1);
        engine.request_focus(other).unwrap();

        assert_eq!(engine.current_holders(ZoneId::PRIMARY).unwrap().len(), 1);
        assert_eq!(engine.current_holders(ZoneId(1)).unwrap().len(), 1);
        assert!(engine.current_losers(ZoneId::PRIMARY).unwrap().is_empty());
    }

    #[test]
    fn notification_rejected_while_exclusive_holder_present() {
        let engine = engine();
        engine
            .request_focus(request(
                "assistant",
                AudioContext::VoiceCommand,
                GainRequestKind::TransientExclusive,
            ))
            .unwrap();
        let decision = engine
            .request_focus(request(
                "mail",
                AudioContext::Notification,
                GainRequestKind::Transient,
            ))
            .unwrap();
        assert_eq!(decision, FocusDecision::Rejected);
    }

    #[test]
    fn same_client_same_context_replaces() {
        let engine = engine();
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        let decision = engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Transient))
            .unwrap();
        assert_eq!(decision, FocusDecision::Granted);

        let holders = engine.current_holders(ZoneId::PRIMARY).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].kind, GainRequestKind::Transient);
    }

    #[test]
    fn same_client_different_context_rejects() {
        let engine = engine();
        engine
            .request_focus(request("app", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        let decision = engine
            .request_focus(request("app", AudioContext::Navigation, GainRequestKind::Transient))
            .unwrap();
        assert_eq!(decision, FocusDecision::Rejected);

        let holders = engine.current_holders(ZoneId::PRIMARY).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].context, AudioContext::Music);
    }

    #[test]
    fn ring_to_call_swap_is_a_replace() {
        let engine = engine();
        engine
            .request_focus(request("phone", AudioContext::CallRing, GainRequestKind::Transient))
            .unwrap();
        let decision = engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Transient))
            .unwrap();
        assert_eq!(decision, FocusDecision::Granted);

        let holders = engine.current_holders(ZoneId::PRIMARY).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].context, AudioContext::Call);
    }

    #[test]
    fn release_of_unknown_client_is_a_noop() {
        let engine = engine();
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("ghost"))
            .unwrap();
        // Double release must not corrupt anything either.
        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("radio"))
            .unwrap();
        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("radio"))
            .unwrap();
        assert!(engine.current_holders(ZoneId::PRIMARY).unwrap().is_empty());
    }

    #[test]
    fn restriction_gate_rejects_non_critical_requests() {
        let engine = engine();
        engine.set_restricted(ZoneId::PRIMARY, true).unwrap();
        assert_eq!(
            engine
                .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
                .unwrap(),
            FocusDecision::Rejected
        );
        assert_eq!(
            engine
                .request_focus(request("adas", AudioContext::Safety, GainRequestKind::Transient))
                .unwrap(),
            FocusDecision::Granted
        );
    }

    #[test]
    fn clearing_restriction_regrants_nothing() {
        let engine = engine();
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine.set_restricted(ZoneId::PRIMARY, true).unwrap();
        assert!(engine.current_holders(ZoneId::PRIMARY).unwrap().is_empty());

        engine.set_restricted(ZoneId::PRIMARY, false).unwrap();
        assert!(engine.current_holders(ZoneId::PRIMARY).unwrap().is_empty());
    }

    #[test]
    fn permanent_grant_evicts_transient_grant_demotes() {
        let engine = engine();
        // Transient call over music: music parks as a loser.
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Transient))
            .unwrap();
        assert_eq!(engine.current_losers(ZoneId::PRIMARY).unwrap().len(), 1);

        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("phone"))
            .unwrap();
        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("radio"))
            .unwrap();

        // Permanent call over music: music is gone for good.
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Permanent))
            .unwrap();
        assert!(engine.current_losers(ZoneId::PRIMARY).unwrap().is_empty());
        assert_eq!(engine.current_holders(ZoneId::PRIMARY).unwrap().len(), 1);
    }

    #[test]
    fn park_policy_demotes_even_on_permanent_grant() {
        let engine = engine_with_policy(LossPolicy::AlwaysPark);
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Permanent))
            .unwrap();

        // The permanent call parks music instead of evicting it.
        let losers = engine.current_losers(ZoneId::PRIMARY).unwrap();
        assert_eq!(losers.len(), 1);
        assert_eq!(losers[0].context, AudioContext::Music);

        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("phone"))
            .unwrap();
        let holders = engine.current_holders(ZoneId::PRIMARY).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].context, AudioContext::Music);
    }

    #[test]
    fn duck_refusal_is_transient_even_on_permanent_grant() {
        let engine = engine();
        let music = request("radio", AudioContext::Music, GainRequestKind::Permanent)
            .with_duck_accepted(false);
        engine.request_focus(music).unwrap();
        engine
            .request_focus(request(
                "nav",
                AudioContext::Navigation,
                GainRequestKind::Permanent,
            ))
            .unwrap();

        // Music was displaced by a refused duck, not an Allow cell, so
        // the permanent kind must not turn this into an eviction.
        let losers = engine.current_losers(ZoneId::PRIMARY).unwrap();
        assert_eq!(losers.len(), 1);
        assert_eq!(losers[0].context, AudioContext::Music);

        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("nav"))
            .unwrap();
        assert_eq!(
            engine.current_holders(ZoneId::PRIMARY).unwrap()[0].context,
            AudioContext::Music
        );
    }

    #[test]
    fn delayed_ring_is_superseded_by_call_from_same_client() {
        // The stock table rejects a ringtone under an emergency holder;
        // the override makes the active call wait too so the swap happens
        // entirely inside the delayed slot.
        let matrix = InteractionMatrix::new().with_cell(
            AudioContext::Emergency,
            AudioContext::Call,
            Interaction::Reject,
        );
        let engine = FocusArbitrationEngine::new(
            &[ZoneId::PRIMARY],
            matrix,
            LossPolicy::FollowRequestKind,
            Arc::new(NullFocusListener),
        );
        engine
            .request_focus(request("ecall", AudioContext::Emergency, GainRequestKind::Transient))
            .unwrap();

        let ring = request("phone", AudioContext::CallRing, GainRequestKind::Transient)
            .with_delay_accepted(true);
        assert_eq!(engine.request_focus(ring).unwrap(), FocusDecision::Delayed);

        let call = request("phone", AudioContext::Call, GainRequestKind::Transient)
            .with_delay_accepted(true);
        assert_eq!(engine.request_focus(call).unwrap(), FocusDecision::Delayed);

        let delayed = engine.delayed_request(ZoneId::PRIMARY).unwrap().unwrap();
        assert_eq!(delayed.client, ClientId::new("phone"));
        assert_eq!(delayed.context, AudioContext::Call);

        // A different context from the same client is still refused.
        let music = request("phone", AudioContext::Music, GainRequestKind::Transient)
            .with_delay_accepted(true);
        assert_eq!(engine.request_focus(music).unwrap(), FocusDecision::Rejected);
    }

    #[test]
    fn delayed_slot_holds_one_request() {
        let engine = engine();
        engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Transient))
            .unwrap();

        let first = request("radio", AudioContext::Music, GainRequestKind::Permanent)
            .with_delay_accepted(true);
        assert_eq!(engine.request_focus(first).unwrap(), FocusDecision::Delayed);

        let second = request("podcast", AudioContext::Music, GainRequestKind::Permanent)
            .with_delay_accepted(true);
        assert_eq!(engine.request_focus(second).unwrap(), FocusDecision::Delayed);

        let delayed = engine.delayed_request(ZoneId::PRIMARY).unwrap().unwrap();
        assert_eq!(delayed.client, ClientId::new("podcast"));
    }

    #[test]
    fn duck_flags_track_grants_and_resolver_updates() {
        let engine = engine();
        engine
            .request_focus(request("radio", AudioContext::Music, GainRequestKind::Permanent))
            .unwrap();
        engine
            .request_focus(request(
                "nav",
                AudioContext::Navigation,
                GainRequestKind::TransientMayDuck,
            ))
            .unwrap();

        // The concurrent grant flags music as a duck candidate.
        let states = engine.holder_states(ZoneId::PRIMARY).unwrap();
        let music = states
            .iter()
            .find(|(r, _)| r.context == AudioContext::Music)
            .unwrap();
        assert!(music.1);

        // The resolver reporting an empty duck set clears the flag.
        engine.mark_ducked(ZoneId::PRIMARY, &BTreeSet::new()).unwrap();
        let states = engine.holder_states(ZoneId::PRIMARY).unwrap();
        assert!(states.iter().all(|(_, ducked)| !ducked));
    }

    #[test]
    fn delayed_request_can_be_abandoned() {
        let engine = engine();
        engine
            .request_focus(request("phone", AudioContext::Call, GainRequestKind::Transient))
            .unwrap();
        let delayed = request("radio", AudioContext::Music, GainRequestKind::Permanent)
            .with_delay_accepted(true);
        engine.request_focus(delayed).unwrap();

        engine
            .release_focus(ZoneId::PRIMARY, &ClientId::new("radio"))
            .unwrap();
        assert!(engine.delayed_request(ZoneId::PRIMARY).unwrap().is_none());

        // The call holder is untouched.
        assert_eq!(engine.current_holders(ZoneId::PRIMARY).unwrap().len(), 1);
    }
}
