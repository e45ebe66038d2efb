//! Output-level ducking resolution.
//!
//! The interaction table decides *which contexts* may duck others; this
//! resolver turns that into *which output addresses* to attenuate, given
//! the zone's routing topology. It is a pure function of the held
//! contexts and the previously ducked addresses, so the same inputs
//! always produce the same update and applying it twice is harmless.

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use aa_common::{AudioContext, OutputAddress};
use aa_policy::DuckingPolicy;

/// Which output addresses each context of a zone renders to.
///
/// Contexts may share addresses (a shared amplifier channel) and a
/// context absent from the map simply renders nowhere in this zone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneTopology {
    context_addresses: HashMap<AudioContext, Vec<OutputAddress>>,
}

impl ZoneTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a context to a set of output addresses, replacing any
    /// previous routing for it.
    pub fn set_route(&mut self, context: AudioContext, addresses: Vec<OutputAddress>) -> &mut Self {
        self.context_addresses.insert(context, addresses);
        self
    }

    pub fn addresses_for(&self, context: AudioContext) -> &[OutputAddress] {
        self.context_addresses
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The resolved delta for one zone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuckUpdate {
    /// Addresses that must be attenuated now.
    pub to_duck: BTreeSet<OutputAddress>,
    /// Previously attenuated addresses that must return to normal.
    pub to_unduck: BTreeSet<OutputAddress>,
    /// The holder contexts that ended up attenuated, for bookkeeping.
    pub ducked_contexts: BTreeSet<AudioContext>,
}

impl DuckUpdate {
    pub fn is_noop(&self) -> bool {
        self.to_duck.is_empty() && self.to_unduck.is_empty()
    }
}

/// Resolve the ducking state of one zone.
///
/// `held` are the contexts of the zone's current holders and `previous`
/// the addresses attenuated by the last update. Resolution:
///
/// 1. collect every context some holder wants ducked, kept only if it is
///    itself held (a context that is not playing cannot be ducked),
/// 2. addresses of holders that stay at full level are protected,
/// 3. duck the remaining addresses of the ducked contexts,
/// 4. everything previously ducked but no longer wanted is restored.
///
/// Shared addresses therefore resolve in favour of the unducked holder.
pub fn resolve_ducking(
    previous: &BTreeSet<OutputAddress>,
    held: &BTreeSet<AudioContext>,
    policy: &DuckingPolicy,
    topology: &ZoneTopology,
) -> DuckUpdate {
    let mut ducked_contexts: BTreeSet<AudioContext> = BTreeSet::new();
    for holder in held {
        for target in policy.contexts_to_duck(*holder) {
            if held.contains(target) {
                ducked_contexts.insert(*target);
            }
        }
    }

    let mut protected: BTreeSet<OutputAddress> = BTreeSet::new();
    for context in held.difference(&ducked_contexts) {
        protected.extend(topology.addresses_for(*context).iter().cloned());
    }

    let mut duck_addrs: BTreeSet<OutputAddress> = BTreeSet::new();
    for context in &ducked_contexts {
        for address in topology.addresses_for(*context) {
            if !protected.contains(address) {
                duck_addrs.insert(address.clone());
            }
        }
    }

    let to_unduck: BTreeSet<OutputAddress> =
        previous.difference(&duck_addrs).cloned().collect();

    DuckUpdate {
        to_duck: duck_addrs,
        to_unduck,
        ducked_contexts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> OutputAddress {
        OutputAddress::new(s)
    }

    fn topology() -> ZoneTopology {
        let mut t = ZoneTopology::new();
        t.set_route(AudioContext::Music, vec![addr("ent-main")])
            .set_route(AudioContext::Navigation, vec![addr("nav-front")])
            .set_route(AudioContext::Announcement, vec![addr("ann-main")]);
        t
    }

    fn held(contexts: &[AudioContext]) -> BTreeSet<AudioContext> {
        contexts.iter().copied().collect()
    }

    #[test]
    fn navigation_ducks_music_outputs() {
        let update = resolve_ducking(
            &BTreeSet::new(),
            &held(&[AudioContext::Music, AudioContext::Navigation]),
            &DuckingPolicy::new(),
            &topology(),
        );
        assert_eq!(update.to_duck, [addr("ent-main")].into_iter().collect());
        assert!(update.to_unduck.is_empty());
        assert_eq!(
            update.ducked_contexts,
            [AudioContext::Music].into_iter().collect()
        );
    }

    #[test]
    fn duck_target_must_itself_be_held() {
        // Navigation alone: its duck list names music, but music is not
        // playing, so nothing is attenuated.
        let update = resolve_ducking(
            &BTreeSet::new(),
            &held(&[AudioContext::Navigation]),
            &DuckingPolicy::new(),
            &topology(),
        );
        assert!(update.is_noop());
        assert!(update.ducked_contexts.is_empty());
    }

    #[test]
    fn shared_address_resolves_in_favour_of_unducked_holder() {
        // Safety shares an amplifier channel with music. Navigation
        // wants music ducked, but safety is never ducked, so the shared
        // address stays at full level.
        let mut t = topology();
        t.set_route(AudioContext::Safety, vec![addr("ent-main"), addr("safety")]);
        let update = resolve_ducking(
            &BTreeSet::new(),
            &held(&[
                AudioContext::Music,
                AudioContext::Navigation,
                AudioContext::Safety,
            ]),
            &DuckingPolicy::new(),
            &t,
        );
        assert!(!update.to_duck.contains(&addr("ent-main")));
        assert!(update.ducked_contexts.contains(&AudioContext::Music));
    }

    #[test]
    fn stale_ducks_are_restored() {
        let previous: BTreeSet<OutputAddress> = [addr("ent-main")].into_iter().collect();
        let update = resolve_ducking(
            &previous,
            &held(&[AudioContext::Music]),
            &DuckingPolicy::new(),
            &topology(),
        );
        assert!(update.to_duck.is_empty());
        assert_eq!(update.to_unduck, previous);
    }

    #[test]
    fn resolution_is_idempotent() {
        let policy = DuckingPolicy::new();
        let t = topology();
        let contexts = held(&[AudioContext::Music, AudioContext::Navigation]);

        let first = resolve_ducking(&BTreeSet::new(), &contexts, &policy, &t);
        let second = resolve_ducking(&first.to_duck, &contexts, &policy, &t);
        assert_eq!(first.to_duck, second.to_duck);
        assert!(second.to_unduck.is_empty());
    }

    #[test]
    fn empty_zone_restores_everything() {
        let previous: BTreeSet<OutputAddress> =
            [addr("ent-main"), addr("nav-front")].into_iter().collect();
        let update = resolve_ducking(
            &previous,
            &BTreeSet::new(),
            &DuckingPolicy::new(),
            &topology(),
        );
        assert!(update.to_duck.is_empty());
        assert_eq!(update.to_unduck, previous);
    }
}
