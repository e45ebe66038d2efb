//! The static ducking table: which concurrently-held contexts a holding
//! context causes to be attenuated.
//!
//! This table only names *candidates*. The ducking resolver in `aa-focus`
//! intersects it with what is actually held and protects outputs shared
//! with unducked holders; nothing here touches hardware.

use std::collections::{BTreeSet, HashMap};

use aa_common::AudioContext;

/// Immutable context → contexts-to-duck table.
///
/// Constructed once at startup. Every arbitrable context has an entry
/// (possibly empty), so lookups are total.
#[derive(Clone, Debug)]
pub struct DuckingPolicy {
    table: HashMap<AudioContext, BTreeSet<AudioContext>>,
}

impl Default for DuckingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckingPolicy {
    /// Build the policy with the stock duck lists.
    pub fn new() -> Self {
        use AudioContext::*;

        let mut policy = Self {
            table: AudioContext::ARBITRABLE
                .iter()
                .map(|ctx| (*ctx, BTreeSet::new()))
                .collect(),
        };

        // Stock configuration: guidance and alerts duck entertainment;
        // critical contexts duck nearly everything.
        policy.set_ducked(Navigation, &[Music, Announcement]);
        policy.set_ducked(VoiceCommand, &[Music, Navigation, Announcement]);
        policy.set_ducked(CallRing, &[Music, Announcement]);
        policy.set_ducked(Call, &[Music, Alarm, Notification, SystemSound, Announcement]);
        policy.set_ducked(Alarm, &[Music, Announcement]);
        policy.set_ducked(Announcement, &[Music]);
        policy.set_ducked(
            Safety,
            &[
                Music,
                Navigation,
                VoiceCommand,
                CallRing,
                Call,
                Alarm,
                Notification,
                SystemSound,
                VehicleStatus,
                Announcement,
            ],
        );
        policy.set_ducked(
            Emergency,
            &[
                Music,
                Navigation,
                VoiceCommand,
                CallRing,
                Call,
                Alarm,
                Notification,
                SystemSound,
                VehicleStatus,
                Announcement,
            ],
        );
        policy
    }

    /// Replace the duck list for one holding context. Builder-style for
    /// deployment config and tests.
    pub fn set_ducked(&mut self, holder: AudioContext, ducked: &[AudioContext]) {
        self.table.insert(holder, ducked.iter().copied().collect());
    }

    /// The contexts that `holder`, when holding focus, causes to be
    /// attenuated. Empty for contexts that duck nothing (and for
    /// `Invalid`, which never holds focus).
    pub fn contexts_to_duck(&self, holder: AudioContext) -> &BTreeSet<AudioContext> {
        static EMPTY: BTreeSet<AudioContext> = BTreeSet::new();
        self.table.get(&holder).unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AudioContext::*;

    #[test]
    fn every_arbitrable_context_has_an_entry() {
        let policy = DuckingPolicy::new();
        for ctx in AudioContext::ARBITRABLE {
            // Lookup must be total, even if the list is empty.
            let _ = policy.contexts_to_duck(ctx);
        }
    }

    #[test]
    fn navigation_ducks_music_but_not_vice_versa() {
        let policy = DuckingPolicy::new();
        assert!(policy.contexts_to_duck(Navigation).contains(&Music));
        assert!(!policy.contexts_to_duck(Music).contains(&Navigation));
    }

    #[test]
    fn music_ducks_nothing_by_default() {
        let policy = DuckingPolicy::new();
        assert!(policy.contexts_to_duck(Music).is_empty());
    }

    #[test]
    fn critical_contexts_never_appear_in_stock_duck_lists() {
        let policy = DuckingPolicy::new();
        for holder in AudioContext::ARBITRABLE {
            let ducked = policy.contexts_to_duck(holder);
            assert!(!ducked.contains(&Emergency), "{holder} ducks emergency");
            assert!(!ducked.contains(&Safety), "{holder} ducks safety");
        }
    }

    #[test]
    fn invalid_ducks_nothing() {
        let policy = DuckingPolicy::new();
        assert!(policy.contexts_to_duck(Invalid).is_empty());
    }

    #[test]
    fn set_ducked_replaces_the_list() {
        let mut policy = DuckingPolicy::new();
        policy.set_ducked(Navigation, &[Announcement]);
        let ducked = policy.contexts_to_duck(Navigation);
        assert!(!ducked.contains(&Music));
        assert!(ducked.contains(&Announcement));
    }
}
