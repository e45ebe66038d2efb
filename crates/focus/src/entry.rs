//! Focus entries and their id-keyed storage.
//!
//! Entries reference each other through the `blocked_by` graph. To avoid
//! aliased pointers the graph is expressed over stable integer ids into
//! one map per zone; membership in the holder or loser set is an id-set,
//! never a second owner.

use std::collections::BTreeSet;
use std::fmt;

use aa_common::{ClientId, FocusRequest};

/// Stable identity of one accepted focus entry within its zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry{}", self.0)
    }
}

/// One accepted focus request plus its arbitration bookkeeping.
///
/// An entry lives in exactly one of the zone's two id-sets (holders or
/// losers) from acceptance until eviction or abandonment. `blocked_by`
/// is non-empty exactly while the entry is a loser.
#[derive(Clone, Debug)]
pub struct FocusEntry {
    pub id: EntryId,
    pub request: FocusRequest,
    /// Ids of the entries whose continued possession keeps this one from
    /// holding focus. Maintained only by the engine, under the zone lock.
    pub blocked_by: BTreeSet<EntryId>,
    /// Whether the ducking resolver currently has this holder attenuated.
    pub ducked: bool,
}

impl FocusEntry {
    pub fn new(id: EntryId, request: FocusRequest) -> Self {
        Self {
            id,
            request,
            blocked_by: BTreeSet::new(),
            ducked: false,
        }
    }

    pub fn client(&self) -> &ClientId {
        &self.request.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aa_common::{AudioContext, GainRequestKind, ZoneId};

    #[test]
    fn new_entry_is_unblocked_and_unducked() {
        let request = FocusRequest::new(
            ClientId::new("radio"),
            ZoneId::PRIMARY,
            AudioContext::Music,
            GainRequestKind::Permanent,
        );
        let entry = FocusEntry::new(EntryId(1), request);
        assert!(entry.blocked_by.is_empty());
        assert!(!entry.ducked);
        assert_eq!(entry.client().as_str(), "radio");
    }
}
