//! Core newtypes used across the arbiter: zones, clients, gain indices,
//! output addresses, and volume groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an arbitration zone.
///
/// A zone is an independent arbitration scope (e.g. primary cabin vs.
/// rear-seat entertainment). Focus state never crosses zone boundaries.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// The default zone present in every deployment.
    pub const PRIMARY: ZoneId = ZoneId(0);
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone{}", self.0)
    }
}

/// Opaque requester identity.
///
/// A client has at most one outstanding focus request (holder, loser, or
/// delayed) at any time; the engine enforces this.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discrete volume step on an output group.
///
/// Indices are small integers in a configured `[min, max]` range; the
/// override chain in `aa-gain` resolves the one effective index per group.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GainIndex(pub i32);

impl GainIndex {
    /// Clamp this index into the inclusive `[min, max]` range.
    pub fn clamp(self, min: GainIndex, max: GainIndex) -> GainIndex {
        GainIndex(self.0.clamp(min.0, max.0))
    }

    /// Whether this index lies within the inclusive `[min, max]` range.
    pub fn in_range(self, min: GainIndex, max: GainIndex) -> bool {
        self >= min && self <= max
    }
}

impl fmt::Display for GainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a physical audio output path (e.g. a bus or device port name).
///
/// The ducking resolver computes *which* addresses to attenuate; the gain
/// backend applies the result to hardware.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputAddress(pub String);

impl OutputAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a volume group: a set of output addresses that share one
/// gain override state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_index_clamp() {
        let min = GainIndex(0);
        let max = GainIndex(40);
        assert_eq!(GainIndex(-3).clamp(min, max), GainIndex(0));
        assert_eq!(GainIndex(12).clamp(min, max), GainIndex(12));
        assert_eq!(GainIndex(99).clamp(min, max), GainIndex(40));
    }

    #[test]
    fn gain_index_in_range() {
        let min = GainIndex(5);
        let max = GainIndex(10);
        assert!(GainIndex(5).in_range(min, max));
        assert!(GainIndex(10).in_range(min, max));
        assert!(!GainIndex(4).in_range(min, max));
        assert!(!GainIndex(11).in_range(min, max));
    }

    #[test]
    fn default_zone_is_primary() {
        assert_eq!(ZoneId::default(), ZoneId::PRIMARY);
    }

    #[test]
    fn display_formats() {
        assert_eq!(ZoneId::PRIMARY.to_string(), "zone0");
        assert_eq!(GroupId(3).to_string(), "group3");
        assert_eq!(ClientId::new("media_app").to_string(), "media_app");
        assert_eq!(OutputAddress::new("bus0_media").to_string(), "bus0_media");
    }

    #[test]
    fn serialize_deserialize_roundtrip() {
        let addr = OutputAddress::new("bus1_nav");
        let json = serde_json::to_string(&addr).unwrap();
        let restored: OutputAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, addr);
    }
}
