//! Logical audio contexts and the requester usages they are classified from.
//!
//! The context is the unit of arbitration: every focus request resolves to
//! exactly one `AudioContext`, and the interaction policy is expressed as a
//! relation between two contexts. `AudioUsage` is the raw attribute a
//! requester declares; the classifier in `aa-policy` maps usages to contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical category of an audio stream, used as the unit of arbitration.
///
/// This is a closed set: configuration may remap usages to contexts, but it
/// cannot invent new contexts. `Invalid` is the classifier's total-function
/// fallback and is never itself arbitrated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AudioContext {
    /// Unrecognized input; never a target of arbitration.
    #[default]
    Invalid,
    /// Music and other media playback.
    Music,
    /// Turn-by-turn navigation guidance.
    Navigation,
    /// Voice assistant interaction.
    VoiceCommand,
    /// Incoming call ringtone.
    CallRing,
    /// Active voice call.
    Call,
    /// Alarm clock / timer sounds.
    Alarm,
    /// Short app notifications.
    Notification,
    /// UI interaction sounds (keyclicks, chimes).
    SystemSound,
    /// Emergency announcements. Critical: cannot be preempted or restricted.
    Emergency,
    /// Safety alerts (collision warning, lane departure). Critical.
    Safety,
    /// Vehicle status sounds (seatbelt, low fuel).
    VehicleStatus,
    /// External announcements (traffic, weather broadcasts).
    Announcement,
}

impl AudioContext {
    /// Every context that can hold focus, in a stable order.
    ///
    /// `Invalid` is deliberately excluded.
    pub const ARBITRABLE: [AudioContext; 12] = [
        AudioContext::Music,
        AudioContext::Navigation,
        AudioContext::VoiceCommand,
        AudioContext::CallRing,
        AudioContext::Call,
        AudioContext::Alarm,
        AudioContext::Notification,
        AudioContext::SystemSound,
        AudioContext::Emergency,
        AudioContext::Safety,
        AudioContext::VehicleStatus,
        AudioContext::Announcement,
    ];

    /// Critical contexts can never be preempted and bypass the zone-wide
    /// restriction gate.
    pub fn is_critical(self) -> bool {
        matches!(self, AudioContext::Emergency | AudioContext::Safety)
    }

    /// Whether this context participates in arbitration at all.
    pub fn is_arbitrable(self) -> bool {
        self != AudioContext::Invalid
    }

    /// Whether `self` and `other` form the ringtone/call pair that a single
    /// client may swap between without the different-context rejection.
    pub fn is_ring_call_pair(self, other: AudioContext) -> bool {
        matches!(
            (self, other),
            (AudioContext::CallRing, AudioContext::Call)
                | (AudioContext::Call, AudioContext::CallRing)
        )
    }
}

impl fmt::Display for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioContext::Invalid => "invalid",
            AudioContext::Music => "music",
            AudioContext::Navigation => "navigation",
            AudioContext::VoiceCommand => "voice_command",
            AudioContext::CallRing => "call_ring",
            AudioContext::Call => "call",
            AudioContext::Alarm => "alarm",
            AudioContext::Notification => "notification",
            AudioContext::SystemSound => "system_sound",
            AudioContext::Emergency => "emergency",
            AudioContext::Safety => "safety",
            AudioContext::VehicleStatus => "vehicle_status",
            AudioContext::Announcement => "announcement",
        };
        f.write_str(name)
    }
}

/// The "usage" attribute a requester attaches to its stream.
///
/// Usages are what applications declare; contexts are what the arbiter
/// reasons about. The mapping between them is configuration owned by
/// `aa-policy`'s classifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AudioUsage {
    Media,
    Game,
    Navigation,
    VoiceCommand,
    CallRing,
    Call,
    Alarm,
    Notification,
    SystemSound,
    Emergency,
    Safety,
    VehicleStatus,
    Announcement,
    /// Anything the platform does not recognize.
    Unknown,
}

impl fmt::Display for AudioUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioUsage::Media => "media",
            AudioUsage::Game => "game",
            AudioUsage::Navigation => "navigation",
            AudioUsage::VoiceCommand => "voice_command",
            AudioUsage::CallRing => "call_ring",
            AudioUsage::Call => "call",
            AudioUsage::Alarm => "alarm",
            AudioUsage::Notification => "notification",
            AudioUsage::SystemSound => "system_sound",
            AudioUsage::Emergency => "emergency",
            AudioUsage::Safety => "safety",
            AudioUsage::VehicleStatus => "vehicle_status",
            AudioUsage::Announcement => "announcement",
            AudioUsage::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
