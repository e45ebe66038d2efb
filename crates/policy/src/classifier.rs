//! Usage-to-context classification.
//!
//! `classify` is a total function: every usage resolves to exactly one
//! context, and anything unmapped resolves to `AudioContext::Invalid`
//! rather than failing. The engine then refuses `Invalid` up front.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use aa_common::{AudioContext, AudioUsage};

use crate::error::PolicyError;

/// One usage→context mapping entry, as configuration declares it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMapping {
    pub usage: AudioUsage,
    pub context: AudioContext,
}

/// Maps requester usages to logical contexts and answers the is-critical
/// predicate.
#[derive(Clone, Debug)]
pub struct ContextClassifier {
    mapping: HashMap<AudioUsage, AudioContext>,
}

impl ContextClassifier {
    /// Build a classifier from explicit mappings.
    ///
    /// A usage appearing twice is a configuration error and is reported,
    /// never silently overwritten.
    pub fn new(mappings: &[UsageMapping]) -> Result<Self, PolicyError> {
        let mut mapping = HashMap::with_capacity(mappings.len());
        for entry in mappings {
            if entry.context == AudioContext::Invalid {
                return Err(PolicyError::InvalidContextTarget { usage: entry.usage });
            }
            if let Some(existing) = mapping.insert(entry.usage, entry.context) {
                return Err(PolicyError::DuplicateMapping {
                    usage: entry.usage,
                    first: existing,
                    second: entry.context,
                });
            }
        }
        tracing::debug!(mappings = mapping.len(), "Context classifier built");
        Ok(Self { mapping })
    }

    /// The stock mapping: each usage to its namesake context, media and
    /// game usages both to `Music`.
    pub fn with_default_mapping() -> Self {
        let mappings = [
            UsageMapping { usage: AudioUsage::Media, context: AudioContext::Music },
            UsageMapping { usage: AudioUsage::Game, context: AudioContext::Music },
            UsageMapping { usage: AudioUsage::Navigation, context: AudioContext::Navigation },
            UsageMapping { usage: AudioUsage::VoiceCommand, context: AudioContext::VoiceCommand },
            UsageMapping { usage: AudioUsage::CallRing, context: AudioContext::CallRing },
            UsageMapping { usage: AudioUsage::Call, context: AudioContext::Call },
            UsageMapping { usage: AudioUsage::Alarm, context: AudioContext::Alarm },
            UsageMapping { usage: AudioUsage::Notification, context: AudioContext::Notification },
            UsageMapping { usage: AudioUsage::SystemSound, context: AudioContext::SystemSound },
            UsageMapping { usage: AudioUsage::Emergency, context: AudioContext::Emergency },
            UsageMapping { usage: AudioUsage::Safety, context: AudioContext::Safety },
            UsageMapping { usage: AudioUsage::VehicleStatus, context: AudioContext::VehicleStatus },
            UsageMapping { usage: AudioUsage::Announcement, context: AudioContext::Announcement },
        ];
        // The stock table has no duplicates; a failure here is a bug.
        Self::new(&mappings).expect("default usage mapping is duplicate-free")
    }

    /// Resolve a usage to its context. Total: unmapped usages classify as
    /// `Invalid`.
    pub fn classify(&self, usage: AudioUsage) -> AudioContext {
        self.mapping
            .get(&usage)
            .copied()
            .unwrap_or(AudioContext::Invalid)
    }

    /// Whether a context is critical (emergency/safety): immune to
    /// preemption and to the zone restriction gate.
    pub fn is_critical(&self, context: AudioContext) -> bool {
        context.is_critical()
    }
}
