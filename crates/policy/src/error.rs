//! Policy configuration error types (thiserror-based).

use thiserror::Error;

use aa_common::{AudioContext, AudioUsage};

/// Errors raised while building policy tables from configuration.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The same usage was mapped to two contexts. Silent remapping would
    /// make arbitration outcomes depend on configuration order, so this is
    /// reported instead of overwritten.
    #[error("Usage {usage} mapped to both {first} and {second}")]
    DuplicateMapping {
        usage: AudioUsage,
        first: AudioContext,
        second: AudioContext,
    },

    /// A mapping or table entry targeted the `Invalid` context.
    #[error("Context 'invalid' cannot appear in policy configuration (usage {usage})")]
    InvalidContextTarget { usage: AudioUsage },
}
