//! Shared error types (thiserror-based).
//!
//! Policy rejections are *values* (`FocusDecision::Rejected`), not errors.
//! The error types here cover genuine failures: misconfiguration, unknown
//! entities on configuration paths, and backend refusals.

use thiserror::Error;

use crate::types::{OutputAddress, ZoneId};

/// Failure reported by an `AudioGainBackend` implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The hardware/HAL rejected the gain change.
    #[error("Backend rejected gain change on {address}: {reason}")]
    GainRejected {
        address: OutputAddress,
        reason: String,
    },

    /// The hardware/HAL rejected the mute change.
    #[error("Backend rejected mute change on {address}: {reason}")]
    MuteRejected {
        address: OutputAddress,
        reason: String,
    },

    /// The output address is not known to the backend.
    #[error("Unknown output address: {0}")]
    UnknownAddress(OutputAddress),
}

/// Errors on the arbiter's configuration-facing surface.
#[derive(Error, Debug)]
pub enum ArbiterError {
    /// An operation referenced a zone the arbiter was not built with.
    #[error("Unknown zone: {0}")]
    UnknownZone(ZoneId),
}
