//! Collaborator traits: the gain backend the arbiter drives and the focus
//! listener it notifies.
//!
//! Both traits cross a trust boundary. Backend and listener failures are
//! logged by the caller and never roll back an already-committed
//! arbitration decision: the bookkeeping of who holds what must stay
//! consistent independent of whether a side effect succeeded.

use crate::error::BackendError;
use crate::request::FocusChange;
use crate::types::{ClientId, GainIndex, OutputAddress};

/// Applies computed gains to the platform audio hardware.
///
/// The arbiter computes *what* to apply; implementations apply it to the
/// HAL or hardware. Implementations must not call back into the arbiter.
pub trait AudioGainBackend: Send + Sync {
    /// Set the gain index on one physical output path.
    fn apply_gain(&self, address: &OutputAddress, index: GainIndex) -> Result<(), BackendError>;

    /// Mute or unmute one physical output path.
    fn apply_mute(&self, address: &OutputAddress, muted: bool) -> Result<(), BackendError>;
}

/// Receives GAIN/LOSS notifications on behalf of requesters.
///
/// Dispatch happens strictly outside the engine's zone lock, so an
/// implementation may re-enter the arbiter (e.g. immediately re-request
/// focus after a loss) without deadlocking.
pub trait FocusListener: Send + Sync {
    /// Deliver one focus change to one requester.
    fn on_focus_change(&self, client: &ClientId, change: FocusChange);
}

/// Listener that drops all notifications. Useful for tests and for hosts
/// that poll `current_holders` instead of subscribing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFocusListener;

impl FocusListener for NullFocusListener {
    fn on_focus_change(&self, _client: &ClientId, _change: FocusChange) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientId;

    #[test]
    fn null_listener_ignores_everything() {
        let listener = NullFocusListener;
        listener.on_focus_change(&ClientId::new("anyone"), FocusChange::Loss);
    }
}
