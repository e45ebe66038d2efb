//! Gain subsystem error types (thiserror-based).

use thiserror::Error;

use aa_common::{GroupId, OutputAddress};

/// Errors on the gain controller's configuration-facing surface.
///
/// Backend refusals are *not* represented here: a failed hardware apply
/// is logged and never rolls back committed state.
#[derive(Error, Debug)]
pub enum GainError {
    /// An operation referenced a group the controller was not built with.
    #[error("Unknown volume group: {0}")]
    UnknownGroup(GroupId),

    /// An address appeared in two group configurations.
    #[error("Output address {address} assigned to both {first} and {second}")]
    DuplicateAddress {
        address: OutputAddress,
        first: GroupId,
        second: GroupId,
    },
}
