//! `aa-gain` — Per-group gain override state and backend commit path.
//!
//! Each volume group (a set of output addresses sharing one volume) keeps
//! a base user-requested index plus four externally-driven overlays:
//! muted, blocked, limited, attenuated. One precedence chain resolves
//! them to the single effective index the hardware should apply:
//!
//! ```text
//! mute > blocked > attenuated > limited > requested
//! ```
//!
//! - **`GainOverrideState`**: the pure per-group state machine
//! - **`GainEventReason`**: backend-reported reasons, mapped to overlays
//!   by a pure, exhaustively-tested function
//! - **`GainController`**: serializes access to every group behind a
//!   `parking_lot::Mutex` and commits effective indices through the
//!   `AudioGainBackend`

pub mod controller;
pub mod error;
pub mod group;
pub mod reasons;

pub use controller::{GainController, GroupConfig};
pub use error::GainError;
pub use group::GainOverrideState;
pub use reasons::{GainEventReason, ReasonKind};
