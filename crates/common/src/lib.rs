//! `aa-common` — Shared types, traits, and errors for the audio-arbiter engine.
//!
//! This crate is the foundation that all other arbiter crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `ZoneId`, `ClientId`, `GainIndex`, `OutputAddress`, `GroupId`
//!   (newtypes for safety)
//! - **Contexts**: `AudioContext`, `AudioUsage` (the unit of arbitration and
//!   the requester attribute it is classified from)
//! - **Requests**: `FocusRequest`, `GainRequestKind`, `FocusDecision`,
//!   `FocusChange` (the arbitration request/response surface)
//! - **Traits**: `AudioGainBackend`, `FocusListener` (collaborator seams)
//! - **Errors**: `BackendError`, `ArbiterError` (thiserror-based)

pub mod backend;
pub mod context;
pub mod error;
pub mod request;
pub mod types;

// Re-export commonly used items at crate root
pub use backend::{AudioGainBackend, FocusListener, NullFocusListener};
pub use context::{AudioContext, AudioUsage};
pub use error::{ArbiterError, BackendError};
pub use request::{FocusChange, FocusDecision, FocusRequest, GainRequestKind};
pub use types::{ClientId, GainIndex, GroupId, OutputAddress, ZoneId};
