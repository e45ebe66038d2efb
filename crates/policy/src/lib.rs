//! `aa-policy` — Classification and interaction policy for the audio arbiter.
//!
//! This crate holds the three policy tables the focus engine consumes:
//!
//! - **Classifier**: maps a requester's declared `AudioUsage` to the one
//!   `AudioContext` it is arbitrated as
//! - **Interaction**: for an (existing holder, new requester) context pair,
//!   decides Allow / AllowWithDuck / Reject / Delay
//! - **Ducking**: which concurrently-held contexts a holding context causes
//!   to be attenuated
//!
//! All three are immutable once constructed and are injected into the
//! engine by the host service. The *values* shipped in the `default()`
//! constructors are configuration, not algorithm; deployments may build
//! the tables from their own mappings.

pub mod classifier;
pub mod ducking;
pub mod error;
pub mod interaction;

pub use classifier::{ContextClassifier, UsageMapping};
pub use ducking::DuckingPolicy;
pub use error::PolicyError;
pub use interaction::{Interaction, InteractionDecision, InteractionMatrix};
