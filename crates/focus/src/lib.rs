//! Focus arbitration for shared audio outputs.
//!
//! This crate hosts the arbitration engine (who may play, per zone), the
//! ducking resolver (which outputs get attenuated while they do), and the
//! `AudioArbiter` facade that wires classification, arbitration, ducking,
//! and gain commit together.
//!
//! Policy lives in `aa-policy`, gain state in `aa-gain`; this crate only
//! decides and orchestrates.

pub mod engine;
pub mod entry;
pub mod resolver;
pub mod service;

pub use engine::{FocusArbitrationEngine, LossPolicy};
pub use resolver::{resolve_ducking, DuckUpdate, ZoneTopology};
pub use service::{ArbiterConfig, AudioArbiter, FocusAttributes, ZoneConfig};
