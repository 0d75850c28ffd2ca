//! Hexarena - hex-grid turn-based tactics battle core
//!
//! The crate decides whose turn it is, which cells a unit may reach, how an
//! attack resolves, and how effects modify stats and combat outcomes.
//! Rendering, input and asset loading live behind ports: the core emits
//! presentation requests and suspends until the matching completion signals
//! are delivered back.

pub mod battle;
pub mod core;
pub mod grid;
