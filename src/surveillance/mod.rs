//! ADR surveillance engine.
//!
//! Leaf-first: `knowledge` (reference data), `correlation` (scoring),
//! `classify` and `hospice` (urgency and guidance), `engine` (observation to
//! alerts), `lifecycle` (alert state machine), `gate` (per-staff
//! acknowledgments), `service` (locked facade over one connection).

pub mod classify;
pub mod correlation;
pub mod engine;
pub mod gate;
pub mod hospice;
pub mod knowledge;
pub mod lifecycle;
pub mod messages;
pub mod service;
pub mod types;
