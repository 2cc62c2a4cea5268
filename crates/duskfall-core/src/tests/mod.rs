//! Test module for determinism and integration tests.
//!
//! - **Integration tests**: full tick-loop scenarios (combat, contacts,
//!   boss attacks, wave sessions)
//! - **Determinism tests**: same setup, same steps, identical results
//! - **Helper functions**: world/entity factories and stub collaborators
//!
//! # Test Structure
//!
//! - `integration.rs`: end-to-end scenarios through [`World::step`]
//! - `determinism.rs`: repeatability checks and property tests
//! - `helpers.rs`: factories and scripted collaborator stubs

mod determinism;
mod helpers;

pub use helpers::*;
