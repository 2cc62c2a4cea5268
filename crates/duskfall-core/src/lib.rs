//! # Duskfall Core
//!
//! Encounter and combat core simulation for Duskfall.
//!
//! This crate provides the deterministic simulation engine that drives combat
//! resolution, timed boss-attack state machines, and enemy-wave orchestration
//! for a 2D action game. Rendering, audio, physics-engine internals, asset
//! loading and UI live outside this crate and talk to it through the
//! collaborator traits in [`collab`] and the event vocabulary in [`events`].
//!
//! ## Architecture
//!
//! - **Entities**: addressable simulation objects with a position and a
//!   type-keyed set of components ([`entity`])
//! - **Components**: attachable behavior units with spawn/update/dispose
//!   lifecycle hooks, updated in priority order ([`component`])
//! - **Events**: a typed, synchronous, same-tick publish/subscribe channel
//!   ([`events`])
//! - **Effects**: the deferred mutation queue that keeps the registry safe to
//!   iterate ([`effects`])
//! - **World**: the authoritative registry and single-threaded tick loop
//!   ([`world`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duskfall_core::{World, Blueprint, EntityTag};
//! use duskfall_core::entity::CombatStats;
//! use glam::Vec2;
//!
//! let mut world = World::new(1.0 / 60.0);
//! let hero = world.spawn(
//!     Blueprint::new(EntityTag::Player, Vec2::ZERO)
//!         .with(CombatStats::new(100.0, 20.0)),
//! );
//! world.step();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod collab;
pub mod component;
pub mod components;
pub mod effects;
pub mod entity;
pub mod error;
pub mod events;
pub mod world;

#[cfg(test)]
mod tests;

pub use clock::TickClock;
pub use component::{Component, ComponentKey, KeyedComponent};
pub use effects::{Effect, Effects};
pub use entity::{Entity, EntityId, EntityTag};
pub use error::CoreError;
pub use events::{EventScope, GameEvent, Topic};
pub use world::{Blueprint, World, WorldView};
