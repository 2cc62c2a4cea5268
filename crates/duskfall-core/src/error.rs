//! Error types for the simulation core.
//!
//! The core is forgiving by default: invalid gameplay inputs (negative
//! damage, a missing hit source, an over-cap upgrade) are clamped or logged
//! and ignored, because a live session must keep ticking. `CoreError` covers
//! the few cases that are programming mistakes on the caller's side and must
//! be surfaced rather than absorbed.

use thiserror::Error;

use crate::component::ComponentKey;
use crate::entity::EntityId;

/// Errors surfaced by the simulation core's structural APIs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A component with the same key is already attached to the entity.
    #[error("entity {id} already has a '{key}' component")]
    DuplicateComponent {
        /// The entity the attach targeted.
        id: EntityId,
        /// The key that collided.
        key: ComponentKey,
    },

    /// The entity id does not name a live entity in the registry.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
}
