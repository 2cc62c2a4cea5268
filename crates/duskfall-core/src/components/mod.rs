//! Gameplay components built on the core lifecycle.
//!
//! Stat-bearing components live in [`crate::entity::stats`]; this module
//! holds the behavior components: contact resolution, death rewards,
//! one-shot effects, the boss charge skill, patrol movement and the wave
//! director.

pub mod charge;
pub mod contact;
pub mod effect;
pub mod patrol;
pub mod reward;
pub mod waves;

pub use charge::{ChargeConfig, ChargePhase, ChargeSkill};
pub use contact::{ContactKind, ContactResponse, Explosion};
pub use effect::OneShotEffect;
pub use patrol::PatrolAi;
pub use reward::RewardOnDeath;
pub use waves::{BasicWaveSpawner, WaveConfig, WaveDirector};
