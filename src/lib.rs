//! Real-time water effects: foam that drifts and fades at the wave base,
//! and fountains of spray that rise from wave crests.
//!
//! Emitters keep a fixed pool of particles, bring them to life in batches,
//! and recycle them in place. Rendering only receives finished per-instance
//! attribute buffers; the graphics API stays outside this crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod particles;

pub use config::{EffectsConfig, FoamSettings, FountainSettings};
pub use error::{ConfigError, EffectsError, EmitterError};
pub use particles::{
    Emitter, EmitterId, EmitterKind, FoamEmitter, FountainEmitter, FrameInput, ModelHandle,
    Particle, ParticleInstance, ParticleSystem, RenderBatch, RenderSink,
};
