pub mod billboard;
pub mod damping;
pub mod emitter;
pub mod foam;
pub mod fountain;
pub mod particle;
pub mod particle_system;
pub mod render_data;
pub mod spawn_sites;

pub use billboard::{billboard_rotation, QUAD_FACING};
pub use damping::DampingLaw;
pub use emitter::{Emitter, FrameInput, ParticleBehavior};
pub use foam::{FoamBehavior, FoamEmitter, FoamParams};
pub use fountain::{
    check_for_collision, ClashResolution, FountainBehavior, FountainEmitter, FountainParams,
    RespawnCause,
};
pub use particle::Particle;
pub use particle_system::{
    EmitterId, EmitterKind, ParticleSystem, ParticleSystemStats, ParticleUpdate, SiteEmitter,
};
pub use render_data::{
    prepare_instances, ModelHandle, ParticleInstance, RenderBatch, RenderOptions, RenderSink,
};
pub use spawn_sites::{highest_sites, SiteTransform};
