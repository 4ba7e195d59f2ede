use crate::particles::EmitterId;

/// Emitter construction and reconfiguration errors
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error(
        "height threshold {height_threshold} equals spawn height {origin_y}; \
         fountain life is undefined"
    )]
    DegenerateLifeBand { height_threshold: f32, origin_y: f32 },

    #[error("emitter origin is not finite: ({x}, {y}, {z})")]
    NonFiniteOrigin { x: f32, y: f32, z: f32 },

    #[error("particle index {index} is not live (active particles: {active})")]
    IndexOutOfRange { index: usize, active: usize },

    #[error("emitter capacity {requested} exceeds the limit of {max}")]
    CapacityTooLarge { requested: usize, max: usize },

    #[error("invalid emitter parameters: {0}")]
    InvalidParams(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Emitter collection errors
#[derive(Debug, thiserror::Error)]
pub enum EffectsError {
    #[error("no emitter with id {0}")]
    UnknownEmitter(EmitterId),

    #[error("expected {expected} spawn sites, got {got}")]
    SpawnSiteMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Emitter(#[from] EmitterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
