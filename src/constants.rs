// Wave FX Constants
//
// Fixed behavioral constants shared by every emitter kind, plus the default
// tunables that `FoamParams` / `FountainParams` start from.

/// Emission pacing shared by all emitters
pub mod emission {
    /// Slots brought to life per update while an emitter warms up.
    /// Fixed: the gradual fade-in of a fresh emitter depends on it.
    pub const ACTIVATION_BATCH: usize = 30;
    /// Largest pool a single emitter may allocate
    pub const MAX_PARTICLES: usize = 1 << 20;
}

/// World reference planes
pub mod world {
    /// Fountain ground collision plane (world Y, not emitter-relative)
    pub const GROUND_LEVEL: f32 = 0.0;
}

/// Foam defaults
pub mod foam {
    /// Side length of the square spawn footprint around the origin
    pub const FOOTPRINT: f32 = 5.0;
    /// Full width of the random horizontal drift velocity
    pub const DRIFT_SPEED: f32 = 0.2;
    pub const MASS: f32 = 0.1;
    pub const SPAWN_LIFE: f32 = 1.0;
    /// Velocity kept per update
    pub const RETENTION: f32 = 0.95;
    /// Life lost per second
    pub const FADE_RATE: f32 = 0.1;
}

/// Fountain defaults
pub mod fountain {
    pub const HEIGHT_THRESHOLD: f32 = 0.05;
    /// Spawn jitter around the origin (X/Z centered, Y one-sided)
    pub const SPAWN_SPREAD: f32 = 0.005;
    pub const UPWARD_SPEED: f32 = 0.2;
    pub const UPWARD_JITTER: f32 = 0.2;
    pub const HORIZONTAL_RANGE: f32 = 0.1;
    pub const GRAVITY_Y: f32 = -1.0;
    /// Velocity kept per update
    pub const RETENTION: f32 = 0.80;
    /// Distance below the origin at which a particle is considered lost
    pub const FALL_LIMIT: f32 = 10.0;
    /// Life given at spawn; overwritten by the first height-band update
    pub const SPAWN_LIFE: f32 = 0.2;
    pub const MASS_MIN: f32 = 0.5;
    pub const CLASH_DISTANCE: f32 = 0.5;
    pub const CLASH_STRENGTH: f32 = 0.5;
}

/// Damping law defaults
pub mod damping {
    /// Frame length the time-scaled law treats as one "retention step"
    pub const REFERENCE_DT: f32 = 1.0 / 60.0;
}
