use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::foam;
use crate::error::EmitterError;
use crate::particles::{DampingLaw, Emitter, FrameInput, ModelHandle, Particle, ParticleBehavior};

pub type FoamEmitter = Emitter<FoamBehavior>;

/// Foam tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoamParams {
    /// Side of the square spawn footprint, centered on the origin
    pub footprint: f32,
    /// Full width of the random horizontal drift velocity
    pub drift_speed: f32,
    pub mass: f32,
    pub damping: DampingLaw,
    /// Life lost per second
    pub fade_rate: f32,
}

impl Default for FoamParams {
    fn default() -> Self {
        Self {
            footprint: foam::FOOTPRINT,
            drift_speed: foam::DRIFT_SPEED,
            mass: foam::MASS,
            damping: DampingLaw::per_frame(foam::RETENTION),
            fade_rate: foam::FADE_RATE,
        }
    }
}

impl FoamParams {
    /// Every tunable finite and non-negative; damping retention in (0, 1]
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("footprint", self.footprint),
            ("drift_speed", self.drift_speed),
            ("mass", self.mass),
            ("fade_rate", self.fade_rate),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("foam {name} {value} must be finite and non-negative"));
            }
        }
        self.damping.validate()
    }
}

/// Surface foam: gravity-free drift in the spawn plane with a slow fade
#[derive(Debug, Clone, Default)]
pub struct FoamBehavior {
    params: FoamParams,
}

impl FoamBehavior {
    pub fn new(params: FoamParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FoamParams {
        &self.params
    }

    /// Expired or sunk below the surface reference
    fn needs_respawn(particle: &Particle, origin: Vec3) -> bool {
        particle.life <= 0.0 || particle.position.y < origin.y
    }
}

impl ParticleBehavior for FoamBehavior {
    fn spawn(&self, origin: Vec3, rng: &mut StdRng) -> Particle {
        let footprint = self.params.footprint;
        let drift = self.params.drift_speed;

        let offset = Vec3::new(
            (rng.gen::<f32>() - 0.5) * footprint,
            0.0,
            (rng.gen::<f32>() - 0.5) * footprint,
        );
        let velocity = Vec3::new(
            (rng.gen::<f32>() - 0.5) * drift,
            0.0,
            (rng.gen::<f32>() - 0.5) * drift,
        );

        Particle {
            position: origin + offset,
            velocity,
            accel: Vec3::ZERO,
            mass: self.params.mass,
            life: foam::SPAWN_LIFE,
            ..Particle::INERT
        }
    }

    fn step(
        &mut self,
        live: &mut [Particle],
        origin: Vec3,
        frame: &FrameInput,
        rng: &mut StdRng,
    ) {
        let dt = frame.dt();

        for particle in live.iter_mut() {
            // Respawned slots continue through this pass with their new values
            if Self::needs_respawn(particle, origin) {
                log::trace!("Foam particle respawned (life {:.3})", particle.life);
                *particle = self.spawn(origin, rng);
            }

            particle.accel = Vec3::ZERO;
            particle.velocity = self.params.damping.apply(particle.velocity, dt);
            particle.position += particle.velocity * dt;
            particle.life -= self.params.fade_rate * dt;
        }
    }
}

impl Emitter<FoamBehavior> {
    /// Foam emitter spawning around `origin`. Rejects invalid `params`.
    pub fn foam(
        model: ModelHandle,
        number_of_particles: usize,
        origin: Vec3,
        params: FoamParams,
    ) -> Result<Self, EmitterError> {
        log::debug!(
            "Creating foam emitter: {} particles at {:?}",
            number_of_particles,
            origin
        );
        params.validate().map_err(EmitterError::InvalidParams)?;
        Emitter::new(model, number_of_particles, origin, FoamBehavior::new(params))
    }
}
