use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{fountain, world::GROUND_LEVEL};
use crate::error::EmitterError;
use crate::particles::billboard::billboard_rotation;
use crate::particles::{DampingLaw, Emitter, FrameInput, ModelHandle, Particle, ParticleBehavior};

pub type FountainEmitter = Emitter<FountainBehavior>;

/// How sibling particles push each other apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClashResolution {
    /// Scan every sibling from inside the per-particle loop. Each pair is
    /// pushed twice per frame and later particles see velocities already
    /// changed earlier in the same pass.
    #[default]
    Sequential,
    /// Resolve each pair once from a position snapshot taken after every
    /// particle has moved, then apply the summed impulses.
    Buffered,
}

/// Why a fountain particle was recycled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnCause {
    FellBelowSpawn,
    LifeExhausted,
    GroundCollision,
    AboveHeightLimit,
}

/// Fountain tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FountainParams {
    /// Absolute world height at which particles are recycled
    pub height_threshold: f32,
    pub spawn_spread: f32,
    pub upward_speed: f32,
    pub upward_jitter: f32,
    pub horizontal_range: f32,
    pub gravity: Vec3,
    pub damping: DampingLaw,
    /// Depth below the origin at which a particle counts as lost
    pub fall_limit: f32,
    pub clash_distance: f32,
    pub clash_strength: f32,
    pub clash_resolution: ClashResolution,
}

impl Default for FountainParams {
    fn default() -> Self {
        Self {
            height_threshold: fountain::HEIGHT_THRESHOLD,
            spawn_spread: fountain::SPAWN_SPREAD,
            upward_speed: fountain::UPWARD_SPEED,
            upward_jitter: fountain::UPWARD_JITTER,
            horizontal_range: fountain::HORIZONTAL_RANGE,
            gravity: Vec3::new(0.0, fountain::GRAVITY_Y, 0.0),
            damping: DampingLaw::per_frame(fountain::RETENTION),
            fall_limit: fountain::FALL_LIMIT,
            clash_distance: fountain::CLASH_DISTANCE,
            clash_strength: fountain::CLASH_STRENGTH,
            clash_resolution: ClashResolution::Sequential,
        }
    }
}

impl FountainParams {
    /// Every tunable finite, spreads and limits non-negative, clash
    /// distance positive, damping retention in (0, 1]
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            ("height_threshold", self.height_threshold),
            ("upward_speed", self.upward_speed),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(format!("fountain {name} {value} must be finite"));
            }
        }

        let non_negative = [
            ("spawn_spread", self.spawn_spread),
            ("upward_jitter", self.upward_jitter),
            ("horizontal_range", self.horizontal_range),
            ("fall_limit", self.fall_limit),
            ("clash_strength", self.clash_strength),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("fountain {name} {value} must be finite and non-negative"));
            }
        }

        if !(self.clash_distance.is_finite() && self.clash_distance > 0.0) {
            return Err(format!(
                "fountain clash_distance {} must be finite and positive",
                self.clash_distance
            ));
        }
        if !self.gravity.is_finite() {
            return Err("fountain gravity must be finite".to_string());
        }
        self.damping.validate()
    }
}

/// Ballistic spray with ground and height-band recycling, pairwise
/// repulsion and camera-facing orientation
#[derive(Debug, Clone, Default)]
pub struct FountainBehavior {
    params: FountainParams,
    impulses: Vec<Vec3>,
}

impl FountainBehavior {
    pub fn new(params: FountainParams) -> Self {
        Self {
            params,
            impulses: Vec::new(),
        }
    }

    pub fn params(&self) -> &FountainParams {
        &self.params
    }

    pub fn height_threshold(&self) -> f32 {
        self.params.height_threshold
    }

    fn check_band(height_threshold: f32, origin_y: f32) -> Result<(), EmitterError> {
        if !height_threshold.is_finite() {
            return Err(EmitterError::InvalidParams(format!(
                "fountain height_threshold {height_threshold} must be finite"
            )));
        }
        if height_threshold == origin_y {
            return Err(EmitterError::DegenerateLifeBand {
                height_threshold,
                origin_y,
            });
        }
        Ok(())
    }

    /// Bounds checked before the particle moves this frame
    fn lifecycle_cause(&self, particle: &Particle, origin: Vec3) -> Option<RespawnCause> {
        if particle.position.y < origin.y - self.params.fall_limit {
            Some(RespawnCause::FellBelowSpawn)
        } else if particle.life <= 0.0 || !particle.life.is_finite() {
            Some(RespawnCause::LifeExhausted)
        } else if check_for_collision(particle) {
            Some(RespawnCause::GroundCollision)
        } else {
            None
        }
    }

    /// Respawn in place and keep going with the fresh values
    fn respawn_and_continue(
        &self,
        particle: &mut Particle,
        origin: Vec3,
        cause: RespawnCause,
        rng: &mut StdRng,
    ) {
        log::trace!("Fountain particle respawned: {:?}", cause);
        *particle = self.spawn(origin, rng);
    }

    /// Recycle if needed, then integrate and orient one particle
    fn advance(&self, particle: &mut Particle, origin: Vec3, frame: &FrameInput, rng: &mut StdRng) {
        if let Some(cause) = self.lifecycle_cause(particle, origin) {
            self.respawn_and_continue(particle, origin, cause, rng);
        }
        if particle.position.y > self.params.height_threshold {
            self.respawn_and_continue(particle, origin, RespawnCause::AboveHeightLimit, rng);
        }

        let dt = frame.dt();
        particle.accel = self.params.gravity;
        particle.position += particle.velocity * dt + particle.accel * (dt * dt) * 0.5;
        particle.velocity += particle.accel * dt;
        particle.velocity = self.params.damping.apply(particle.velocity, dt);

        let (axis, angle) = billboard_rotation(particle.position, frame.camera_position());
        particle.rot_axis = axis;
        particle.rot_angle = angle.to_degrees();
    }

    /// Push applied to the particle at `diff` from its sibling, if they overlap
    fn repulsion(&self, diff: Vec3) -> Option<Vec3> {
        let min_dist = self.params.clash_distance;
        let dist = diff.length();
        (dist < min_dist)
            .then(|| diff.normalize_or_zero() * (min_dist - dist) * self.params.clash_strength)
    }

    fn clash_sequential(&self, live: &mut [Particle], i: usize) {
        for j in 0..live.len() {
            if i == j {
                continue;
            }
            let diff = live[i].position - live[j].position;
            if let Some(push) = self.repulsion(diff) {
                live[i].velocity += push;
                live[j].velocity -= push;
            }
        }
    }

    fn clash_buffered(&mut self, live: &mut [Particle]) {
        let mut impulses = std::mem::take(&mut self.impulses);
        impulses.clear();
        impulses.resize(live.len(), Vec3::ZERO);

        for i in 0..live.len() {
            for j in (i + 1)..live.len() {
                if let Some(push) = self.repulsion(live[i].position - live[j].position) {
                    impulses[i] += push;
                    impulses[j] -= push;
                }
            }
        }

        for (particle, impulse) in live.iter_mut().zip(&impulses) {
            particle.velocity += *impulse;
        }
        self.impulses = impulses;
    }

    /// Position within the height band, 1 at the origin and 0 at the threshold
    fn band_life(&self, particle: &Particle, origin: Vec3) -> f32 {
        let threshold = self.params.height_threshold;
        (threshold - particle.position.y) / (threshold - origin.y)
    }
}

/// Ground collision against the world plane, independent of the emitter
pub fn check_for_collision(particle: &Particle) -> bool {
    particle.position.y < GROUND_LEVEL
}

impl ParticleBehavior for FountainBehavior {
    fn validate_origin(&self, origin: Vec3) -> Result<(), EmitterError> {
        Self::check_band(self.params.height_threshold, origin.y)
    }

    fn spawn(&self, origin: Vec3, rng: &mut StdRng) -> Particle {
        let spread = self.params.spawn_spread;
        let horizontal = self.params.horizontal_range;

        let offset = Vec3::new(
            spread * (rng.gen::<f32>() - 0.5),
            spread * rng.gen::<f32>(),
            spread * (rng.gen::<f32>() - 0.5),
        );
        let velocity = Vec3::new(
            horizontal * (0.5 - rng.gen::<f32>()),
            self.params.upward_speed + rng.gen::<f32>() * self.params.upward_jitter,
            horizontal * (0.5 - rng.gen::<f32>()),
        );
        let mass = rng.gen::<f32>() + fountain::MASS_MIN;
        let rot_axis = Vec3::new(
            1.0 - 2.0 * rng.gen::<f32>(),
            1.0 - 2.0 * rng.gen::<f32>(),
            1.0 - 2.0 * rng.gen::<f32>(),
        )
        .try_normalize()
        .unwrap_or(Vec3::Y);
        let rot_angle = rng.gen::<f32>() * 360.0;

        Particle {
            position: origin + offset,
            velocity,
            accel: self.params.gravity,
            mass,
            life: fountain::SPAWN_LIFE,
            rot_axis,
            rot_angle,
        }
    }

    fn step(
        &mut self,
        live: &mut [Particle],
        origin: Vec3,
        frame: &FrameInput,
        rng: &mut StdRng,
    ) {
        match self.params.clash_resolution {
            ClashResolution::Sequential => {
                for i in 0..live.len() {
                    self.advance(&mut live[i], origin, frame, rng);
                    self.clash_sequential(live, i);
                    live[i].life = self.band_life(&live[i], origin);
                }
            }
            ClashResolution::Buffered => {
                for particle in live.iter_mut() {
                    self.advance(particle, origin, frame, rng);
                    particle.life = self.band_life(particle, origin);
                }
                self.clash_buffered(live);
            }
        }
    }
}

impl Emitter<FountainBehavior> {
    /// Fountain emitter spraying from `origin`.
    ///
    /// Fails on invalid `params`, and when `params.height_threshold` equals
    /// `origin.y`, since the height-band life would divide by zero.
    pub fn fountain(
        model: ModelHandle,
        number_of_particles: usize,
        origin: Vec3,
        params: FountainParams,
    ) -> Result<Self, EmitterError> {
        log::debug!(
            "Creating fountain emitter: {} particles at {:?}, threshold {}",
            number_of_particles,
            origin,
            params.height_threshold
        );
        params.validate().map_err(EmitterError::InvalidParams)?;
        Emitter::new(model, number_of_particles, origin, FountainBehavior::new(params))
    }

    /// Change the recycle height for subsequent frames
    pub fn set_height_threshold(&mut self, height_threshold: f32) -> Result<(), EmitterError> {
        FountainBehavior::check_band(height_threshold, self.position().y)?;
        self.behavior_mut().params.height_threshold = height_threshold;
        Ok(())
    }

    /// Move the origin and threshold together, validating the pair
    pub fn set_spawn_site(
        &mut self,
        origin: Vec3,
        height_threshold: f32,
    ) -> Result<(), EmitterError> {
        FountainBehavior::check_band(height_threshold, origin.y)?;
        let previous = self.behavior().params.height_threshold;
        self.behavior_mut().params.height_threshold = height_threshold;
        if let Err(e) = self.set_position(origin) {
            self.behavior_mut().params.height_threshold = previous;
            return Err(e);
        }
        Ok(())
    }
}
