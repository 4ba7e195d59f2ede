use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::emission::{ACTIVATION_BATCH, MAX_PARTICLES};
use crate::error::EmitterError;
use crate::particles::{ModelHandle, Particle};

/// Per-frame input handed to every emitter.
///
/// Only constructible through `new`, so `dt` is always finite and
/// non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    time: f32,
    dt: f32,
    camera_position: Vec3,
}

impl FrameInput {
    /// Build frame input, clamping a negative or non-finite `dt` to zero
    pub fn new(time: f32, dt: f32, camera_position: Vec3) -> Self {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Clamping invalid frame step dt={} to 0", dt);
            0.0
        };

        Self {
            time,
            dt,
            camera_position,
        }
    }

    /// Absolute time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Step length in seconds
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }
}

/// Spawn and step rules for one kind of emitter.
///
/// `step` only ever sees the live prefix of the pool, so a behavior cannot
/// touch inert slots.
pub trait ParticleBehavior {
    /// Reject origins this behavior cannot simulate from
    fn validate_origin(&self, _origin: Vec3) -> Result<(), EmitterError> {
        Ok(())
    }

    /// A freshly spawned particle. Must not depend on the slot's old contents.
    fn spawn(&self, origin: Vec3, rng: &mut StdRng) -> Particle;

    /// Advance every live particle by one frame
    fn step(
        &mut self,
        live: &mut [Particle],
        origin: Vec3,
        frame: &FrameInput,
        rng: &mut StdRng,
    );
}

/// Fixed-capacity particle pool with an emission origin and the shared
/// activation ramp. Kind-specific rules live in `B`.
#[derive(Debug, Clone)]
pub struct Emitter<B> {
    behavior: B,
    model: ModelHandle,
    emitter_pos: Vec3,
    number_of_particles: usize,
    active_particles: usize,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl<B: ParticleBehavior> Emitter<B> {
    /// Create an emitter with `number_of_particles` inert slots
    pub fn new(
        model: ModelHandle,
        number_of_particles: usize,
        origin: Vec3,
        behavior: B,
    ) -> Result<Self, EmitterError> {
        if number_of_particles > MAX_PARTICLES {
            return Err(EmitterError::CapacityTooLarge {
                requested: number_of_particles,
                max: MAX_PARTICLES,
            });
        }
        check_finite(origin)?;
        behavior.validate_origin(origin)?;

        Ok(Self {
            behavior,
            model,
            emitter_pos: origin,
            number_of_particles,
            active_particles: 0,
            particles: vec![Particle::INERT; number_of_particles],
            rng: StdRng::from_entropy(),
        })
    }

    /// Replace the entropy-seeded generator with a deterministic one
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Advance the emitter by one frame. Call at most once per frame.
    pub fn update_particles(&mut self, time: f32, dt: f32, camera_position: Vec3) {
        let frame = FrameInput::new(time, dt, camera_position);
        self.update_with(&frame);
    }

    /// Same as `update_particles` with frame input built once per frame
    pub fn update_with(&mut self, frame: &FrameInput) {
        self.activate_batch();

        let live = &mut self.particles[..self.active_particles];
        self.behavior.step(live, self.emitter_pos, frame, &mut self.rng);
    }

    /// Bring up to `ACTIVATION_BATCH` inert slots to life
    fn activate_batch(&mut self) {
        let pending = self.number_of_particles - self.active_particles;
        let limit = pending.min(ACTIVATION_BATCH);

        for _ in 0..limit {
            self.create_new_particle(self.active_particles);
            self.active_particles += 1;
        }
    }

    fn create_new_particle(&mut self, index: usize) {
        self.particles[index] = self.behavior.spawn(self.emitter_pos, &mut self.rng);
    }

    /// Respawn a live particle in place
    pub fn respawn(&mut self, index: usize) -> Result<(), EmitterError> {
        if index >= self.active_particles {
            return Err(EmitterError::IndexOutOfRange {
                index,
                active: self.active_particles,
            });
        }
        self.create_new_particle(index);
        Ok(())
    }

    /// Move the spawn origin. Live particles keep their state.
    pub fn set_position(&mut self, origin: Vec3) -> Result<(), EmitterError> {
        check_finite(origin)?;
        self.behavior.validate_origin(origin)?;
        self.emitter_pos = origin;
        Ok(())
    }

    pub fn position(&self) -> Vec3 {
        self.emitter_pos
    }

    /// Pool capacity
    pub fn capacity(&self) -> usize {
        self.number_of_particles
    }

    pub fn active_particles(&self) -> usize {
        self.active_particles
    }

    /// Live prefix of the pool
    pub fn particles(&self) -> &[Particle] {
        &self.particles[..self.active_particles]
    }

    /// Mutable live prefix of the pool
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.active_particles]
    }

    pub fn model(&self) -> ModelHandle {
        self.model
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }
}

fn check_finite(origin: Vec3) -> Result<(), EmitterError> {
    if origin.is_finite() {
        Ok(())
    } else {
        Err(EmitterError::NonFiniteOrigin {
            x: origin.x,
            y: origin.y,
            z: origin.z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Spawns at the origin and counts steps
    #[derive(Debug, Clone, Default)]
    struct Counter {
        steps: usize,
        last_live: usize,
    }

    impl ParticleBehavior for Counter {
        fn spawn(&self, origin: Vec3, rng: &mut StdRng) -> Particle {
            Particle {
                position: origin,
                life: 1.0,
                mass: rng.gen(),
                ..Particle::INERT
            }
        }

        fn step(
            &mut self,
            live: &mut [Particle],
            _origin: Vec3,
            frame: &FrameInput,
            _rng: &mut StdRng,
        ) {
            self.steps += 1;
            self.last_live = live.len();
            for particle in live.iter_mut() {
                particle.life -= frame.dt();
                particle.position.x += frame.dt();
            }
        }
    }

    fn counting(capacity: usize) -> Emitter<Counter> {
        Emitter::new(ModelHandle(0), capacity, Vec3::ZERO, Counter::default())
            .unwrap()
            .with_seed(7)
    }

    #[test]
    fn test_activation_ramp() {
        let mut emitter = counting(100);

        for n in 1..=6 {
            emitter.update_particles(0.0, 0.016, Vec3::ZERO);
            assert_eq!(emitter.active_particles(), (n * ACTIVATION_BATCH).min(100));
            assert_eq!(emitter.behavior().last_live, emitter.active_particles());
        }
    }

    #[test]
    fn test_zero_capacity_never_activates() {
        let mut emitter = counting(0);

        emitter.update_particles(0.0, 0.1, Vec3::ZERO);
        emitter.update_particles(0.1, 0.1, Vec3::ZERO);

        assert_eq!(emitter.active_particles(), 0);
        assert!(emitter.particles().is_empty());
        assert_eq!(emitter.behavior().last_live, 0);
    }

    #[test]
    fn test_inert_slots_untouched() {
        let mut emitter = counting(75);
        emitter.update_particles(0.0, 0.1, Vec3::ZERO);

        assert_eq!(emitter.active_particles(), 30);
        assert!(emitter.particles[30..].iter().all(|p| *p == Particle::INERT));
        assert!(emitter.particles[..30].iter().all(|p| p.life < 1.0));
    }

    #[test]
    fn test_negative_dt_is_clamped() {
        let frame = FrameInput::new(1.0, -0.5, Vec3::ZERO);
        assert_eq!(frame.dt(), 0.0);
        assert_eq!(frame.time(), 1.0);

        let frame = FrameInput::new(1.0, f32::NAN, Vec3::ZERO);
        assert_eq!(frame.dt(), 0.0);

        let mut emitter = counting(10);
        emitter.update_particles(0.0, -1.0, Vec3::ZERO);
        assert!(emitter.particles().iter().all(|p| p.life == 1.0));
    }

    #[test]
    fn test_update_with_never_steps_backward() {
        let mut emitter = counting(5);
        emitter.update_particles(0.0, 0.0, Vec3::ZERO);

        let frame = FrameInput::new(0.1, -1.0, Vec3::ZERO);
        emitter.update_with(&frame);

        for particle in emitter.particles() {
            assert_eq!(particle.position.x, 0.0);
            assert_eq!(particle.life, 1.0);
        }
        assert_eq!(emitter.behavior().steps, 2);
    }

    #[test]
    fn test_capacity_cap() {
        let capacity = MAX_PARTICLES + 1;
        let result = Emitter::new(ModelHandle(0), capacity, Vec3::ZERO, Counter::default());
        assert!(matches!(
            result,
            Err(EmitterError::CapacityTooLarge { requested, max })
                if requested == MAX_PARTICLES + 1 && max == MAX_PARTICLES
        ));
    }

    #[test]
    fn test_respawn_rejects_inert_index() {
        let mut emitter = counting(40);
        emitter.update_particles(0.0, 0.1, Vec3::ZERO);

        assert!(emitter.respawn(29).is_ok());
        assert_eq!(emitter.particles()[29].life, 1.0);
        assert!(matches!(
            emitter.respawn(30),
            Err(EmitterError::IndexOutOfRange { index: 30, active: 30 })
        ));
    }

    #[test]
    fn test_non_finite_origin_rejected() {
        let origin = Vec3::new(f32::NAN, 0.0, 0.0);
        let result = Emitter::new(ModelHandle(0), 4, origin, Counter::default());
        assert!(matches!(result, Err(EmitterError::NonFiniteOrigin { .. })));

        let mut emitter = counting(4);
        assert!(emitter.set_position(Vec3::splat(f32::INFINITY)).is_err());
        assert_eq!(emitter.position(), Vec3::ZERO);
    }

    #[test]
    fn test_seeded_emitters_match() {
        let mut a = counting(50);
        let mut b = counting(50);

        for frame in 0..3 {
            a.update_particles(frame as f32, 0.1, Vec3::ZERO);
            b.update_particles(frame as f32, 0.1, Vec3::ZERO);
        }

        assert_eq!(a.particles(), b.particles());
    }
}
