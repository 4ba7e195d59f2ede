use glam::Vec3;

/// One slot of an emitter's particle pool.
///
/// Plain data: every field is rewritten in place when the slot respawns.
/// `life` is emitter-specific (a countdown for foam, a height-band fraction
/// for fountains). `rot_axis` / `rot_angle` (degrees) are only meaningful
/// once an emitter has computed a billboard orientation for the slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in world space
    pub position: Vec3,
    /// Velocity, units per second
    pub velocity: Vec3,
    /// Acceleration for the current step
    pub accel: Vec3,
    pub mass: f32,
    pub life: f32,
    pub rot_axis: Vec3,
    pub rot_angle: f32,
}

impl Particle {
    /// An inert slot, as found beyond the live prefix of a pool
    pub const INERT: Self = Self {
        position: Vec3::ZERO,
        velocity: Vec3::ZERO,
        accel: Vec3::ZERO,
        mass: 0.0,
        life: 0.0,
        rot_axis: Vec3::Y,
        rot_angle: 0.0,
    };

    /// Life clamped to [0, 1], used as the render fade factor
    pub fn fade(&self) -> f32 {
        if self.life.is_finite() {
            self.life.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::INERT
    }
}
