use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::particles::{EmitterId, Particle};

/// Opaque drawable an emitter's particles are rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModelHandle(pub u32);

/// Per-particle instance attributes for the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub life: f32,
    pub rot_axis: [f32; 3],
    /// Degrees
    pub rot_angle: f32,
    /// Life clamped to [0, 1]
    pub fade: f32,
    pub _padding: [f32; 3],
}

impl ParticleInstance {
    fn from_particle(particle: &Particle, use_rotations: bool) -> Self {
        let (rot_axis, rot_angle) = if use_rotations {
            (particle.rot_axis, particle.rot_angle)
        } else {
            (Vec3::Y, 0.0)
        };

        Self {
            position: particle.position.to_array(),
            life: particle.life,
            rot_axis: rot_axis.to_array(),
            rot_angle,
            fade: particle.fade(),
            _padding: [0.0; 3],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Render switches shared by every emitter of a `ParticleSystem`; use a
/// separate system for emitters that need different settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Emit the billboard rotation; identity otherwise
    pub use_rotations: bool,
    /// Order instances back-to-front from the camera
    pub use_sorting: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            use_rotations: true,
            use_sorting: false,
        }
    }
}

/// Build the instance buffer for a live particle prefix.
///
/// `buffer` is cleared and reused. Sorting only reorders the instances,
/// never the pool.
pub fn prepare_instances(
    live: &[Particle],
    camera_position: Vec3,
    options: &RenderOptions,
    buffer: &mut Vec<ParticleInstance>,
) {
    buffer.clear();
    buffer.reserve(live.len());
    buffer.extend(
        live.iter()
            .map(|p| ParticleInstance::from_particle(p, options.use_rotations)),
    );

    if options.use_sorting {
        buffer.sort_by(|a, b| {
            let da = a.position().distance_squared(camera_position);
            let db = b.position().distance_squared(camera_position);
            db.total_cmp(&da)
        });
    }
}

/// One emitter's finished instance buffer for this frame
#[derive(Debug, Clone, Copy)]
pub struct RenderBatch<'a> {
    pub emitter: EmitterId,
    pub model: ModelHandle,
    pub instances: &'a [ParticleInstance],
}

/// Receives finished attribute buffers and submits them to a graphics API
pub trait RenderSink {
    fn submit(&mut self, batch: RenderBatch<'_>);
}

impl<F> RenderSink for F
where
    F: FnMut(RenderBatch<'_>),
{
    fn submit(&mut self, batch: RenderBatch<'_>) {
        self(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_at(x: f32, z: f32, life: f32) -> Particle {
        Particle {
            position: Vec3::new(x, 0.0, z),
            life,
            rot_axis: Vec3::X,
            rot_angle: 45.0,
            ..Particle::INERT
        }
    }

    fn zeroed() -> ParticleInstance {
        bytemuck::Zeroable::zeroed()
    }

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 48);
        let instances = [zeroed()];
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn test_prepare_copies_live_prefix() {
        let live = [particle_at(1.0, 0.0, 0.5), particle_at(2.0, 0.0, 1.4)];
        let mut buffer = vec![zeroed(); 10];

        prepare_instances(&live, Vec3::ZERO, &RenderOptions::default(), &mut buffer);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(buffer[0].rot_axis, [1.0, 0.0, 0.0]);
        assert_eq!(buffer[0].rot_angle, 45.0);
        assert_eq!(buffer[1].life, 1.4);
        assert_eq!(buffer[1].fade, 1.0);
    }

    #[test]
    fn test_rotations_disabled() {
        let live = [particle_at(1.0, 0.0, 0.5)];
        let mut buffer = Vec::new();
        let options = RenderOptions {
            use_rotations: false,
            use_sorting: false,
        };

        prepare_instances(&live, Vec3::ZERO, &options, &mut buffer);

        assert_eq!(buffer[0].rot_axis, [0.0, 1.0, 0.0]);
        assert_eq!(buffer[0].rot_angle, 0.0);
    }

    #[test]
    fn test_sorting_back_to_front() {
        let live = [
            particle_at(0.0, 1.0, 0.1),
            particle_at(0.0, 9.0, 0.2),
            particle_at(0.0, 4.0, 0.3),
        ];
        let mut buffer = Vec::new();
        let options = RenderOptions {
            use_rotations: true,
            use_sorting: true,
        };

        prepare_instances(&live, Vec3::new(0.0, 0.0, 10.0), &options, &mut buffer);

        let lives: Vec<f32> = buffer.iter().map(|i| i.life).collect();
        assert_eq!(lives, vec![0.1, 0.3, 0.2]);
    }

    #[test]
    fn test_closure_sink() {
        let instances = [zeroed(); 3];
        let mut seen = Vec::new();
        let mut sink = |batch: RenderBatch<'_>| seen.push((batch.emitter, batch.instances.len()));

        sink.submit(RenderBatch {
            emitter: EmitterId(4),
            model: ModelHandle(1),
            instances: &instances,
        });

        assert_eq!(seen, vec![(EmitterId(4), 3)]);
    }
}
