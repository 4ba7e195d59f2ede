use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::EffectsConfig;
use crate::error::{EffectsError, EmitterError};
use crate::particles::{
    prepare_instances, FoamEmitter, FountainEmitter, FrameInput, ModelHandle, Particle,
    ParticleBehavior, ParticleInstance, RenderBatch, RenderSink,
};

/// Stable identifier of an emitter inside a `ParticleSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitterId(pub u64);

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which emitter kind to create at a spawn site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterKind {
    Foam,
    Fountain,
}

/// One emitter of either kind
#[derive(Debug, Clone)]
pub enum SiteEmitter {
    Foam(FoamEmitter),
    Fountain(FountainEmitter),
}

impl SiteEmitter {
    pub fn kind(&self) -> EmitterKind {
        match self {
            SiteEmitter::Foam(_) => EmitterKind::Foam,
            SiteEmitter::Fountain(_) => EmitterKind::Fountain,
        }
    }

    pub fn update_with(&mut self, frame: &FrameInput) {
        match self {
            SiteEmitter::Foam(e) => e.update_with(frame),
            SiteEmitter::Fountain(e) => e.update_with(frame),
        }
    }

    pub fn set_position(&mut self, origin: Vec3) -> Result<(), EmitterError> {
        match self {
            SiteEmitter::Foam(e) => e.set_position(origin),
            SiteEmitter::Fountain(e) => e.set_position(origin),
        }
    }

    /// Whether `origin` would be accepted by `set_position`
    fn accepts(&self, origin: Vec3) -> Result<(), EmitterError> {
        if !origin.is_finite() {
            return Err(EmitterError::NonFiniteOrigin {
                x: origin.x,
                y: origin.y,
                z: origin.z,
            });
        }
        match self {
            SiteEmitter::Foam(e) => e.behavior().validate_origin(origin),
            SiteEmitter::Fountain(e) => e.behavior().validate_origin(origin),
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            SiteEmitter::Foam(e) => e.position(),
            SiteEmitter::Fountain(e) => e.position(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        match self {
            SiteEmitter::Foam(e) => e.particles(),
            SiteEmitter::Fountain(e) => e.particles(),
        }
    }

    pub fn active_particles(&self) -> usize {
        self.particles().len()
    }

    pub fn capacity(&self) -> usize {
        match self {
            SiteEmitter::Foam(e) => e.capacity(),
            SiteEmitter::Fountain(e) => e.capacity(),
        }
    }

    pub fn model(&self) -> ModelHandle {
        match self {
            SiteEmitter::Foam(e) => e.model(),
            SiteEmitter::Fountain(e) => e.model(),
        }
    }
}

/// Particle system update result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleUpdate {
    pub active_particles: usize,
    pub active_emitters: usize,
}

/// Statistics about the particle system
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParticleSystemStats {
    pub total_particles: usize,
    pub foam_particles: usize,
    pub fountain_particles: usize,
    pub foam_emitters: usize,
    pub fountain_emitters: usize,
    pub capacity_used: f32,
}

/// Owns every active emitter, steps them once per frame and hands their
/// instance buffers to a render sink
pub struct ParticleSystem {
    config: EffectsConfig,
    model: ModelHandle,
    emitters: BTreeMap<EmitterId, SiteEmitter>,
    next_id: u64,
    render_buffer: Vec<ParticleInstance>,
}

impl ParticleSystem {
    /// Create an empty system; `model` is attached to every emitter it creates
    pub fn new(config: EffectsConfig, model: ModelHandle) -> Self {
        Self {
            config,
            model,
            emitters: BTreeMap::new(),
            next_id: 0,
            render_buffer: Vec::new(),
        }
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Create an emitter of `kind` at an untransformed spawn site
    pub fn add_emitter(
        &mut self,
        kind: EmitterKind,
        site: Vec3,
    ) -> Result<EmitterId, EffectsError> {
        let id = EmitterId(self.next_id);
        let emitter = self.build(kind, id, self.config.sites.apply(site))?;
        self.next_id += 1;
        self.emitters.insert(id, emitter);
        log::debug!("Added {:?} emitter {}", kind, id);
        Ok(id)
    }

    fn build(
        &self,
        kind: EmitterKind,
        id: EmitterId,
        origin: Vec3,
    ) -> Result<SiteEmitter, EmitterError> {
        let emitter = match kind {
            EmitterKind::Foam => {
                let settings = &self.config.foam;
                let emitter =
                    FoamEmitter::foam(self.model, settings.capacity, origin, settings.params)?;
                match self.seed_for(id) {
                    Some(seed) => SiteEmitter::Foam(emitter.with_seed(seed)),
                    None => SiteEmitter::Foam(emitter),
                }
            }
            EmitterKind::Fountain => {
                let settings = &self.config.fountain;
                let emitter = FountainEmitter::fountain(
                    self.model,
                    settings.capacity,
                    origin,
                    settings.params,
                )?;
                match self.seed_for(id) {
                    Some(seed) => SiteEmitter::Fountain(emitter.with_seed(seed)),
                    None => SiteEmitter::Fountain(emitter),
                }
            }
        };
        Ok(emitter)
    }

    /// Distinct deterministic stream per emitter when a base seed is set
    fn seed_for(&self, id: EmitterId) -> Option<u64> {
        self.config
            .seed
            .map(|seed| seed ^ id.0.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Remove an emitter; its in-flight particles are lost
    pub fn remove_emitter(&mut self, id: EmitterId) -> Result<SiteEmitter, EffectsError> {
        let emitter = self.emitters.remove(&id).ok_or(EffectsError::UnknownEmitter(id))?;
        log::debug!("Removed emitter {}", id);
        Ok(emitter)
    }

    pub fn get(&self, id: EmitterId) -> Option<&SiteEmitter> {
        self.emitters.get(&id)
    }

    pub fn get_mut(&mut self, id: EmitterId) -> Option<&mut SiteEmitter> {
        self.emitters.get_mut(&id)
    }

    /// Emitter ids in update order
    pub fn ids(&self) -> impl Iterator<Item = EmitterId> + '_ {
        self.emitters.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Remove every emitter
    pub fn clear(&mut self) {
        self.emitters.clear();
        self.render_buffer.clear();
    }

    /// Discard all emitters and create one `kind` emitter per site.
    ///
    /// All sites are validated first; on error the current emitters are kept.
    pub fn rebuild_from_sites(
        &mut self,
        kind: EmitterKind,
        sites: &[Vec3],
    ) -> Result<Vec<EmitterId>, EffectsError> {
        let first_id = self.next_id;
        let built = sites
            .iter()
            .enumerate()
            .map(|(offset, &site)| {
                let id = EmitterId(first_id + offset as u64);
                self.build(kind, id, self.config.sites.apply(site))
                    .map(|emitter| (id, emitter))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.emitters.clear();
        self.next_id = first_id + sites.len() as u64;
        let ids = built.iter().map(|(id, _)| *id).collect();
        self.emitters.extend(built);

        log::debug!("Rebuilt {} {:?} emitters from spawn sites", sites.len(), kind);
        Ok(ids)
    }

    /// Move every emitter, in id order, to its transformed site.
    ///
    /// The site count must match the emitter count. All sites are validated
    /// before any emitter moves.
    pub fn sync_spawn_sites(&mut self, sites: &[Vec3]) -> Result<(), EffectsError> {
        if sites.len() != self.emitters.len() {
            return Err(EffectsError::SpawnSiteMismatch {
                expected: self.emitters.len(),
                got: sites.len(),
            });
        }

        let transform = self.config.sites;
        for (emitter, &site) in self.emitters.values().zip(sites) {
            emitter.accepts(transform.apply(site))?;
        }
        for (emitter, &site) in self.emitters.values_mut().zip(sites) {
            emitter.set_position(transform.apply(site))?;
        }
        Ok(())
    }

    /// Step every emitter once
    pub fn update(&mut self, time: f32, dt: f32, camera_position: Vec3) -> ParticleUpdate {
        let frame = FrameInput::new(time, dt, camera_position);

        let mut active_particles = 0;
        for emitter in self.emitters.values_mut() {
            emitter.update_with(&frame);
            active_particles += emitter.active_particles();
        }

        ParticleUpdate {
            active_particles,
            active_emitters: self.emitters.len(),
        }
    }

    /// Build each emitter's instance buffer and submit it, in id order
    pub fn render<S: RenderSink + ?Sized>(&mut self, camera_position: Vec3, sink: &mut S) {
        let options = self.config.render;

        for (&id, emitter) in &self.emitters {
            prepare_instances(
                emitter.particles(),
                camera_position,
                &options,
                &mut self.render_buffer,
            );
            sink.submit(RenderBatch {
                emitter: id,
                model: emitter.model(),
                instances: &self.render_buffer,
            });
        }
    }

    /// Get statistics about the particle system
    pub fn stats(&self) -> ParticleSystemStats {
        let mut stats = ParticleSystemStats::default();
        let mut capacity = 0;

        for emitter in self.emitters.values() {
            let live = emitter.active_particles();
            match emitter.kind() {
                EmitterKind::Foam => {
                    stats.foam_particles += live;
                    stats.foam_emitters += 1;
                }
                EmitterKind::Fountain => {
                    stats.fountain_particles += live;
                    stats.fountain_emitters += 1;
                }
            }
            capacity += emitter.capacity();
        }

        stats.total_particles = stats.foam_particles + stats.fountain_particles;
        stats.capacity_used = if capacity == 0 {
            0.0
        } else {
            stats.total_particles as f32 / capacity as f32
        };
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FountainSettings;
    use crate::particles::FountainParams;

    fn seeded_config() -> EffectsConfig {
        EffectsConfig {
            seed: Some(1234),
            fountain: FountainSettings {
                capacity: 40,
                params: FountainParams {
                    height_threshold: 2.0,
                    ..FountainParams::default()
                },
            },
            ..EffectsConfig::default()
        }
    }

    #[test]
    fn test_particle_system() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(3));

        let fountain = system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();
        let foam = system.add_emitter(EmitterKind::Foam, Vec3::new(5.0, 0.0, 5.0)).unwrap();
        assert_ne!(fountain, foam);

        let update = system.update(0.0, 0.016, Vec3::new(0.0, 2.0, 8.0));
        assert_eq!(update.active_emitters, 2);
        assert_eq!(update.active_particles, 30 + 30);

        let update = system.update(0.016, 0.016, Vec3::new(0.0, 2.0, 8.0));
        assert_eq!(update.active_particles, 40 + 60);

        system.remove_emitter(foam).unwrap();
        let update = system.update(0.032, 0.016, Vec3::ZERO);
        assert_eq!(update.active_emitters, 1);
        assert_eq!(update.active_particles, 40);

        assert!(matches!(
            system.remove_emitter(foam),
            Err(EffectsError::UnknownEmitter(id)) if id == foam
        ));
    }

    #[test]
    fn test_add_rejects_degenerate_site() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(0));
        let result = system.add_emitter(EmitterKind::Fountain, Vec3::new(0.0, 2.0, 0.0));

        assert!(matches!(
            result,
            Err(EffectsError::Emitter(EmitterError::DegenerateLifeBand { .. }))
        ));
        assert!(system.is_empty());
    }

    #[test]
    fn test_rebuild_from_sites() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(0));
        system.add_emitter(EmitterKind::Foam, Vec3::ZERO).unwrap();

        let sites = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.5, 0.0), Vec3::new(3.0, 0.1, 0.0)];
        let ids = system.rebuild_from_sites(EmitterKind::Fountain, &sites).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(system.len(), 3);
        let stats = system.stats();
        assert_eq!(stats.fountain_emitters, 3);
        assert_eq!(stats.foam_emitters, 0);
        for (id, site) in ids.iter().zip(&sites) {
            assert_eq!(system.get(*id).unwrap().position(), *site);
        }
    }

    #[test]
    fn test_rebuild_is_atomic() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(0));
        let kept = system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();

        // Second site sits exactly on the height threshold
        let sites = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 0.0)];
        assert!(system.rebuild_from_sites(EmitterKind::Fountain, &sites).is_err());

        assert_eq!(system.ids().collect::<Vec<_>>(), vec![kept]);
    }

    #[test]
    fn test_sync_spawn_sites() {
        let mut config = seeded_config();
        config.sites.scale = Vec3::new(2.0, 1.0, 2.0);
        let mut system = ParticleSystem::new(config, ModelHandle(0));
        let a = system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();
        let b = system.add_emitter(EmitterKind::Foam, Vec3::ZERO).unwrap();
        system.update(0.0, 0.016, Vec3::ZERO);

        system
            .sync_spawn_sites(&[Vec3::new(1.0, 0.2, 1.0), Vec3::new(-1.0, 0.4, 3.0)])
            .unwrap();
        assert_eq!(system.get(a).unwrap().position(), Vec3::new(2.0, 0.2, 2.0));
        assert_eq!(system.get(b).unwrap().position(), Vec3::new(-2.0, 0.4, 6.0));
        // Moving an emitter keeps its particles
        assert_eq!(system.get(a).unwrap().active_particles(), 30);

        assert!(matches!(
            system.sync_spawn_sites(&[Vec3::ZERO]),
            Err(EffectsError::SpawnSiteMismatch { expected: 2, got: 1 })
        ));

        // Fountain site on its threshold: nothing moves
        let result = system.sync_spawn_sites(&[Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO]);
        assert!(result.is_err());
        assert_eq!(system.get(b).unwrap().position(), Vec3::new(-2.0, 0.4, 6.0));
    }

    #[test]
    fn test_render_submits_each_emitter() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(9));
        let a = system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();
        let b = system.add_emitter(EmitterKind::Foam, Vec3::new(0.0, 0.0, 4.0)).unwrap();
        system.update(0.0, 0.016, Vec3::ZERO);

        let mut batches = Vec::new();
        let mut sink = |batch: RenderBatch<'_>| {
            batches.push((batch.emitter, batch.model, batch.instances.len()));
        };
        system.render(Vec3::new(0.0, 1.0, 10.0), &mut sink);

        assert_eq!(batches, vec![(a, ModelHandle(9), 30), (b, ModelHandle(9), 30)]);
    }

    #[test]
    fn test_seeded_systems_are_deterministic() {
        let run = || {
            let mut system = ParticleSystem::new(seeded_config(), ModelHandle(0));
            system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();
            system.add_emitter(EmitterKind::Foam, Vec3::ONE).unwrap();
            for frame in 0..10 {
                system.update(frame as f32 * 0.02, 0.02, Vec3::new(0.0, 1.0, 6.0));
            }
            system
                .ids()
                .flat_map(|id| system.get(id).unwrap().particles().to_vec())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_stats() {
        let mut system = ParticleSystem::new(seeded_config(), ModelHandle(0));
        assert_eq!(system.stats().capacity_used, 0.0);

        system.add_emitter(EmitterKind::Fountain, Vec3::ZERO).unwrap();
        system.update(0.0, 0.016, Vec3::ZERO);

        let stats = system.stats();
        assert_eq!(stats.total_particles, 30);
        assert_eq!(stats.fountain_particles, 30);
        assert!((stats.capacity_used - 0.75).abs() < 1e-6);
    }
}
