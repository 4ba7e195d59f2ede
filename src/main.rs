//! Headless wave-effects driver
//! Spawns fountains on the crests of a travelling sine wave and foam at its
//! base, then logs what a renderer would receive each frame.

use anyhow::{Context, Result};
use glam::Vec3;

use wave_fx::particles::{highest_sites, RenderBatch, RenderSink, SiteTransform};
use wave_fx::{EffectsConfig, EmitterKind, ModelHandle, ParticleSystem};

const FRAMES: u32 = 240;
const DT: f32 = 1.0 / 60.0;
const GRID: usize = 16;
const WAVE_AMPLITUDE: f32 = 0.4;
const WAVE_LENGTH: f32 = 6.0;
const WAVE_SPEED: f32 = 1.5;
const CREST_COUNT: usize = 50;

/// Counts what would be submitted to the GPU
#[derive(Default)]
struct LoggingSink {
    batches: usize,
    instances: usize,
    max_instances: usize,
}

impl RenderSink for LoggingSink {
    fn submit(&mut self, batch: RenderBatch<'_>) {
        log::debug!(
            "Emitter {} (model {:?}): {} instances",
            batch.emitter,
            batch.model,
            batch.instances.len()
        );
        self.batches += 1;
        self.instances += batch.instances.len();
        self.max_instances = self.max_instances.max(batch.instances.len());
    }
}

fn wave_height(vertex: Vec3, time: f32) -> f32 {
    let phase = (vertex.x - WAVE_SPEED * time) / WAVE_LENGTH * std::f32::consts::TAU;
    WAVE_AMPLITUDE * phase.sin()
}

fn surface_grid() -> Vec<Vec3> {
    (0..GRID * GRID)
        .map(|i| Vec3::new((i % GRID) as f32, 0.0, (i / GRID) as f32))
        .collect()
}

/// Rest-position vertices currently under a crest
fn crest_sites(vertices: &[Vec3], count: usize, time: f32) -> Vec<Vec3> {
    highest_sites(vertices, |v| wave_height(v, time), count)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EffectsConfig::load(&path)
            .with_context(|| format!("Failed to load effects config from {}", path))?,
        None => EffectsConfig {
            // The surface mesh is drawn at twice its vertex spacing
            sites: SiteTransform {
                scale: Vec3::new(2.0, 1.0, 2.0),
            },
            ..EffectsConfig::default()
        },
    };
    log::info!("Starting wave effects demo ({} frames)", FRAMES);

    let vertices = surface_grid();
    let camera = Vec3::new(GRID as f32, 6.0, GRID as f32 * 4.0);

    let mut fountains = ParticleSystem::new(config.clone(), ModelHandle(1));
    fountains.rebuild_from_sites(EmitterKind::Fountain, &crest_sites(&vertices, CREST_COUNT, 0.0))?;

    let mut foam = ParticleSystem::new(config, ModelHandle(2));
    for z in 0..GRID {
        let site = Vec3::new(GRID as f32 * 0.5, -WAVE_AMPLITUDE, z as f32);
        foam.add_emitter(EmitterKind::Foam, site)?;
    }

    let mut sink = LoggingSink::default();
    let mut peak = 0;
    for frame in 0..FRAMES {
        let time = frame as f32 * DT;

        fountains.sync_spawn_sites(&crest_sites(&vertices, CREST_COUNT, time))?;

        let sprayed = fountains.update(time, DT, camera);
        let drifted = foam.update(time, DT, camera);
        peak = peak.max(sprayed.active_particles + drifted.active_particles);

        fountains.render(camera, &mut sink);
        foam.render(camera, &mut sink);

        if frame % 60 == 0 {
            log::info!(
                "Frame {}: {} spray particles, {} foam particles",
                frame,
                sprayed.active_particles,
                drifted.active_particles
            );
        }
    }

    let spray = fountains.stats();
    let surf = foam.stats();
    log::info!(
        "Done: {} batches, {} instances submitted (largest batch {}), peak {} live particles",
        sink.batches,
        sink.instances,
        sink.max_instances,
        peak
    );
    log::info!(
        "Fountains {:.0}% full, foam {:.0}% full",
        spray.capacity_used * 100.0,
        surf.capacity_used * 100.0
    );

    Ok(())
}
