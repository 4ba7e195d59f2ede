use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maps a selected surface vertex to an emitter origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteTransform {
    /// Component-wise scale, e.g. to account for a scaled surface mesh
    pub scale: Vec3,
}

impl Default for SiteTransform {
    fn default() -> Self {
        Self { scale: Vec3::ONE }
    }
}

impl SiteTransform {
    pub fn apply(&self, vertex: Vec3) -> Vec3 {
        vertex * self.scale
    }
}

/// The `count` vertices standing highest according to `height_at`,
/// highest first. Ties keep their input order.
pub fn highest_sites<F>(vertices: &[Vec3], height_at: F, count: usize) -> Vec<Vec3>
where
    F: Fn(Vec3) -> f32,
{
    let mut ranked: Vec<(f32, Vec3)> = vertices.iter().map(|&v| (height_at(v), v)).collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(count);

    ranked.into_iter().map(|(_, v)| v).collect()
}
