use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::damping::REFERENCE_DT;

/// How much velocity survives one update.
///
/// `PerFrame` applies the retention factor once per call regardless of `dt`,
/// so the effective drag depends on frame rate. `TimeScaled` raises the
/// factor to `dt / reference_dt`, which matches `PerFrame` exactly when the
/// frame takes `reference_dt` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum DampingLaw {
    PerFrame { retention: f32 },
    TimeScaled { retention: f32, reference_dt: f32 },
}

impl DampingLaw {
    pub const fn per_frame(retention: f32) -> Self {
        DampingLaw::PerFrame { retention }
    }

    pub const fn time_scaled(retention: f32) -> Self {
        DampingLaw::TimeScaled {
            retention,
            reference_dt: REFERENCE_DT,
        }
    }

    pub fn retention(&self) -> f32 {
        match *self {
            DampingLaw::PerFrame { retention } | DampingLaw::TimeScaled { retention, .. } => {
                retention
            }
        }
    }

    /// Factor applied to a velocity for a step of `dt` seconds
    pub fn factor(&self, dt: f32) -> f32 {
        match *self {
            DampingLaw::PerFrame { retention } => retention,
            DampingLaw::TimeScaled {
                retention,
                reference_dt,
            } => retention.powf(dt / reference_dt),
        }
    }

    pub fn apply(&self, velocity: Vec3, dt: f32) -> Vec3 {
        velocity * self.factor(dt)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let retention = self.retention();
        if !(retention > 0.0 && retention <= 1.0) {
            return Err(format!("damping retention {retention} must be in (0, 1]"));
        }
        if let DampingLaw::TimeScaled { reference_dt, .. } = *self {
            if !(reference_dt > 0.0 && reference_dt.is_finite()) {
                return Err(format!("damping reference_dt {reference_dt} must be positive"));
            }
        }
        Ok(())
    }
}
