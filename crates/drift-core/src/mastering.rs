use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::{TextureError, ensure_finite},
    signal::{EPSILON, peak},
};

pub const DEFAULT_CEILING_DB: f32 = -1.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimiterConfig {
    pub enabled: bool,
    pub ceiling_db: f32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ceiling_db: DEFAULT_CEILING_DB,
        }
    }
}

#[must_use]
pub fn db_to_linear(db: f32) -> f32 {
    10_f32.powf(db / 20.0)
}

pub(crate) fn scale_to_peak(samples: &[f32], target_peak: f32) -> Vec<f32> {
    let gain = target_peak / (peak(samples) + EPSILON);
    samples.iter().map(|sample| sample * gain).collect()
}

#[instrument(skip(samples), fields(len = samples.len()))]
pub fn limit(samples: &[f32], ceiling_db: f32) -> Result<Vec<f32>, TextureError> {
    let ceiling = db_to_linear(ensure_finite("ceiling_db", ceiling_db)?);
    let limited = scale_to_peak(samples, ceiling);
    debug!(ceiling, "limiter applied");
    Ok(limited)
}

#[instrument(skip(samples), fields(len = samples.len()))]
pub fn normalize(samples: &[f32], target_peak: f32) -> Result<Vec<f32>, TextureError> {
    let target_peak = ensure_finite("target_peak", target_peak)?;
    if target_peak < 0.0 {
        return Err(TextureError::invalid(
            "target_peak",
            format!("{target_peak} is negative"),
        ));
    }
    Ok(scale_to_peak(samples, target_peak))
}
