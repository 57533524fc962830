use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{pipeline::TextureConfig, signal::Signal};

const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderReport {
    pub schema_version: u32,
    pub seed: Option<u64>,
    pub sample_rate: u32,
    pub input_samples: usize,
    pub output_samples: usize,
    pub input_seconds: f64,
    pub output_seconds: f64,
    pub output_peak: f32,
    pub config: TextureConfig,
    /// SHA-256 of the output quantized to 24-bit little-endian PCM.
    pub audio_hash: String,
}

#[instrument(
    skip(input, output, config),
    fields(input_len = input.len(), output_len = output.len())
)]
#[must_use]
pub fn build_render_report(
    input: &Signal,
    output: &Signal,
    config: &TextureConfig,
    seed: Option<u64>,
) -> RenderReport {
    RenderReport {
        schema_version: REPORT_SCHEMA_VERSION,
        seed,
        sample_rate: output.sample_rate,
        input_samples: input.len(),
        output_samples: output.len(),
        input_seconds: input.duration_seconds(),
        output_seconds: output.duration_seconds(),
        output_peak: output.peak(),
        config: config.clone(),
        audio_hash: audio_hash(&output.samples),
    }
}

#[must_use]
pub fn audio_hash(samples: &[f32]) -> String {
    const FULL_SCALE: f32 = 8_388_607.0;

    let mut hasher = Sha256::new();
    for sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * FULL_SCALE).round() as i32;
        hasher.update(&quantized.to_le_bytes()[..3]);
    }
    format!("{:x}", hasher.finalize())
}

pub fn read_render_report(path: &Path) -> Result<RenderReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read render report: {}", path.display()))?;
    let report: RenderReport =
        serde_json::from_slice(&bytes).context("failed to parse render report json")?;
    Ok(report)
}

pub fn write_render_report(path: &Path, report: &RenderReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(report).context("failed to encode render report json")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write render report: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_sub_quantum_noise() {
        let a = [0.25_f32, -0.5, 0.125];
        let b = [0.25_f32 + 1e-9, -0.5, 0.125];
        assert_eq!(audio_hash(&a), audio_hash(&b));
        assert_ne!(audio_hash(&a), audio_hash(&[0.25, -0.5]));
    }
}
