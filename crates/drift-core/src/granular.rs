//! Granular overlap-add texture extension.
//!
//! Grains are drawn from random offsets of the source, Hann-windowed and
//! summed into an output buffer while the window itself is summed into a
//! parallel weight buffer. Dividing the two removes the overlap-dependent
//! gain modulation, so every covered output sample is a weighted average of
//! the grains that overlap it.

use std::{borrow::Cow, f64::consts::PI};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::{TextureError, ensure_finite, ensure_sample_rate},
    mastering::scale_to_peak,
    pitch::{PitchShifter, ResamplingPitchShifter},
    signal::{DEFAULT_TARGET_PEAK, EPSILON, fix_length},
    time::{ms_to_samples, seconds_to_samples},
};

pub const MIN_GRAIN_SAMPLES: usize = 32;
pub const MAX_RAND_POS: f32 = 1.0;
pub const MAX_PITCH_RAND_SEMITONES: f32 = 12.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GranularConfig {
    pub enabled: bool,
    /// `None` keeps the source duration.
    pub target_duration_s: Option<f32>,
    pub grain_ms: f32,
    pub overlap: f32,
    pub rand_pos: f32,
    pub pitch_rand_semitones: f32,
}

impl Default for GranularConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_duration_s: None,
            grain_ms: 300.0,
            overlap: 0.75,
            rand_pos: 0.10,
            pitch_rand_semitones: 0.10,
        }
    }
}

impl GranularConfig {
    #[must_use]
    pub fn extend_params(&self, source_duration_s: f32) -> ExtendParams {
        ExtendParams {
            target_duration_s: self.target_duration_s.unwrap_or(source_duration_s),
            grain_ms: self.grain_ms,
            overlap: self.overlap,
            rand_pos: self.rand_pos,
            pitch_rand_semitones: self.pitch_rand_semitones,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendParams {
    pub target_duration_s: f32,
    pub grain_ms: f32,
    pub overlap: f32,
    pub rand_pos: f32,
    pub pitch_rand_semitones: f32,
}

impl Default for ExtendParams {
    fn default() -> Self {
        GranularConfig::default().extend_params(30.0)
    }
}

impl ExtendParams {
    fn validate(&self) -> Result<(), TextureError> {
        let target = ensure_finite("target_duration_s", self.target_duration_s)?;
        if target < 0.0 {
            return Err(TextureError::invalid(
                "target_duration_s",
                format!("{target} is negative"),
            ));
        }

        let grain_ms = ensure_finite("grain_ms", self.grain_ms)?;
        if grain_ms <= 0.0 {
            return Err(TextureError::invalid(
                "grain_ms",
                format!("{grain_ms} must be positive"),
            ));
        }

        let overlap = ensure_finite("overlap", self.overlap)?;
        if !(0.0..1.0).contains(&overlap) {
            return Err(TextureError::invalid(
                "overlap",
                format!("{overlap} is outside [0, 1)"),
            ));
        }

        for (name, value, max) in [
            ("rand_pos", self.rand_pos, MAX_RAND_POS),
            (
                "pitch_rand_semitones",
                self.pitch_rand_semitones,
                MAX_PITCH_RAND_SEMITONES,
            ),
        ] {
            let value = ensure_finite(name, value)?;
            if !(0.0..=max).contains(&value) {
                return Err(TextureError::invalid(
                    name,
                    format!("{value} is outside [0, {max}]"),
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn grain_len(&self, sample_rate: u32) -> usize {
        ms_to_samples(f64::from(self.grain_ms), sample_rate).max(MIN_GRAIN_SAMPLES)
    }

    #[must_use]
    pub fn hop(&self, grain_len: usize) -> usize {
        ((grain_len as f64 * (1.0 - f64::from(self.overlap))).round() as usize).max(1)
    }

    /// Output length in samples; always longer than one grain.
    #[must_use]
    pub fn target_samples(&self, sample_rate: u32) -> usize {
        let grain_len = self.grain_len(sample_rate);
        seconds_to_samples(f64::from(self.target_duration_s), sample_rate).max(grain_len + 1)
    }
}

#[must_use]
pub fn hann_window(size: usize) -> Vec<f32> {
    match size {
        0 => return Vec::new(),
        1 => return vec![1.0],
        _ => {}
    }

    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos()) as f32)
        .collect()
}

pub fn extend(
    samples: &[f32],
    sample_rate: u32,
    params: &ExtendParams,
) -> Result<Vec<f32>, TextureError> {
    extend_with_rng(
        samples,
        sample_rate,
        params,
        &ResamplingPitchShifter,
        &mut rand::thread_rng(),
    )
}

/// Extends `samples` to `params.target_duration_s` drawing every random
/// choice from `rng`.
///
/// If `pitch` reports [`TextureError::DependencyUnavailable`], pitch jitter is
/// dropped for the rest of the call and the extension carries on.
#[instrument(skip(samples, pitch, rng), fields(len = samples.len()))]
pub fn extend_with_rng<R: Rng + ?Sized>(
    samples: &[f32],
    sample_rate: u32,
    params: &ExtendParams,
    pitch: &dyn PitchShifter,
    rng: &mut R,
) -> Result<Vec<f32>, TextureError> {
    let sample_rate = ensure_sample_rate(sample_rate)?;
    params.validate()?;

    let grain_len = params.grain_len(sample_rate);
    let hop = params.hop(grain_len);
    let target_samples = params.target_samples(sample_rate);

    let source: Cow<'_, [f32]> = if samples.len() < grain_len {
        Cow::Owned(fix_length(samples.to_vec(), grain_len))
    } else {
        Cow::Borrowed(samples)
    };

    let window = hann_window(grain_len);
    let mut output = vec![0.0_f32; target_samples];
    let mut weights = vec![0.0_f32; target_samples];

    let max_start = (source.len() - grain_len).max(1);
    let mut pitch_jitter = params.pitch_rand_semitones > 0.0;
    let mut grains = 0_usize;
    let mut pos = 0_usize;

    while pos < target_samples - grain_len {
        let mut start = rng.gen_range(0..max_start);
        if params.rand_pos > 0.0 {
            let jitter = rng.gen_range(-params.rand_pos..=params.rand_pos);
            let jittered = (start as f64 * (1.0 + f64::from(jitter))).max(0.0) as usize;
            start = jittered.min(max_start - 1);
        }

        let mut grain = Cow::Borrowed(&source[start..start + grain_len]);
        if pitch_jitter {
            let semitones =
                rng.gen_range(-params.pitch_rand_semitones..=params.pitch_rand_semitones);
            match pitch.shift(&grain, sample_rate, semitones) {
                Ok(shifted) => grain = Cow::Owned(fix_length(shifted, grain_len)),
                Err(TextureError::DependencyUnavailable(capability)) => {
                    warn!(capability, "pitch jitter skipped");
                    pitch_jitter = false;
                }
                Err(error) => return Err(error),
            }
        }

        let span = pos..pos + grain_len;
        for (((out, weight), &sample), &w) in output[span.clone()]
            .iter_mut()
            .zip(&mut weights[span])
            .zip(grain.iter())
            .zip(&window)
        {
            *out += sample * w;
            *weight += w;
        }

        grains += 1;
        pos += hop;
    }

    for (out, &weight) in output.iter_mut().zip(&weights) {
        *out /= weight.max(EPSILON);
    }

    debug!(
        grains,
        grain_len,
        hop,
        target_samples,
        "granular extension complete"
    );
    Ok(scale_to_peak(&output, DEFAULT_TARGET_PEAK))
}
