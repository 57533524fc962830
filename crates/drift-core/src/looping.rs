//! Seamless loop construction.
//!
//! The signal is trimmed to its first and last zero crossings, then the last
//! `crossfade` samples are faded out and folded onto the faded-in head. The
//! final sample of the result is followed, in the source, by the sample that
//! now opens the loop, so playing the clip back to back has no seam.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::{TextureError, ensure_finite, ensure_sample_rate},
    mastering::scale_to_peak,
    signal::DEFAULT_TARGET_PEAK,
    time::ms_to_samples,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoopConfig {
    pub enabled: bool,
    pub crossfade_ms: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            crossfade_ms: 150.0,
        }
    }
}

fn sign(sample: f32) -> i8 {
    if sample > 0.0 {
        1
    } else if sample < 0.0 {
        -1
    } else {
        0
    }
}

fn is_crossing(pair: &[f32]) -> bool {
    sign(pair[0]) != sign(pair[1])
}

#[must_use]
pub fn first_zero_crossing(samples: &[f32]) -> Option<usize> {
    samples.windows(2).position(is_crossing)
}

#[must_use]
pub fn last_zero_crossing(samples: &[f32]) -> Option<usize> {
    samples.windows(2).rposition(is_crossing)
}

/// Builds a loop-able clip. Never fails on short material: a signal without
/// sign changes comes back unchanged and one too short to crossfade comes back
/// trimmed only.
///
/// The spliced clip is normalised to [`DEFAULT_TARGET_PEAK`], keeping the
/// mastering headroom, rather than to full scale.
#[instrument(skip(samples), fields(len = samples.len()))]
pub fn make_seamless_loop(
    samples: &[f32],
    sample_rate: u32,
    crossfade_ms: f32,
) -> Result<Vec<f32>, TextureError> {
    let sample_rate = ensure_sample_rate(sample_rate)?;
    let crossfade_ms = ensure_finite("crossfade_ms", crossfade_ms)?;
    if crossfade_ms < 0.0 {
        return Err(TextureError::invalid(
            "crossfade_ms",
            format!("{crossfade_ms} is negative"),
        ));
    }

    let Some(start) = first_zero_crossing(samples) else {
        debug!("no zero crossing found, loop left unchanged");
        return Ok(samples.to_vec());
    };
    let end = match last_zero_crossing(samples) {
        Some(end) if end > start => end,
        _ => samples.len(),
    };

    let trimmed = &samples[start..end];
    let crossfade = ms_to_samples(f64::from(crossfade_ms), sample_rate);
    match splice(trimmed, crossfade) {
        Ok(looped) => {
            debug!(start, end, crossfade, len = looped.len(), "loop constructed");
            Ok(looped)
        }
        Err(error) => {
            debug!(%error, "loop too short to crossfade, returning trimmed signal");
            Ok(trimmed.to_vec())
        }
    }
}

fn splice(trimmed: &[f32], crossfade: usize) -> Result<Vec<f32>, TextureError> {
    let minimum = 2 * crossfade;
    if trimmed.len() < minimum {
        return Err(TextureError::InsufficientSignal {
            provided: trimmed.len(),
            minimum,
        });
    }
    if crossfade == 0 {
        return Ok(scale_to_peak(trimmed, DEFAULT_TARGET_PEAK));
    }

    let body_len = trimmed.len() - crossfade;
    let mut looped = trimmed[..body_len].to_vec();
    let tail = &trimmed[body_len..];
    let denom = (crossfade - 1).max(1) as f32;

    for (i, (head, &tail_sample)) in looped.iter_mut().zip(tail).enumerate() {
        let fade_in = if crossfade == 1 { 0.0 } else { i as f32 / denom };
        *head = *head * fade_in + tail_sample * (1.0 - fade_in);
    }

    Ok(scale_to_peak(&looped, DEFAULT_TARGET_PEAK))
}
