use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::TextureError,
    filter::{highpass, lowpass},
    granular::{GranularConfig, extend_with_rng},
    looping::{LoopConfig, make_seamless_loop},
    mastering::{LimiterConfig, limit, scale_to_peak},
    pitch::{NoPitchShift, PitchShifter, ResamplingPitchShifter},
    reverb::{Freeverb, NoReverb, ReverbConfig, ReverbUnit, apply_ambience},
    signal::{DEFAULT_TARGET_PEAK, Signal},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub hpf_hz: f32,
    pub lpf_hz: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hpf_hz: 80.0,
            lpf_hz: 15_000.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    pub filter: FilterConfig,
    pub granular: GranularConfig,
    pub reverb: ReverbConfig,
    pub limiter: LimiterConfig,
    #[serde(rename = "loop")]
    pub looping: LoopConfig,
}

pub struct TexturePipeline {
    reverb: Box<dyn ReverbUnit>,
    pitch: Box<dyn PitchShifter>,
}

impl Default for TexturePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TexturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TexturePipeline").finish_non_exhaustive()
    }
}

impl TexturePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reverb: Box::new(Freeverb::default()),
            pitch: Box::new(ResamplingPitchShifter),
        }
    }

    #[must_use]
    pub fn bare() -> Self {
        Self {
            reverb: Box::new(NoReverb),
            pitch: Box::new(NoPitchShift),
        }
    }

    #[must_use]
    pub fn with_reverb(mut self, reverb: impl ReverbUnit + 'static) -> Self {
        self.reverb = Box::new(reverb);
        self
    }

    #[must_use]
    pub fn with_pitch_shifter(mut self, pitch: impl PitchShifter + 'static) -> Self {
        self.pitch = Box::new(pitch);
        self
    }

    /// Filter, optional extension, optional reverb, optional limiter, then a
    /// final peak normalisation. The first failing stage aborts the chain.
    #[instrument(
        skip(self, signal, config, rng),
        fields(len = signal.len(), sample_rate = signal.sample_rate)
    )]
    pub fn process_texture<R: Rng + ?Sized>(
        &self,
        signal: &Signal,
        config: &TextureConfig,
        rng: &mut R,
    ) -> Result<Signal, TextureError> {
        signal.validate()?;
        let sample_rate = signal.sample_rate;

        let mut samples = highpass(&signal.samples, sample_rate, config.filter.hpf_hz)?;
        samples = lowpass(&samples, sample_rate, config.filter.lpf_hz)?;

        if config.granular.enabled {
            let params = config
                .granular
                .extend_params(signal.duration_seconds() as f32);
            samples = extend_with_rng(&samples, sample_rate, &params, self.pitch.as_ref(), rng)?;
        }

        if config.reverb.enabled {
            samples = apply_ambience(
                self.reverb.as_ref(),
                &samples,
                sample_rate,
                &config.reverb.params(),
            )?;
        }

        if config.limiter.enabled {
            samples = limit(&samples, config.limiter.ceiling_db)?;
        }

        let samples = scale_to_peak(&samples, DEFAULT_TARGET_PEAK);
        debug!(len = samples.len(), "texture processed");
        Ok(Signal::new(samples, sample_rate))
    }

    #[instrument(skip(self, signal, config, rng), fields(len = signal.len()))]
    pub fn render<R: Rng + ?Sized>(
        &self,
        signal: &Signal,
        config: &TextureConfig,
        rng: &mut R,
    ) -> Result<Signal, TextureError> {
        let mut processed = self.process_texture(signal, config, rng)?;
        if config.looping.enabled {
            processed.samples = make_seamless_loop(
                &processed.samples,
                processed.sample_rate,
                config.looping.crossfade_ms,
            )?;
        }

        info!(
            input_samples = signal.len(),
            output_samples = processed.len(),
            "texture render complete"
        );
        Ok(processed)
    }
}

pub fn process_texture(
    samples: &[f32],
    sample_rate: u32,
    config: &TextureConfig,
) -> Result<Vec<f32>, TextureError> {
    let signal = Signal::new(samples.to_vec(), sample_rate);
    TexturePipeline::new()
        .process_texture(&signal, config, &mut rand::thread_rng())
        .map(|processed| processed.samples)
}

pub fn render_texture(signal: &Signal, config: &TextureConfig) -> Result<Signal, TextureError> {
    TexturePipeline::new().render(signal, config, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_options() {
        let config = TextureConfig::default();
        assert_eq!(config.filter.hpf_hz, 80.0);
        assert_eq!(config.filter.lpf_hz, 15_000.0);
        assert!(!config.granular.enabled);
        assert_eq!(config.granular.grain_ms, 300.0);
        assert_eq!(config.granular.overlap, 0.75);
        assert_eq!(config.granular.rand_pos, 0.10);
        assert_eq!(config.granular.pitch_rand_semitones, 0.10);
        assert!(!config.reverb.enabled);
        assert_eq!(config.reverb.room, 0.25);
        assert_eq!(config.reverb.wet, 0.07);
        assert_eq!(config.reverb.damping, 0.2);
        assert!(config.limiter.enabled);
        assert_eq!(config.limiter.ceiling_db, -1.0);
        assert!(!config.looping.enabled);
        assert_eq!(config.looping.crossfade_ms, 150.0);
    }

    #[test]
    fn invalid_signal_is_rejected_before_processing() {
        let signal = Signal::new(vec![0.0, f32::NAN, 0.0], 48_000);
        let result = TexturePipeline::new().process_texture(
            &signal,
            &TextureConfig::default(),
            &mut rand::thread_rng(),
        );
        assert!(matches!(
            result,
            Err(TextureError::InvalidParameter { name: "samples", .. })
        ));
    }
}
