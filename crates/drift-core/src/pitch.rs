use crate::{error::TextureError, resample::resample_cubic};

/// Largest shift, in either direction, a varispeed grain is read at.
pub const MAX_SHIFT_SEMITONES: f32 = 24.0;

pub trait PitchShifter: Send + Sync {
    fn shift(
        &self,
        grain: &[f32],
        sample_rate: u32,
        semitones: f32,
    ) -> Result<Vec<f32>, TextureError>;
}

/// Varispeed shifter: reads the grain faster or slower, which moves pitch and
/// duration together.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResamplingPitchShifter;

impl PitchShifter for ResamplingPitchShifter {
    fn shift(
        &self,
        grain: &[f32],
        _sample_rate: u32,
        semitones: f32,
    ) -> Result<Vec<f32>, TextureError> {
        if !semitones.is_finite() || semitones.abs() > MAX_SHIFT_SEMITONES {
            return Err(TextureError::invalid(
                "semitones",
                format!("{semitones} exceeds ±{MAX_SHIFT_SEMITONES} semitones"),
            ));
        }
        if semitones == 0.0 || grain.is_empty() {
            return Ok(grain.to_vec());
        }

        let ratio = 2_f64.powf(f64::from(semitones) / 12.0);
        let output_len = ((grain.len() as f64 / ratio).round() as usize).max(1);
        Ok(resample_cubic(grain, output_len))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPitchShift;

impl PitchShifter for NoPitchShift {
    fn shift(&self, _: &[f32], _: u32, _: f32) -> Result<Vec<f32>, TextureError> {
        Err(TextureError::DependencyUnavailable("pitch-shift"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_up_halves_length() {
        let grain = vec![0.1_f32; 1_000];
        let shifted = ResamplingPitchShifter
            .shift(&grain, 48_000, 12.0)
            .expect("shift should succeed");
        assert_eq!(shifted.len(), 500);
    }

    #[test]
    fn zero_shift_is_identity() {
        let grain: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let shifted = ResamplingPitchShifter
            .shift(&grain, 48_000, 0.0)
            .expect("shift should succeed");
        assert_eq!(shifted, grain);
    }

    #[test]
    fn extreme_shifts_are_rejected() {
        let grain = vec![0.1_f32; 64];
        for semitones in [-300.0, 25.0, f32::NAN] {
            assert!(matches!(
                ResamplingPitchShifter.shift(&grain, 48_000, semitones),
                Err(TextureError::InvalidParameter {
                    name: "semitones",
                    ..
                })
            ));
        }
        assert!(
            ResamplingPitchShifter
                .shift(&grain, 48_000, -MAX_SHIFT_SEMITONES)
                .is_ok()
        );
    }

    #[test]
    fn unavailable_shifter_reports_dependency() {
        assert_eq!(
            NoPitchShift.shift(&[0.0; 4], 48_000, 1.0),
            Err(TextureError::DependencyUnavailable("pitch-shift"))
        );
    }
}
