//! Zero-phase Butterworth filtering.
//!
//! Filters are 4th-order Butterworth designs realised as two cascaded biquad
//! sections (bilinear transform with frequency pre-warping) and applied
//! forward then backward, so the net phase response is zero and no time shift
//! is introduced. The signal is extended at both ends by odd reflection and
//! each pass starts from the filter's steady state, which keeps the edges free
//! of start-up transients.

use std::f64::consts::PI;

use tracing::{debug, instrument};

use crate::error::{TextureError, ensure_finite, ensure_sample_rate};

pub const FILTER_ORDER: usize = 4;
pub const HIGHPASS_MIN_HZ: f32 = 10.0;
pub const LOWPASS_MIN_HZ: f32 = 1_000.0;
/// Distance kept between any cutoff and the Nyquist frequency.
pub const NYQUIST_MARGIN_HZ: f32 = 10.0;

/// Pole quality factors of a 4th-order Butterworth prototype.
const BUTTERWORTH_Q: [f64; 2] = [0.541_196_100_146_197, 1.306_562_964_876_377];
/// Reflection length used at each edge: three times the transfer-function length.
const EDGE_PAD: usize = 3 * (FILTER_ORDER + 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    HighPass,
    LowPass,
}

impl FilterKind {
    fn min_cutoff_hz(self) -> f32 {
        match self {
            Self::HighPass => HIGHPASS_MIN_HZ,
            Self::LowPass => LOWPASS_MIN_HZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (self.a[0] + self.a[1] + self.a[2])
    }

    fn process(&self, data: &mut [f64], mut z1: f64, mut z2: f64) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        for sample in data {
            let x = *sample;
            let y = b0 * x + z1;
            z1 = b1 * x - a1 * y + z2;
            z2 = b2 * x - a2 * y;
            *sample = y;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    pub kind: FilterKind,
    pub cutoff_hz: f32,
    pub sections: [Biquad; 2],
}

impl FilterCoefficients {
    pub fn design(
        kind: FilterKind,
        sample_rate: u32,
        cutoff_hz: f32,
    ) -> Result<Self, TextureError> {
        let sample_rate = ensure_sample_rate(sample_rate)?;
        let requested = ensure_finite("cutoff_hz", cutoff_hz)?;

        let nyquist = sample_rate as f32 / 2.0;
        let cutoff = requested
            .max(kind.min_cutoff_hz())
            .min(nyquist - NYQUIST_MARGIN_HZ);
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(TextureError::invalid(
                "cutoff_hz",
                format!("cutoff {cutoff} Hz is outside (0, {nyquist}) Hz"),
            ));
        }

        let k = (PI * f64::from(cutoff) / f64::from(sample_rate)).tan();
        let k2 = k * k;
        let sections = BUTTERWORTH_Q.map(|q| {
            let norm = 1.0 / (1.0 + k / q + k2);
            let a = [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - k / q + k2) * norm];
            let b = match kind {
                FilterKind::LowPass => {
                    let b0 = k2 * norm;
                    [b0, 2.0 * b0, b0]
                }
                FilterKind::HighPass => [norm, -2.0 * norm, norm],
            };
            Biquad { b, a }
        });

        Ok(Self {
            kind,
            cutoff_hz: cutoff,
            sections,
        })
    }

    #[must_use]
    pub fn transfer_function(&self) -> ([f64; FILTER_ORDER + 1], [f64; FILTER_ORDER + 1]) {
        let [first, second] = self.sections;
        (convolve(first.b, second.b), convolve(first.a, second.a))
    }

    #[must_use]
    pub fn apply_zero_phase(&self, samples: &[f32]) -> Vec<f32> {
        let len = samples.len();
        if len == 0 {
            return Vec::new();
        }

        let pad = EDGE_PAD.min(len - 1);
        let first = f64::from(samples[0]);
        let last = f64::from(samples[len - 1]);

        let mut extended = Vec::with_capacity(len + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - f64::from(samples[i])));
        extended.extend(samples.iter().map(|&sample| f64::from(sample)));
        extended.extend((1..=pad).map(|i| 2.0 * last - f64::from(samples[len - 1 - i])));

        self.run_from_steady_state(&mut extended);
        extended.reverse();
        self.run_from_steady_state(&mut extended);
        extended.reverse();

        extended[pad..pad + len]
            .iter()
            .map(|&sample| sample as f32)
            .collect()
    }

    fn run_from_steady_state(&self, data: &mut [f64]) {
        let Some(&initial) = data.first() else {
            return;
        };

        // Input level seen by each section when the cascade has settled.
        let mut level = initial;
        for section in &self.sections {
            let gain = section.dc_gain();
            let z1 = (gain - section.b[0]) * level;
            let z2 = (section.b[2] - section.a[2] * gain) * level;
            section.process(data, z1, z2);
            level *= gain;
        }
    }
}

fn convolve(left: [f64; 3], right: [f64; 3]) -> [f64; FILTER_ORDER + 1] {
    let mut out = [0.0; FILTER_ORDER + 1];
    for (i, l) in left.iter().enumerate() {
        for (j, r) in right.iter().enumerate() {
            out[i + j] += l * r;
        }
    }
    out
}

/// Zero-phase high-pass. The cutoff is clamped to `[10 Hz, nyquist - 10 Hz]`.
#[instrument(skip(samples), fields(len = samples.len()))]
pub fn highpass(
    samples: &[f32],
    sample_rate: u32,
    cutoff_hz: f32,
) -> Result<Vec<f32>, TextureError> {
    let coefficients = FilterCoefficients::design(FilterKind::HighPass, sample_rate, cutoff_hz)?;
    let filtered = coefficients.apply_zero_phase(samples);
    debug!(cutoff_hz = coefficients.cutoff_hz, "high-pass applied");
    Ok(filtered)
}

/// Zero-phase low-pass. The cutoff is clamped to `[1000 Hz, nyquist - 10 Hz]`.
#[instrument(skip(samples), fields(len = samples.len()))]
pub fn lowpass(
    samples: &[f32],
    sample_rate: u32,
    cutoff_hz: f32,
) -> Result<Vec<f32>, TextureError> {
    let coefficients = FilterCoefficients::design(FilterKind::LowPass, sample_rate, cutoff_hz)?;
    let filtered = coefficients.apply_zero_phase(samples);
    debug!(cutoff_hz = coefficients.cutoff_hz, "low-pass applied");
    Ok(filtered)
}
