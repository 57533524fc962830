use std::f32::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{signal::Signal, time::seconds_to_samples};

#[must_use]
pub fn sine(frequency_hz: f32, seconds: f32, sample_rate: u32, amplitude: f32) -> Signal {
    let len = seconds_to_samples(f64::from(seconds), sample_rate);
    let samples = (0..len)
        .map(|i| (TAU * frequency_hz * i as f32 / sample_rate as f32).sin() * amplitude)
        .collect();
    Signal::new(samples, sample_rate)
}

#[must_use]
pub fn silence(seconds: f32, sample_rate: u32) -> Signal {
    Signal::new(
        vec![0.0; seconds_to_samples(f64::from(seconds), sample_rate)],
        sample_rate,
    )
}

#[must_use]
pub fn seeded_noise(seconds: f32, sample_rate: u32, amplitude: f32, seed: u64) -> Signal {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = seconds_to_samples(f64::from(seconds), sample_rate);
    let samples = (0..len)
        .map(|_| rng.gen_range(-1.0_f32..=1.0) * amplitude)
        .collect();
    Signal::new(samples, sample_rate)
}

/// Stream-like recording: broadband noise under a few drifting partials, with
/// a slow swell so grains differ in level.
#[must_use]
pub fn field_recording(seconds: f32, sample_rate: u32, seed: u64) -> Signal {
    let noise = seeded_noise(seconds, sample_rate, 0.25, seed);
    let partials = [(196.0_f32, 0.20_f32), (311.0, 0.12), (1_870.0, 0.05)];
    let rate = sample_rate as f32;

    let samples = noise
        .samples
        .iter()
        .enumerate()
        .map(|(i, &hiss)| {
            let t = i as f32 / rate;
            let swell = 0.6 + 0.4 * (TAU * 0.25 * t).sin();
            let tones: f32 = partials
                .iter()
                .map(|&(frequency, level)| (TAU * frequency * t).sin() * level)
                .sum();
            (hiss + tones) * swell
        })
        .collect();
    Signal::new(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_noise_is_reproducible() {
        let a = seeded_noise(0.1, 48_000, 0.5, 7);
        let b = seeded_noise(0.1, 48_000, 0.5, 7);
        assert_eq!(a, b);
        assert_ne!(a, seeded_noise(0.1, 48_000, 0.5, 8));
    }

    #[test]
    fn sine_has_requested_length_and_level() {
        let tone = sine(440.0, 0.5, 48_000, 0.8);
        assert_eq!(tone.len(), 24_000);
        assert!(tone.peak() <= 0.8 + 1e-6);
        assert!(tone.peak() > 0.79);
    }
}
