#[must_use]
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    if seconds <= 0.0 || !seconds.is_finite() {
        return 0;
    }

    (seconds * f64::from(sample_rate)).round() as usize
}

#[must_use]
pub fn ms_to_samples(milliseconds: f64, sample_rate: u32) -> usize {
    seconds_to_samples(milliseconds / 1_000.0, sample_rate)
}

#[must_use]
pub fn samples_to_seconds(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }

    samples as f64 / f64::from(sample_rate)
}

#[must_use]
pub fn estimate_buffer_bytes(seconds: f64, sample_rate: u32) -> u64 {
    seconds_to_samples(seconds, sample_rate) as u64 * std::mem::size_of::<f32>() as u64
}
