/// Resamples `input` to exactly `output_len` samples with 4-point Hermite
/// interpolation. End points map onto end points.
#[must_use]
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return Vec::new();
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let last = input.len() - 1;
    let ratio = last as f64 / (output_len.max(2) - 1) as f64;

    (0..output_len)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = (position as usize).min(last);
            let frac = (position - index as f64) as f32;

            let s0 = input[index.saturating_sub(1)];
            let s1 = input[index];
            let s2 = input[(index + 1).min(last)];
            let s3 = input[(index + 2).min(last)];

            let c1 = 0.5 * (s2 - s0);
            let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
            let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);
            ((c3 * frac + c2) * frac + c1) * frac + s1
        })
        .collect()
}

#[must_use]
pub fn resample_to_rate(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return input.to_vec();
    }

    let output_len =
        (input.len() as f64 * f64::from(to_rate) / f64::from(from_rate)).round() as usize;
    resample_cubic(input, output_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_length_preserves_samples() {
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin()).collect();
        let output = resample_cubic(&input, input.len());
        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn rate_conversion_scales_length() {
        let input = vec![0.0_f32; 44_100];
        assert_eq!(resample_to_rate(&input, 44_100, 48_000).len(), 48_000);
        assert_eq!(resample_to_rate(&input, 48_000, 48_000).len(), 44_100);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(resample_cubic(&[], 10).is_empty());
        assert_eq!(resample_cubic(&[0.5], 3), vec![0.5, 0.5, 0.5]);
        assert_eq!(resample_cubic(&[0.1, 0.2], 1), vec![0.1]);
    }
}
