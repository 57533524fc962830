use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TextureError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("insufficient signal: {provided} samples provided, {minimum} required")]
    InsufficientSignal { provided: usize, minimum: usize },
    #[error("capability unavailable: {0}")]
    DependencyUnavailable(&'static str),
}

impl TextureError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f32) -> Result<f32, TextureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TextureError::invalid(name, format!("expected a finite value, got {value}")))
    }
}

pub(crate) fn ensure_unit_range(name: &'static str, value: f32) -> Result<f32, TextureError> {
    let value = ensure_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(TextureError::invalid(name, format!("{value} is outside [0, 1]")))
    }
}

pub(crate) fn ensure_sample_rate(sample_rate: u32) -> Result<u32, TextureError> {
    if sample_rate == 0 {
        return Err(TextureError::invalid(
            "sample_rate",
            "sample rate must be greater than zero",
        ));
    }
    Ok(sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_range_rejects_out_of_bounds() {
        assert!(ensure_unit_range("wet", 0.3).is_ok());
        assert!(matches!(
            ensure_unit_range("wet", 1.5),
            Err(TextureError::InvalidParameter { name: "wet", .. })
        ));
        assert!(ensure_unit_range("wet", f32::NAN).is_err());
    }

    #[test]
    fn zero_sample_rate_is_invalid() {
        assert!(ensure_sample_rate(0).is_err());
        assert_eq!(ensure_sample_rate(48_000), Ok(48_000));
    }
}
