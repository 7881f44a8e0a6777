use crate::error::{CoreError, CoreResult};

/// Landmark feature vector for one frame, checked against the length the
/// model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    values: Vec<f32>,
}

impl LandmarkFrame {
    /// Requires exactly `expected_len` finite values.
    pub fn new(values: Vec<f32>, expected_len: usize) -> CoreResult<Self> {
        if values.len() != expected_len {
            return Err(CoreError::InvalidInput(format!(
                "expected {expected_len} landmark values, got {}",
                values.len()
            )));
        }
        Self::checked(values)
    }

    /// Like [`LandmarkFrame::new`] but zero-fills a short vector, e.g. one
    /// hand's landmarks sent to a model trained on two-hand input.
    pub fn padded(mut values: Vec<f32>, expected_len: usize) -> CoreResult<Self> {
        if values.len() > expected_len {
            return Err(CoreError::InvalidInput(format!(
                "expected at most {expected_len} landmark values, got {}",
                values.len()
            )));
        }
        values.resize(expected_len, 0.0);
        Self::checked(values)
    }

    pub fn build(values: Vec<f32>, expected_len: usize, pad_short: bool) -> CoreResult<Self> {
        if pad_short {
            Self::padded(values, expected_len)
        } else {
            Self::new(values, expected_len)
        }
    }

    fn checked(values: Vec<f32>) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::InvalidInput("no landmark values".into()));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::InvalidInput(format!(
                "landmark value at index {index} is not finite"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_length_is_rejected() {
        let err = LandmarkFrame::new(vec![0.1; 42], 63).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn short_frame_is_zero_padded() {
        let frame = LandmarkFrame::padded(vec![0.5; 42], 84).unwrap();
        assert_eq!(frame.len(), 84);
        assert_eq!(frame.values()[41], 0.5);
        assert_eq!(frame.values()[42], 0.0);
    }

    #[test]
    fn padding_never_truncates() {
        assert!(LandmarkFrame::padded(vec![0.5; 85], 84).is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut values = vec![0.0; 63];
        values[10] = f32::NAN;
        assert!(LandmarkFrame::new(values, 63).is_err());
    }
}
