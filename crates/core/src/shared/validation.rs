use thiserror::Error;

/// Rejection of an incomplete or inconsistent record at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidTime { field: &'static str, value: f64 },
    #[error("end ({end}) must be greater than start ({start})")]
    EmptyWindow { start: f64, end: f64 },
}

/// Checks a `[start, end)` time window in seconds.
pub fn check_window(start: f64, end: f64) -> Result<(), ValidationError> {
    if !start.is_finite() || start < 0.0 {
        return Err(ValidationError::InvalidTime {
            field: "start",
            value: start,
        });
    }
    if !end.is_finite() {
        return Err(ValidationError::InvalidTime {
            field: "end",
            value: end,
        });
    }
    if end <= start {
        return Err(ValidationError::EmptyWindow { start, end });
    }
    Ok(())
}
