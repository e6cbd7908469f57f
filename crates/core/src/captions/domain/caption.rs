use crate::shared::validation::{check_window, ValidationError};

/// Display text bound to the time window in which it is shown.
#[derive(Clone, Debug, PartialEq)]
pub struct Caption {
    text: String,
    start: f64,
    end: f64,
}

impl Caption {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "caption text",
            });
        }
        check_window(start, end)?;
        Ok(Self { text, start, end })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_and_duration() {
        let c = Caption::new("Hello world", 1.0, 2.5).unwrap();
        assert_eq!(c.text(), "Hello world");
        assert_eq!(c.start(), 1.0);
        assert_eq!(c.end(), 2.5);
        assert_eq!(c.duration(), 1.5);
    }

    #[test]
    fn test_blank_text_rejected() {
        assert_eq!(
            Caption::new("  ", 0.0, 1.0),
            Err(ValidationError::Empty {
                field: "caption text"
            })
        );
    }

    #[test]
    fn test_empty_window_rejected() {
        assert!(Caption::new("x", 1.0, 1.0).is_err());
    }
}
