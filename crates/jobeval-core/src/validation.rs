//! Input validation for posting text.

use crate::types::StageError;

/// Reject empty or whitespace-only posting text.
pub fn validate_posting(text: &str) -> Result<(), StageError> {
    if text.trim().is_empty() {
        return Err(StageError::validation("Job posting text is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn test_empty_and_whitespace_rejected() {
        for text in ["", " ", "\n\t  \r\n"] {
            let err = validate_posting(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ValidationError);
        }
    }

    #[test]
    fn test_text_accepted() {
        assert!(validate_posting("Senior Engineer at Acme").is_ok());
        assert!(validate_posting("  x  ").is_ok());
    }
}
