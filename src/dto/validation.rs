//! Validation helpers for client-supplied identifiers.

use validator::ValidationError;

const MAX_ID_LENGTH: usize = 64;

/// Validates a table or room identifier: 1 to 64 characters drawn from
/// ASCII alphanumerics, `-` and `_`.
pub fn validate_resource_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        let mut err = ValidationError::new("resource_id_length");
        err.message = Some(
            format!(
                "identifier must be 1 to {MAX_ID_LENGTH} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        let mut err = ValidationError::new("resource_id_format");
        err.message = Some("identifier may contain only letters, digits, `-` and `_`".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_resource_id_valid() {
        assert!(validate_resource_id("t1").is_ok());
        assert!(validate_resource_id("room_42").is_ok());
        assert!(validate_resource_id("9f8a2c4e-1b7d-4f3a-9c0e-5d6b7a8f9e0d").is_ok());
    }

    #[test]
    fn test_validate_resource_id_invalid_length() {
        assert!(validate_resource_id("").is_err());
        assert!(validate_resource_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_resource_id_invalid_format() {
        assert!(validate_resource_id("table one").is_err()); // space
        assert!(validate_resource_id("table:one").is_err()); // would break channel naming
        assert!(validate_resource_id("t\u{e9}l\u{e9}").is_err()); // non-ascii
    }
}
