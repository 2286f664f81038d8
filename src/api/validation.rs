use super::ApiError;

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

/// Listing limits above the cap are rejected, not clamped.
pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 100;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

/// Chilean plate format: uppercase letters and digits with an optional
/// hyphen, 5 to 8 characters total.
pub fn validate_license_plate(plate: &str) -> Result<&str, ApiError> {
    let trimmed = plate.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("License plate cannot be empty"));
    }

    if !(5..=8).contains(&trimmed.len()) {
        return Err(ApiError::validation(
            "License plate must be between 5 and 8 characters",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::validation(
            "License plate can only contain uppercase letters, digits, and hyphens",
        ));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "entry").is_ok());
        assert!(validate_id(12345, "entry").is_ok());
        assert!(validate_id(0, "entry").is_err());
        assert!(validate_id(-1, "entry").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(50).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
        assert!(validate_limit(1000).is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABCD-12").is_ok());
        assert!(validate_license_plate("AB-1234").is_ok());
        assert!(validate_license_plate("  ABCD-12  ").is_ok());
        assert!(validate_license_plate("").is_err());
        assert!(validate_license_plate("AB").is_err());
        assert!(validate_license_plate("abcd-12").is_err());
        assert!(validate_license_plate("ABCD-1234-X").is_err());
    }
}
