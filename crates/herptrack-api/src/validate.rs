//! Field validation at the API boundary. Everything here runs before any
//! store call, so the engine and the store only ever see in-range values.

use rust_decimal::Decimal;

use crate::ApiError;

pub fn animal_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }
    if name.chars().count() > 255 {
        return Err(ApiError::validation(
            "name",
            "name must be at most 255 characters",
        ));
    }
    Ok(name.to_string())
}

/// Shared bound for breed and morph.
pub fn label(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.chars().count() > 255 {
        return Err(ApiError::validation(
            field,
            format!("{field} must be at most 255 characters"),
        ));
    }
    Ok(())
}

pub fn weight(value: Decimal) -> Result<(), ApiError> {
    let min = Decimal::new(1, 2); // 0.01
    let max = Decimal::new(999_999_999, 2); // 9999999.99
    if value < min || value > max {
        return Err(ApiError::validation(
            "weight",
            "weight must be between 0.01 and 9999999.99",
        ));
    }
    Ok(())
}

pub fn feeding_frequency(days: i64) -> Result<(), ApiError> {
    if !(1..=365).contains(&days) {
        return Err(ApiError::validation(
            "feeding_frequency_days",
            "feeding frequency must be between 1 and 365 days",
        ));
    }
    Ok(())
}

pub fn notes(value: &str) -> Result<(), ApiError> {
    if value.chars().count() > 1000 {
        return Err(ApiError::validation(
            "notes",
            "notes must be at most 1000 characters",
        ));
    }
    Ok(())
}

pub fn username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username", "username is required"));
    }
    if username.chars().count() > 255 {
        return Err(ApiError::validation(
            "username",
            "username must be at most 255 characters",
        ));
    }
    Ok(username.to_string())
}

pub fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim();
    let well_formed = email.chars().count() <= 255
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if !well_formed {
        return Err(ApiError::validation("email", "email is not well-formed"));
    }
    Ok(email.to_string())
}

pub fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < 6 {
        return Err(ApiError::validation(
            "password",
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn field_of(err: ApiError) -> &'static str {
        match err {
            ApiError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(animal_name("  Nagini  ").unwrap(), "Nagini");
        assert_eq!(field_of(animal_name("   ").unwrap_err()), "name");
        assert_eq!(field_of(animal_name(&"x".repeat(256)).unwrap_err()), "name");
        assert!(animal_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        assert!(weight(dec!(0.01)).is_ok());
        assert!(weight(dec!(9999999.99)).is_ok());
        assert!(weight(dec!(0.00)).is_err());
        assert!(weight(dec!(10000000.00)).is_err());
    }

    #[test]
    fn feeding_frequency_bounds_are_inclusive() {
        assert!(feeding_frequency(1).is_ok());
        assert!(feeding_frequency(365).is_ok());
        assert!(feeding_frequency(0).is_err());
        assert!(feeding_frequency(366).is_err());
    }

    #[test]
    fn notes_are_bounded() {
        assert!(notes(&"n".repeat(1000)).is_ok());
        assert_eq!(field_of(notes(&"n".repeat(1001)).unwrap_err()), "notes");
    }

    #[test]
    fn emails_need_local_part_and_dotted_domain() {
        assert!(email("sam@example.com").is_ok());
        assert_eq!(email("  sam@example.com ").unwrap(), "sam@example.com");
        assert!(email("sam").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("sam@example").is_err());
        assert!(email("sam@.com").is_err());
        assert!(email("sam@example.com.").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(password("secret").is_ok());
        assert_eq!(field_of(password("12345").unwrap_err()), "password");
    }
}
