//! Configuration and domain field validation

use config::ConfigError;
use serde::{Deserialize, Serialize};

/// Trait for validating configuration values
pub trait ValidateConfig: Serialize + for<'de> Deserialize<'de> {
    /// Validate the configuration
    ///
    /// Returns Ok(()) if valid, or an error describing what's wrong
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Common validation helpers
pub mod validators {
    use config::ConfigError;

    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::Message(format!("{field}: cannot be empty")));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn validate_url(url: &str, field: &str) -> Result<(), ConfigError> {
        url::Url::parse(url)
            .map_err(|e| ConfigError::Message(format!("{field}: invalid URL - {e}")))?;
        Ok(())
    }

    /// Validate that a value is within range
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<(), ConfigError> {
        if value < min || value > max {
            return Err(ConfigError::Message(format!(
                "{field}: must be between {min} and {max}"
            )));
        }
        Ok(())
    }
}

/// Basic email shape check: exactly one `@` with text on both sides
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.trim().split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && domain.contains('.'),
        _ => false,
    }
}

/// Validate a DEA registration number against the registrant's last name
///
/// Separators and case are ignored. The number must be nine characters:
/// a registrant-type letter `A`..=`H`, the last-name initial, then seven
/// digits where `(d1 + d3 + d5) + 2 * (d2 + d4 + d6)` ends in `d7`.
pub fn is_valid_dea_number(dea_number: &str, last_name: &str) -> bool {
    let dea: Vec<char> = dea_number
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let Some(initial) = last_name.trim().chars().next().map(|c| c.to_ascii_uppercase()) else {
        return false;
    };

    if dea.len() != 9 {
        return false;
    }
    if !('A'..='H').contains(&dea[0]) || dea[1] != initial {
        return false;
    }

    let digits: Option<Vec<u32>> = dea[2..].iter().map(|c| c.to_digit(10)).collect();
    let Some(d) = digits else {
        return false;
    };

    let total = (d[0] + d[2] + d[4]) + 2 * (d[1] + d[3] + d[5]);
    total % 10 == d[6]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dea_requires_both_inputs() {
        assert!(!is_valid_dea_number("", "Smith"));
        assert!(!is_valid_dea_number("AS1234563", ""));
        assert!(!is_valid_dea_number("AS1234563", "   "));
    }

    #[test]
    fn test_dea_length_must_be_nine() {
        assert!(!is_valid_dea_number("AB123456", "Brown"));
        assert!(!is_valid_dea_number("AB12345678", "Brown"));
    }

    #[test]
    fn test_dea_registrant_letter_range() {
        assert!(!is_valid_dea_number("ZB1234567", "Brown"));
        assert!(!is_valid_dea_number("IB1234567", "Brown"));
    }

    #[test]
    fn test_dea_initial_must_match_last_name() {
        assert!(!is_valid_dea_number("AB1234567", "Clark"));
        assert!(!is_valid_dea_number("AD1234567", "Smith"));
    }

    #[test]
    fn test_dea_tail_must_be_digits() {
        assert!(!is_valid_dea_number("AS12X4567", "Smith"));
        assert!(!is_valid_dea_number("AS12345X7", "Smith"));
    }

    #[test]
    fn test_dea_checksum() {
        assert!(!is_valid_dea_number("AS1234567", "Smith"));
        assert!(is_valid_dea_number("AS1234563", "Smith"));
    }

    #[test]
    fn test_dea_normalises_input() {
        assert!(is_valid_dea_number("as-123-4563", "smith"));
        assert!(is_valid_dea_number(" aS1234563 ", "  smith  "));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("owner@practice.com"));
        assert!(!is_valid_email("owner.practice.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("@practice.com"));
    }

    #[test]
    fn test_validators() {
        assert!(validators::validate_not_empty("  ", "name").is_err());
        assert!(validators::validate_url("https://api.example.com", "url").is_ok());
        assert!(validators::validate_range(700_u64, 0, 600, "timeout").is_err());
    }
}
