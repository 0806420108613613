//! Field rules shared by tags, ingredients and recipes.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::error::DomainError;

pub const MAX_PRICE_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;
pub const MAX_LINK_LENGTH: usize = 255;

/// Trimmed, non-empty, at most `max` characters.
pub fn name(field: &str, value: &str, max: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "This field may not be blank."));
    }
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(value.to_owned())
}

pub fn link(value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.chars().count() > MAX_LINK_LENGTH {
        return Err(DomainError::validation(
            "link",
            format!("Ensure this field has no more than {MAX_LINK_LENGTH} characters."),
        ));
    }
    Ok(value.to_owned())
}

pub fn time_in_minutes(value: i32) -> Result<i32, DomainError> {
    if value < 0 {
        return Err(DomainError::validation(
            "time_in_minutes",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(value)
}

/// Non-negative, at most 5 digits with 2 decimal places. Returns hundredths.
pub fn price_cents(value: Decimal) -> Result<i64, DomainError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    let normalized = value.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(DomainError::validation(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        ));
    }
    let mut scaled = normalized;
    scaled.rescale(PRICE_DECIMAL_PLACES);
    let cents = i64::try_from(scaled.mantissa()).unwrap_or(i64::MAX);
    if cents >= 10_i64.pow(MAX_PRICE_DIGITS) {
        return Err(DomainError::validation(
            "price",
            format!("Ensure that there are no more than {MAX_PRICE_DIGITS} digits in total."),
        ));
    }
    Ok(cents.max(0))
}

pub fn price_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, PRICE_DECIMAL_PLACES)
}

/// Drops repeated ids, keeping first-seen order.
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(name("name", "  Salt ", 255).unwrap(), "Salt");
        assert!(matches!(
            name("name", "   ", 255),
            Err(DomainError::Validation { field, .. }) if field == "name"
        ));
        assert!(name("title", &"x".repeat(256), 255).is_err());
        assert!(name("title", &"x".repeat(255), 255).is_ok());
    }

    #[test]
    fn price_bounds() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(price_cents(d("5.25")).unwrap(), 525);
        assert_eq!(price_cents(d("5")).unwrap(), 500);
        assert_eq!(price_cents(d("5.500")).unwrap(), 550);
        assert_eq!(price_cents(d("999.99")).unwrap(), 99_999);
        assert_eq!(price_cents(d("0")).unwrap(), 0);
        assert!(price_cents(d("1000.00")).is_err());
        assert!(price_cents(d("1.234")).is_err());
        assert!(price_cents(d("-1")).is_err());
    }

    #[test]
    fn cents_round_trip_keeps_two_places() {
        assert_eq!(price_from_cents(500).to_string(), "5.00");
        assert_eq!(price_from_cents(525).to_string(), "5.25");
    }

    #[test]
    fn negative_time_is_rejected() {
        assert!(time_in_minutes(-1).is_err());
        assert_eq!(time_in_minutes(0).unwrap(), 0);
    }

    #[test]
    fn dedup_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[a, b, a]), vec![a, b]);
    }
}
