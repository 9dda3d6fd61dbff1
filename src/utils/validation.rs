use crate::utils::error::{PoolError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// PositiveIntegerField 的上限，數量與門檻都不能超過
pub const MAX_QUANTITY: i64 = i32::MAX as i64;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 255;
pub const PRICE_DECIMAL_PLACES: u32 = 2;
pub const PRICE_MAX_DIGITS: u32 = 12;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        )
        .unwrap()
    })
}

/// 驗證並正規化買家 email：去除前後空白，domain 轉小寫
pub fn validate_email(field_name: &str, email: &str) -> Result<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(PoolError::validation(field_name, "Email cannot be empty"));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(PoolError::validation(
            field_name,
            format!("Email must be at most {} characters", MAX_EMAIL_LENGTH),
        ));
    }

    if !email_regex().is_match(trimmed) {
        return Err(PoolError::validation(
            field_name,
            format!("'{}' is not a valid email address", trimmed),
        ));
    }

    Ok(normalize_email(trimmed))
}

pub fn normalize_email(email: &str) -> String {
    let trimmed = email.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

/// 驗證正整數 (數量、門檻)，回傳可存的 u32
pub fn validate_quantity(field_name: &str, value: i64) -> Result<u32> {
    validate_range(field_name, value, 1, MAX_QUANTITY)?;
    Ok(value as u32)
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PoolError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_max_length(field_name: &str, value: &str, max_length: usize) -> Result<()> {
    if value.chars().count() > max_length {
        return Err(PoolError::validation(
            field_name,
            format!("Value must be at most {} characters", max_length),
        ));
    }
    Ok(())
}

/// 單價：非負、最多兩位小數、總位數不超過 12
pub fn validate_price(field_name: &str, price: Decimal) -> Result<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PoolError::validation(field_name, "Price cannot be negative"));
    }

    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(PoolError::validation(
            field_name,
            format!("Price allows at most {} decimal places", PRICE_DECIMAL_PLACES),
        ));
    }

    let integer_digits = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;
    let ceiling = Decimal::from(10_i64.pow(integer_digits));
    if price >= ceiling {
        return Err(PoolError::validation(
            field_name,
            format!("Price allows at most {} digits", PRICE_MAX_DIGITS),
        ));
    }

    let mut stored = price.abs();
    stored.rescale(PRICE_DECIMAL_PLACES);
    Ok(stored)
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PoolError::validation(field_name, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(PoolError::validation(field_name, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| PoolError::ConfigError {
        message: format!("Missing required field: {}", field_name),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PoolError::validation(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("email", "a@x.com").unwrap(), "a@x.com");
        assert_eq!(
            validate_email("email", "  Buyer.One@Example.COM ").unwrap(),
            "Buyer.One@example.com"
        );
        assert!(validate_email("email", "first+tag@mail.example.org").is_ok());

        assert!(validate_email("email", "").is_err());
        assert!(validate_email("email", "no-at-sign").is_err());
        assert!(validate_email("email", "two@@x.com").is_err());
        assert!(validate_email("email", "a@localhost").is_err());
        assert!(validate_email("email", ".a@x.com").is_err());
        assert!(validate_email("email", "a..b@x.com").is_err());
        assert!(validate_email("email", "a@-x.com").is_err());
        assert!(validate_email("email", "a b@x.com").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity("quantity", 1).unwrap(), 1);
        assert_eq!(validate_quantity("quantity", MAX_QUANTITY).unwrap(), i32::MAX as u32);
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -3).is_err());
        assert!(validate_quantity("quantity", MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price() {
        let price = validate_price("unit_price", Decimal::from_str("19.9").unwrap()).unwrap();
        assert_eq!(price.to_string(), "19.90");

        let zero = validate_price("unit_price", Decimal::ZERO).unwrap();
        assert_eq!(zero.to_string(), "0.00");

        assert!(validate_price("unit_price", Decimal::from_str("1.500").unwrap()).is_ok());
        assert!(validate_price("unit_price", Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_price("unit_price", Decimal::from_str("1.999").unwrap()).is_err());
        assert!(validate_price("unit_price", Decimal::from_str("10000000000").unwrap()).is_err());
        assert!(validate_price("unit_price", Decimal::from_str("9999999999.99").unwrap()).is_ok());
    }

    #[test]
    fn test_validate_strings() {
        assert!(validate_non_empty_string("name", "Rice cooker").is_ok());
        assert!(validate_non_empty_string("name", "   ").is_err());
        assert!(validate_max_length("name", "abc", 3).is_ok());
        assert!(validate_max_length("name", "abcd", 3).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("./data.json".to_string());
        assert_eq!(validate_required_field("store.path", &present).unwrap(), "./data.json");
        assert!(validate_required_field::<String>("store.path", &None).is_err());
    }
}
