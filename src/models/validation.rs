use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;

use super::{DrinkItem, ValidationError, ValidationResult, MONEY_SCALE};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Buyers must be strictly older than this to order alcohol.
// Product still has to confirm whether 18 itself should pass.
pub const ALCOHOL_AGE_THRESHOLD: i32 = 18;

pub const MAX_DRINK_NAME_LENGTH: usize = 100;

impl Validate for DrinkItem {
    fn validate(&self) -> ValidationResult<()> {
        validate_drink_id(self.id)?;
        validate_drink_name(&self.name)?;
        validate_unit_price(&self.unit_price)?;
        Ok(())
    }
}

/// Age gate: true only when an age is present and strictly greater than 18
pub fn is_age_eligible(age: Option<i32>) -> bool {
    matches!(age, Some(age) if age > ALCOHOL_AGE_THRESHOLD)
}

/// Interpret a submitted age value.
///
/// Integers (or strings holding an integer) in `i32` range are accepted.
/// Anything else is treated as no age at all rather than an error.
pub fn parse_age(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(text) => parse_age_input(text),
        _ => None,
    }
}

/// Interpret a raw text age field, e.g. from a form input
pub fn parse_age_input(input: &str) -> Option<i32> {
    input.trim().parse::<i32>().ok()
}

/// Validate that a catalog is non-empty, has unique ids and well-formed entries
pub fn validate_catalog(catalog: &[DrinkItem]) -> ValidationResult<()> {
    if catalog.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }

    let mut seen = HashSet::new();
    for item in catalog {
        item.validate()?;
        if !seen.insert(item.id) {
            return Err(ValidationError::DuplicateId { id: item.id });
        }
    }

    Ok(())
}

/// Validate drink id
pub fn validate_drink_id(id: u32) -> ValidationResult<()> {
    if id == 0 {
        return Err(ValidationError::InvalidValue {
            field: "drink_id".to_string(),
            value: id.to_string(),
            reason: "Drink id must be a positive integer".to_string(),
        });
    }

    Ok(())
}

/// Validate drink display name
pub fn validate_drink_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > MAX_DRINK_NAME_LENGTH {
        return Err(ValidationError::InvalidValue {
            field: "drink_name".to_string(),
            value: name.to_string(),
            reason: format!("Name must be 1 to {} characters", MAX_DRINK_NAME_LENGTH),
        });
    }

    Ok(())
}

/// Validate unit price
pub fn validate_unit_price(price: &Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::InvalidValue {
            field: "unit_price".to_string(),
            value: price.to_string(),
            reason: "Price cannot be negative".to_string(),
        });
    }

    if price.scale() > MONEY_SCALE {
        return Err(ValidationError::InvalidValue {
            field: "unit_price".to_string(),
            value: price.to_string(),
            reason: "Price cannot have more than 2 decimal places".to_string(),
        });
    }

    Ok(())
}
