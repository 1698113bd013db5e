//! Boundary checks applied before a request reaches any store.

use rust_decimal::Decimal;

/// Quantities requested or received must be at least one unit.
pub fn validate_quantity(quantity: u32) -> Result<(), &'static str> {
    if quantity == 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Unit price must be positive");
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name must not be empty");
    }
    Ok(())
}

pub fn validate_reference(reference: &str) -> Result<(), &'static str> {
    if reference.trim().is_empty() {
        return Err("Reference must not be empty");
    }
    if reference.chars().any(char::is_whitespace) {
        return Err("Reference must not contain whitespace");
    }
    Ok(())
}
