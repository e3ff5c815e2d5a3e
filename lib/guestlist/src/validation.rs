//! Guest submission validation
//!
//! Checks run in a fixed order and stop at the first failure: presence of
//! every required field, non-empty names, then `person_id`, `quantity` and
//! `phone` formats. Presence only means the key holds a string or number; an
//! empty `phone` is an invalid phone, an empty `email` is accepted.

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{GuestSubmission, NewGuest};

const PERSON_ID_LEN: std::ops::RangeInclusive<usize> = 5..=20;
const PHONE_LEN: std::ops::RangeInclusive<usize> = 9..=10;

/// Validate a raw submission into a typed guest.
pub fn validate(submission: &GuestSubmission) -> Result<NewGuest, ValidationError> {
    let person_id = required("person_id", &submission.person_id)?;
    let first_name = required("first_name", &submission.first_name)?;
    let last_name = required("last_name", &submission.last_name)?;
    let quantity = required("quantity", &submission.quantity)?;
    let phone = required("phone", &submission.phone)?;
    let email = required("email", &submission.email)?;

    non_empty("first_name", &first_name)?;
    non_empty("last_name", &last_name)?;

    if !(PERSON_ID_LEN.contains(&person_id.len()) && all_digits(&person_id)) {
        return Err(ValidationError::InvalidId);
    }

    let quantity = parse_quantity(&quantity)?;

    if !(PHONE_LEN.contains(&phone.len()) && phone.starts_with('0') && all_digits(&phone)) {
        return Err(ValidationError::InvalidPhone);
    }

    Ok(NewGuest {
        person_id,
        first_name,
        last_name,
        phone,
        email,
        quantity,
    })
}

fn required(name: &'static str, value: &Option<Value>) -> Result<String, ValidationError> {
    value
        .as_ref()
        .and_then(as_text)
        .ok_or(ValidationError::MissingField(name))
}

fn non_empty(name: &'static str, text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyName(name));
    }
    Ok(())
}

/// Strings pass through; numbers become their decimal text. Anything else is absent.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

fn parse_quantity(raw: &str) -> Result<u64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(quantity) if quantity > 0 => Ok(quantity as u64),
        _ => Err(ValidationError::InvalidQuantity),
    }
}
