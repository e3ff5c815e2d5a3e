//! Guestlist Error Types

use thiserror::Error;

/// A rejected guest submission. Only the first violation is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    #[error("person_id must be 5 to 20 digits")]
    InvalidId,

    #[error("Quantity must be a positive number")]
    InvalidQuantity,

    #[error("Phone must be 9 or 10 digits starting with 0")]
    InvalidPhone,
}

impl ValidationError {
    /// Name of the submission field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(name) | ValidationError::EmptyName(name) => name,
            ValidationError::InvalidId => "person_id",
            ValidationError::InvalidQuantity => "quantity",
            ValidationError::InvalidPhone => "phone",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum GuestlistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Guest already exists: {0}")]
    DuplicatePerson(String),

    #[error("Sequence id collision: {0}")]
    IdentifierCollision(String),

    #[error("Guest not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_fields() {
        assert_eq!(ValidationError::MissingField("email").field(), "email");
        assert_eq!(ValidationError::EmptyName("last_name").field(), "last_name");
        assert_eq!(ValidationError::InvalidId.field(), "person_id");
        assert_eq!(ValidationError::InvalidQuantity.field(), "quantity");
        assert_eq!(ValidationError::InvalidPhone.field(), "phone");
    }

    #[test]
    fn test_missing_field_display() {
        let err = ValidationError::MissingField("surname");
        assert_eq!(err.to_string(), "Missing field: surname");
    }

    #[test]
    fn test_guestlist_error_validation_is_transparent() {
        let err: GuestlistError = ValidationError::InvalidPhone.into();
        assert_eq!(
            err.to_string(),
            "Phone must be 9 or 10 digits starting with 0"
        );
    }

    #[test]
    fn test_store_error_corrupt_display() {
        let err = StoreError::Corrupt {
            key: "guestlist:guest:abc".to_string(),
            reason: "missing quantity".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt record guestlist:guest:abc: missing quantity"
        );
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_store_error_redis_display() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let err = StoreError::Redis(redis_err);
        assert!(err.to_string().starts_with("Redis error:"));
    }

    #[test]
    fn test_guestlist_error_from_store_error() {
        let err: GuestlistError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(err, GuestlistError::Store(_)));
    }
}
