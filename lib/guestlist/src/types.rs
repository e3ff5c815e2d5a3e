//! Guestlist data types and wire formats

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored guest registration, keyed by `sequence_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub sequence_id: String,
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub quantity: u64,
}

impl GuestRecord {
    pub fn from_new(sequence_id: String, guest: NewGuest) -> Self {
        Self {
            sequence_id,
            person_id: guest.person_id,
            first_name: guest.first_name,
            last_name: guest.last_name,
            phone: guest.phone,
            email: guest.email,
            quantity: guest.quantity,
        }
    }

    /// Text form of a field, as it is persisted.
    pub fn field_value(&self, field: GuestField) -> String {
        match field {
            GuestField::SequenceId => self.sequence_id.clone(),
            GuestField::PersonId => self.person_id.clone(),
            GuestField::FirstName => self.first_name.clone(),
            GuestField::LastName => self.last_name.clone(),
            GuestField::Phone => self.phone.clone(),
            GuestField::Email => self.email.clone(),
            GuestField::Quantity => self.quantity.to_string(),
        }
    }

    /// Persisted representation: every field as text.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        GuestField::ALL
            .iter()
            .map(|field| (field.as_str(), self.field_value(*field)))
            .collect()
    }
}

/// A submission that passed validation but has no sequence id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuest {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestField {
    SequenceId,
    PersonId,
    FirstName,
    LastName,
    Phone,
    Email,
    Quantity,
}

impl GuestField {
    pub const ALL: [GuestField; 7] = [
        GuestField::SequenceId,
        GuestField::PersonId,
        GuestField::FirstName,
        GuestField::LastName,
        GuestField::Phone,
        GuestField::Email,
        GuestField::Quantity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuestField::SequenceId => "sequence_id",
            GuestField::PersonId => "person_id",
            GuestField::FirstName => "first_name",
            GuestField::LastName => "last_name",
            GuestField::Phone => "phone",
            GuestField::Email => "email",
            GuestField::Quantity => "quantity",
        }
    }
}

/// Raw guest payload as posted by clients.
///
/// Fields are loosely typed: strings and numbers are both accepted and
/// converted to text before validation. The legacy names `id`, `firstname`
/// and `surname` are accepted too; when both spellings are sent the current
/// name wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct GuestSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
}

impl From<Map<String, Value>> for GuestSubmission {
    fn from(mut fields: Map<String, Value>) -> Self {
        let mut take = |name: &str, legacy: Option<&str>| {
            let current = fields.remove(name);
            let legacy = legacy.and_then(|legacy| fields.remove(legacy));
            current.or(legacy)
        };

        Self {
            person_id: take("person_id", Some("id")),
            first_name: take("first_name", Some("firstname")),
            last_name: take("last_name", Some("surname")),
            quantity: take("quantity", None),
            phone: take("phone", None),
            email: take("email", None),
        }
    }
}

// ==================== API Responses ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Conflict,
    InternalError,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGuestResponse {
    pub message: String,
    pub guest: GuestRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
