//! Guestlist registration library
//!
//! Types, validation, record stores and the registration service shared by
//! the guestlist HTTP service.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

pub mod error;
pub mod memory_store;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod registration;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{GuestlistError, StoreError, ValidationError};
pub use memory_store::MemoryRecordStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisRecordStore;
pub use registration::{RegistrationService, SequenceIdGenerator, random_sequence_id};
pub use store::{DEFAULT_SCAN_PAGE_SIZE, DeleteOutcome, PutOutcome, RecordStore, ScanPage};
pub use types::{
    CreateGuestResponse, ErrorCode, ErrorResponse, GuestField, GuestRecord, GuestSubmission,
    HealthResponse, MessageResponse, NewGuest, ReadyResponse,
};
pub use validation::validate;
