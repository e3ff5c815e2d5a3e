//! Guestlist - guest registration service
//!
//! Guests register with identifying details and receive a record keyed by a
//! generated sequence id. Staff can list, fetch and remove records.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

pub mod config;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use guestlist::GuestlistError;
pub use server::{create_router, run};
