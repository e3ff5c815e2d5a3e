//! Guest registration
//!
//! Orchestrates validation, duplicate detection, sequence id generation and
//! conditional insertion against a [`RecordStore`].
//!
//! `person_id` uniqueness is checked twice: first by scanning the store, then
//! atomically by the store's conditional insert. Two concurrent creates for the
//! same person can both pass the scan, but only one insert succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GuestlistError;
use crate::store::{DeleteOutcome, PutOutcome, RecordStore};
use crate::types::{GuestField, GuestRecord, GuestSubmission};
use crate::validation::validate;

/// Produces sequence ids for new records.
pub type SequenceIdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Random 128-bit identifier as hyphenated UUID v4 text.
pub fn random_sequence_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RecordStore>,
    next_sequence_id: SequenceIdGenerator,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_id_generator(store, Arc::new(random_sequence_id))
    }

    pub fn with_id_generator(
        store: Arc<dyn RecordStore>,
        next_sequence_id: SequenceIdGenerator,
    ) -> Self {
        Self {
            store,
            next_sequence_id,
        }
    }

    /// Register a guest. Nothing is written unless validation passes and the
    /// `person_id` is free.
    ///
    /// `IdentifierCollision` is not retried here; callers may resubmit.
    pub async fn create(
        &self,
        submission: &GuestSubmission,
    ) -> Result<GuestRecord, GuestlistError> {
        let guest = validate(submission)?;

        let existing = self
            .store
            .scan_filter(GuestField::PersonId, &guest.person_id)
            .await?;
        if !existing.is_empty() {
            tracing::info!("Rejected duplicate person_id {}", guest.person_id);
            return Err(GuestlistError::DuplicatePerson(guest.person_id));
        }

        let record = GuestRecord::from_new((self.next_sequence_id)(), guest);

        match self.store.put_if_absent(&record).await? {
            PutOutcome::Inserted => {
                tracing::info!("New guest created: {:?}", record);
                Ok(record)
            }
            PutOutcome::KeyExists => {
                tracing::warn!("Sequence id collision on {}", record.sequence_id);
                Err(GuestlistError::IdentifierCollision(record.sequence_id))
            }
            PutOutcome::PersonExists => {
                tracing::info!(
                    "Concurrent registration won for person_id {}",
                    record.person_id
                );
                Err(GuestlistError::DuplicatePerson(record.person_id))
            }
        }
    }

    /// Every live record keyed by `sequence_id`.
    pub async fn list(&self) -> Result<HashMap<String, GuestRecord>, GuestlistError> {
        let records = self.store.scan_all().await?;
        Ok(records
            .into_iter()
            .map(|record| (record.sequence_id.clone(), record))
            .collect())
    }

    pub async fn get(&self, sequence_id: &str) -> Result<GuestRecord, GuestlistError> {
        self.store
            .get(sequence_id)
            .await?
            .ok_or_else(|| GuestlistError::NotFound(sequence_id.to_string()))
    }

    pub async fn delete(&self, sequence_id: &str) -> Result<(), GuestlistError> {
        match self.store.delete_if_present(sequence_id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Guest deleted: {}", sequence_id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(GuestlistError::NotFound(sequence_id.to_string())),
        }
    }

    /// Readiness: the store answers a ping.
    pub async fn ready(&self) -> Result<(), GuestlistError> {
        self.store.ping().await?;
        Ok(())
    }
}
