//! In-process record store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{DEFAULT_SCAN_PAGE_SIZE, DeleteOutcome, PutOutcome, RecordStore, ScanPage};
use crate::types::GuestRecord;

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, GuestRecord>,
    /// person_id -> sequence_id of the live record holding it
    persons: HashMap<String, String>,
}

/// Record store held in process memory. All conditional operations run under
/// one write lock, so they are atomic within the process.
pub struct MemoryRecordStore {
    state: RwLock<MemoryState>,
    page_size: usize,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_SCAN_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            page_size: page_size.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        let state = self.state.read().await;
        let lower = match cursor {
            Some(key) => Bound::Excluded(key.to_string()),
            None => Bound::Unbounded,
        };

        let mut remaining = state.records.range((lower, Bound::Unbounded));
        let records: Vec<GuestRecord> = remaining
            .by_ref()
            .take(limit.max(1))
            .map(|(_, record)| record.clone())
            .collect();

        let next_cursor = if remaining.next().is_some() {
            records.last().map(|r| r.sequence_id.clone())
        } else {
            None
        };

        Ok(ScanPage {
            records,
            next_cursor,
        })
    }

    async fn get(&self, sequence_id: &str) -> Result<Option<GuestRecord>, StoreError> {
        Ok(self.state.read().await.records.get(sequence_id).cloned())
    }

    async fn put_if_absent(&self, record: &GuestRecord) -> Result<PutOutcome, StoreError> {
        let mut state = self.state.write().await;
        if state.records.contains_key(&record.sequence_id) {
            return Ok(PutOutcome::KeyExists);
        }
        if state.persons.contains_key(&record.person_id) {
            return Ok(PutOutcome::PersonExists);
        }

        state
            .persons
            .insert(record.person_id.clone(), record.sequence_id.clone());
        state
            .records
            .insert(record.sequence_id.clone(), record.clone());
        Ok(PutOutcome::Inserted)
    }

    async fn delete_if_present(&self, sequence_id: &str) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.remove(sequence_id) else {
            return Ok(DeleteOutcome::NotFound);
        };

        if state.persons.get(&record.person_id).map(String::as_str) == Some(sequence_id) {
            state.persons.remove(&record.person_id);
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn scan_page_size(&self) -> usize {
        self.page_size
    }
}
