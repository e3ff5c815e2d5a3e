//! RecordStore trait - persisting guest records

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{GuestField, GuestRecord};

/// Page size used by the provided full-scan helpers.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// A record already lives under this `sequence_id`.
    KeyExists,
    /// Another live record already holds this `person_id`.
    PersonExists,
}

/// Result of a conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// One page of a store scan. `next_cursor` is `None` once the scan is complete.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<GuestRecord>,
    pub next_cursor: Option<String>,
}

/// Key-value persistence for guest records, keyed by `sequence_id`.
///
/// Conditional operations report rejections through their outcome enums;
/// `Err` is reserved for the store itself failing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of records starting at `cursor` (`None` for the first page).
    /// A page may hold fewer or more records than `limit`.
    async fn scan_page(&self, cursor: Option<&str>, limit: usize)
    -> Result<ScanPage, StoreError>;

    async fn get(&self, sequence_id: &str) -> Result<Option<GuestRecord>, StoreError>;

    /// Insert only if nothing lives under `record.sequence_id` and no live
    /// record shares `record.person_id`. Both checks and the write are atomic.
    async fn put_if_absent(&self, record: &GuestRecord) -> Result<PutOutcome, StoreError>;

    async fn delete_if_present(&self, sequence_id: &str) -> Result<DeleteOutcome, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Page size used by `scan_all` and `scan_filter`.
    fn scan_page_size(&self) -> usize {
        DEFAULT_SCAN_PAGE_SIZE
    }

    /// Every live record, following cursors until the store is exhausted.
    async fn scan_all(&self) -> Result<Vec<GuestRecord>, StoreError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .scan_page(cursor.as_deref(), self.scan_page_size())
                .await?;
            records.extend(page.records);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    /// Every live record whose `field` has the text value `value`.
    async fn scan_filter(
        &self,
        field: GuestField,
        value: &str,
    ) -> Result<Vec<GuestRecord>, StoreError> {
        let mut matches = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .scan_page(cursor.as_deref(), self.scan_page_size())
                .await?;
            matches.extend(
                page.records
                    .into_iter()
                    .filter(|record| record.field_value(field) == value),
            );
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(matches)
    }
}
