//! Redis-backed record store
//!
//! # Layout
//!
//! - `{prefix}:guest:{sequence_id}`: hash holding every record field as text
//! - `{prefix}:person:{person_id}`: string holding the owning `sequence_id`
//!
//! Conditional insert and delete run as Lua scripts so the record key and the
//! person index change together. Scripts only touch keys passed in `KEYS`.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::store::{DEFAULT_SCAN_PAGE_SIZE, DeleteOutcome, PutOutcome, RecordStore, ScanPage};
use crate::types::{GuestField, GuestRecord};

// KEYS[1] record key, KEYS[2] person key; ARGV[1] sequence_id, ARGV[2..] field/value pairs
const INSERT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 1
end
if not redis.call('SET', KEYS[2], ARGV[1], 'NX') then
    return 2
end
redis.call('HSET', KEYS[1], unpack(ARGV, 2))
return 0
"#;

// KEYS[1] record key, KEYS[2] person key; ARGV[1] sequence_id, ARGV[2] person_id
const DELETE_SCRIPT: &str = r#"
local person = redis.call('HGET', KEYS[1], 'person_id')
if not person then
    return 0
end
if person ~= ARGV[2] then
    return 2
end
redis.call('DEL', KEYS[1])
if redis.call('GET', KEYS[2]) == ARGV[1] then
    redis.call('DEL', KEYS[2])
end
return 1
"#;

// A record replaced between reading its person_id and deleting it is retried
const DELETE_ATTEMPTS: usize = 3;

/// Redis-backed guest record store
#[derive(Clone)]
pub struct RedisRecordStore {
    conn: ConnectionManager,
    key_prefix: String,
    page_size: usize,
    insert_script: redis::Script,
    delete_script: redis::Script,
}

impl RedisRecordStore {
    pub fn new(conn: ConnectionManager, key_prefix: &str) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.to_string(),
            page_size: DEFAULT_SCAN_PAGE_SIZE,
            insert_script: redis::Script::new(INSERT_SCRIPT),
            delete_script: redis::Script::new(DELETE_SCRIPT),
        }
    }

    /// Open a managed connection to `redis_url`.
    pub async fn connect(redis_url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, key_prefix))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn guest_key(&self, sequence_id: &str) -> String {
        guest_key(&self.key_prefix, sequence_id)
    }

    fn person_key(&self, person_id: &str) -> String {
        person_key(&self.key_prefix, person_id)
    }
}

fn guest_key(key_prefix: &str, sequence_id: &str) -> String {
    format!("{}:guest:{}", key_prefix, sequence_id)
}

fn person_key(key_prefix: &str, person_id: &str) -> String {
    format!("{}:person:{}", key_prefix, person_id)
}

/// Decode a pipelined batch of hashes. Empty hashes belong to keys deleted
/// after SCAN returned them. Corrupt hashes are logged and left out so one
/// bad record cannot hide the rest.
fn collect_records(keys: &[String], hashes: Vec<HashMap<String, String>>) -> Vec<GuestRecord> {
    let mut records = Vec::with_capacity(keys.len());
    for (key, hash) in keys.iter().zip(hashes) {
        match record_from_hash(key, hash) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping guest record during scan: {}", e),
        }
    }
    records
}

/// Rebuild a record from its stored hash. An empty hash means the key is gone.
fn record_from_hash(
    key: &str,
    mut hash: HashMap<String, String>,
) -> Result<Option<GuestRecord>, StoreError> {
    if hash.is_empty() {
        return Ok(None);
    }

    let mut take = |field: GuestField| {
        hash.remove(field.as_str()).ok_or_else(|| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("missing {}", field.as_str()),
        })
    };

    let sequence_id = take(GuestField::SequenceId)?;
    let person_id = take(GuestField::PersonId)?;
    let first_name = take(GuestField::FirstName)?;
    let last_name = take(GuestField::LastName)?;
    let phone = take(GuestField::Phone)?;
    let email = take(GuestField::Email)?;
    let quantity = take(GuestField::Quantity)?;
    let quantity = quantity.parse::<u64>().map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: format!("quantity {:?}: {}", quantity, e),
    })?;

    Ok(Some(GuestRecord {
        sequence_id,
        person_id,
        first_name,
        last_name,
        phone,
        email,
        quantity,
    }))
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn scan_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        let mut conn = self.conn.clone();
        let cursor: u64 = match cursor {
            Some(c) => c.parse().map_err(|_| StoreError::Corrupt {
                key: "scan cursor".to_string(),
                reason: format!("not a number: {}", c),
            })?,
            None => 0,
        };

        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(guest_key(&self.key_prefix, "*"))
            .arg("COUNT")
            .arg(limit.max(1))
            .query_async(&mut conn)
            .await?;

        let records = if keys.is_empty() {
            Vec::new()
        } else {
            let mut pipe = redis::pipe();
            for key in &keys {
                pipe.hgetall(key);
            }
            let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;
            collect_records(&keys, hashes)
        };

        tracing::debug!(
            "Scanned {} guest records, next cursor {}",
            records.len(),
            next
        );

        Ok(ScanPage {
            records,
            next_cursor: (next != 0).then(|| next.to_string()),
        })
    }

    async fn get(&self, sequence_id: &str) -> Result<Option<GuestRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.guest_key(sequence_id);
        let hash: HashMap<String, String> = conn.hgetall(&key).await?;
        record_from_hash(&key, hash)
    }

    async fn put_if_absent(&self, record: &GuestRecord) -> Result<PutOutcome, StoreError> {
        let mut conn = self.conn.clone();

        let mut invocation = self.insert_script.key(self.guest_key(&record.sequence_id));
        invocation
            .key(self.person_key(&record.person_id))
            .arg(&record.sequence_id);
        for (field, value) in record.to_fields() {
            invocation.arg(field).arg(value);
        }

        let code: i64 = invocation.invoke_async(&mut conn).await?;
        match code {
            0 => Ok(PutOutcome::Inserted),
            1 => Ok(PutOutcome::KeyExists),
            2 => Ok(PutOutcome::PersonExists),
            other => Err(StoreError::Unavailable(format!(
                "unexpected insert script result {}",
                other
            ))),
        }
    }

    async fn delete_if_present(&self, sequence_id: &str) -> Result<DeleteOutcome, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.guest_key(sequence_id);

        for _ in 0..DELETE_ATTEMPTS {
            let person_id: Option<String> = conn.hget(&key, GuestField::PersonId.as_str()).await?;
            let Some(person_id) = person_id else {
                return Ok(DeleteOutcome::NotFound);
            };

            let code: i64 = self
                .delete_script
                .key(&key)
                .key(self.person_key(&person_id))
                .arg(sequence_id)
                .arg(&person_id)
                .invoke_async(&mut conn)
                .await?;

            match code {
                0 => return Ok(DeleteOutcome::NotFound),
                1 => return Ok(DeleteOutcome::Deleted),
                _ => tracing::debug!("Guest {} changed during delete, retrying", sequence_id),
            }
        }

        Err(StoreError::Unavailable(format!(
            "guest {} kept changing during delete",
            sequence_id
        )))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn scan_page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_hash() -> HashMap<String, String> {
        [
            ("sequence_id", "abc"),
            ("person_id", "12345"),
            ("first_name", "Dana"),
            ("last_name", "Levi"),
            ("phone", "0501234567"),
            ("email", "d@example.com"),
            ("quantity", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(guest_key("guestlist", "abc"), "guestlist:guest:abc");
        assert_eq!(person_key("guestlist", "12345"), "guestlist:person:12345");
        assert_eq!(guest_key("guestlist", "*"), "guestlist:guest:*");
    }

    #[test]
    fn test_scripts_only_touch_declared_keys() {
        for script in [INSERT_SCRIPT, DELETE_SCRIPT] {
            for line in script.lines().filter(|l| l.contains("redis.call")) {
                assert!(line.contains("KEYS["), "undeclared key in: {}", line);
            }
            assert!(!script.contains(".."), "script builds a key name");
        }
    }

    #[test]
    fn test_record_from_hash() {
        let record = record_from_hash("guestlist:guest:abc", stored_hash())
            .unwrap()
            .unwrap();
        assert_eq!(record.sequence_id, "abc");
        assert_eq!(record.person_id, "12345");
        assert_eq!(record.quantity, 2);
    }

    #[test]
    fn test_record_from_empty_hash_is_absent() {
        let record = record_from_hash("guestlist:guest:abc", HashMap::new()).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_record_from_hash_missing_field() {
        let mut hash = stored_hash();
        hash.remove("email");
        let err = record_from_hash("guestlist:guest:abc", hash).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Corrupt record guestlist:guest:abc: missing email"
        );
    }

    #[test]
    fn test_record_from_hash_bad_quantity() {
        let mut hash = stored_hash();
        hash.insert("quantity".to_string(), "lots".to_string());
        let err = record_from_hash("guestlist:guest:abc", hash).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_scan_batch_skips_corrupt_and_vanished_records() {
        let mut corrupt = stored_hash();
        corrupt.insert("quantity".to_string(), "lots".to_string());
        let mut other = stored_hash();
        other.insert("sequence_id".to_string(), "def".to_string());

        let keys = vec![
            "guestlist:guest:abc".to_string(),
            "guestlist:guest:bad".to_string(),
            "guestlist:guest:gone".to_string(),
            "guestlist:guest:def".to_string(),
        ];
        let records = collect_records(&keys, vec![stored_hash(), corrupt, HashMap::new(), other]);

        let ids: Vec<&str> = records.iter().map(|r| r.sequence_id.as_str()).collect();
        assert_eq!(ids, vec!["abc", "def"]);
    }

    #[test]
    fn test_fields_round_trip_through_hash() {
        let record = record_from_hash("k", stored_hash()).unwrap().unwrap();
        let hash: HashMap<String, String> = record
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(hash, stored_hash());
    }
}
