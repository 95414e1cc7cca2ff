//! Attendance record storage.
//!
//! The store is keyed by `(employee_id, date)` and offers a single atomic
//! compare-and-swap. Every state transition goes through it, which is what
//! keeps concurrent check-ins for the same day from both succeeding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceKey, AttendanceStatus, DailyAttendanceRecord};

/// The guard a conditional write is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordVersion {
    /// Expected lifecycle state.
    pub status: AttendanceStatus,
    /// Expected revision.
    pub revision: u64,
}

impl RecordVersion {
    /// The version of an absent record: `(NoRecord, 0)`.
    pub const ABSENT: RecordVersion = RecordVersion {
        status: AttendanceStatus::NoRecord,
        revision: 0,
    };

    /// The version of a stored record, or [`RecordVersion::ABSENT`].
    pub fn of(record: Option<&DailyAttendanceRecord>) -> Self {
        record.map_or(Self::ABSENT, |r| RecordVersion {
            status: r.status,
            revision: r.revision,
        })
    }
}

/// Port for daily record persistence.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Reads the record for a key.
    async fn get(&self, key: &AttendanceKey) -> EngineResult<Option<DailyAttendanceRecord>>;

    /// Writes `record` under its key if the stored version equals `expected`.
    ///
    /// Fails with [`EngineError::StorageConflict`] when another writer got
    /// there first. Nothing is written in that case.
    async fn compare_and_swap(
        &self,
        expected: RecordVersion,
        record: DailyAttendanceRecord,
    ) -> EngineResult<()>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttendanceStore {
    records: Arc<RwLock<HashMap<AttendanceKey, DailyAttendanceRecord>>>,
}

impl MemoryAttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns true when no record is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> EngineError {
    EngineError::Transient {
        message: "attendance store lock poisoned".to_string(),
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn get(&self, key: &AttendanceKey) -> EngineResult<Option<DailyAttendanceRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: RecordVersion,
        record: DailyAttendanceRecord,
    ) -> EngineResult<()> {
        let key = record.key();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if RecordVersion::of(records.get(&key)) != expected {
            return Err(EngineError::StorageConflict {
                employee_id: key.employee_id,
                date: key.date,
            });
        }
        records.insert(key, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key() -> AttendanceKey {
        AttendanceKey::new("emp_001", NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    fn checked_in(revision: u64) -> DailyAttendanceRecord {
        let mut record = DailyAttendanceRecord::empty(&key());
        record.status = AttendanceStatus::CheckedIn;
        record.revision = revision;
        record
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryAttendanceStore::new();
        assert!(store.get(&key()).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_insert_against_absent_version() {
        let store = MemoryAttendanceStore::new();
        store
            .compare_and_swap(RecordVersion::ABSENT, checked_in(1))
            .await
            .unwrap();

        let stored = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(stored.status, AttendanceStatus::CheckedIn);
        assert_eq!(stored.revision, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_second_insert_conflicts() {
        let store = MemoryAttendanceStore::new();
        store
            .compare_and_swap(RecordVersion::ABSENT, checked_in(1))
            .await
            .unwrap();

        let result = store
            .compare_and_swap(RecordVersion::ABSENT, checked_in(1))
            .await;
        assert!(matches!(result, Err(EngineError::StorageConflict { .. })));
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MemoryAttendanceStore::new();
        store
            .compare_and_swap(RecordVersion::ABSENT, checked_in(1))
            .await
            .unwrap();

        let stale = RecordVersion {
            status: AttendanceStatus::CheckedIn,
            revision: 0,
        };
        let mut update = checked_in(2);
        update.status = AttendanceStatus::CheckedOut;
        assert!(store.compare_and_swap(stale, update.clone()).await.is_err());

        let current = RecordVersion::of(store.get(&key()).await.unwrap().as_ref());
        store.compare_and_swap(current, update).await.unwrap();
        let stored = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(stored.status, AttendanceStatus::CheckedOut);
    }

    #[test]
    fn test_version_of_absent_record() {
        assert_eq!(RecordVersion::of(None), RecordVersion::ABSENT);
    }
}
