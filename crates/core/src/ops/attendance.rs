//! Moderator shift check-in / check-out.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::{ContentStore, StoreError};
use crate::types::AttendanceRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceOutcome {
    CheckedIn(DateTime<Utc>),
    AlreadyIn(DateTime<Utc>),
    CheckedOut { minutes: i64 },
    NotCheckedIn,
}

async fn open_shift(store: &ContentStore, number: &str) -> Result<Option<AttendanceRecord>, StoreError> {
    let records: Vec<AttendanceRecord> = store.list().await?;
    Ok(records.into_iter().rev().find(|r| r.number == number && r.check_out.is_none()))
}

pub async fn check_in(store: &ContentStore, number: &str) -> Result<AttendanceOutcome, StoreError> {
    if let Some(open) = open_shift(store, number).await? {
        return Ok(AttendanceOutcome::AlreadyIn(open.check_in));
    }
    let record = AttendanceRecord { id: Uuid::new_v4(), number: number.to_owned(), check_in: Utc::now(), check_out: None };
    store.upsert(&record).await?;
    Ok(AttendanceOutcome::CheckedIn(record.check_in))
}

pub async fn check_out(store: &ContentStore, number: &str) -> Result<AttendanceOutcome, StoreError> {
    let Some(mut open) = open_shift(store, number).await? else {
        return Ok(AttendanceOutcome::NotCheckedIn);
    };
    let now = Utc::now();
    open.check_out = Some(now);
    store.upsert(&open).await?;
    Ok(AttendanceOutcome::CheckedOut { minutes: (now - open.check_in).num_minutes() })
}

/// Shifts that started at or after `since`, oldest first.
pub async fn since(store: &ContentStore, since: DateTime<Utc>) -> Result<Vec<AttendanceRecord>, StoreError> {
    let records: Vec<AttendanceRecord> = store.list().await?;
    Ok(records.into_iter().filter(|r| r.check_in >= since).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shift_lifecycle() {
        let store = ContentStore::in_memory("data").await.unwrap();
        assert_eq!(check_out(&store, "62811").await.unwrap(), AttendanceOutcome::NotCheckedIn);
        assert!(matches!(check_in(&store, "62811").await.unwrap(), AttendanceOutcome::CheckedIn(_)));
        assert!(matches!(check_in(&store, "62811").await.unwrap(), AttendanceOutcome::AlreadyIn(_)));
        assert_eq!(check_out(&store, "62811").await.unwrap(), AttendanceOutcome::CheckedOut { minutes: 0 });

        let today = since(&store, Utc::now() - chrono::Duration::hours(1)).await.unwrap();
        assert_eq!(today.len(), 1);
        assert!(today[0].check_out.is_some());
    }
}
