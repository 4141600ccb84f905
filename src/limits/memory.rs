//! In-process counter store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::store::{ActionCounter, CounterStore, QuotaKind, QuotaLimits};
use crate::{Error, Result};

/// Counter store kept in memory.
///
/// Every increment runs inside one lock section. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    rows: Arc<Mutex<HashMap<String, ActionCounter>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload or replace a row
    pub fn insert_row(&self, row: ActionCounter) -> Result<()> {
        self.rows()?.insert(row.date.clone(), row);
        Ok(())
    }

    /// Make every call fail as if the backing store went away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn row_count(&self) -> usize {
        self.rows().map(|rows| rows.len()).unwrap_or(0)
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ActionCounter>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable("memory store marked unavailable"));
        }
        self.rows
            .lock()
            .map_err(|e| Error::store_unavailable(format!("Lock error: {}", e)))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get_counter_row(&self, date: &str) -> Result<Option<ActionCounter>> {
        Ok(self.rows()?.get(date).cloned())
    }

    async fn upsert_increment(
        &self,
        date: &str,
        kind: QuotaKind,
        limits: &QuotaLimits,
    ) -> Result<ActionCounter> {
        let mut rows = self.rows()?;
        let row = rows
            .entry(date.to_string())
            .or_insert_with(|| ActionCounter::fresh(date, limits));
        let counter = row.get_mut(kind);
        counter.sent = counter.sent.saturating_add(1);
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_row_creation() {
        let store = MemoryCounterStore::new();
        assert!(store.get_counter_row("2024-05-01").await.unwrap().is_none());

        let row = store
            .upsert_increment("2024-05-01", QuotaKind::Message, &QuotaLimits::default())
            .await
            .unwrap();
        assert_eq!(row.message.sent, 1);
        assert_eq!(row.connection.sent, 0);
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_new_date_is_new_row() {
        let store = MemoryCounterStore::new();
        let limits = QuotaLimits::default();
        store.upsert_increment("2024-05-01", QuotaKind::Connection, &limits).await.unwrap();
        store.upsert_increment("2024-05-02", QuotaKind::Connection, &limits).await.unwrap();

        let old = store.get_counter_row("2024-05-01").await.unwrap().unwrap();
        assert_eq!(old.connection.sent, 1);
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_increments_all_land() {
        let store = MemoryCounterStore::new();
        let limits = QuotaLimits::default();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let store = store.clone();
            let limits = limits.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_increment("2024-05-03", QuotaKind::Connection, &limits)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let row = store.get_counter_row("2024-05-03").await.unwrap().unwrap();
        assert_eq!(row.connection.sent, 25);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryCounterStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get_counter_row("2024-05-01").await,
            Err(Error::StoreUnavailable(_))
        ));
    }
}
