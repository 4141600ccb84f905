//! SQLite-backed counter store
//!
//! One `daily_stats` row per calendar date. Increments run as an immediate
//! transaction doing an explicit read-modify-write, so concurrent writers on
//! the same database file are serialized by SQLite's write lock. Every call
//! runs on the blocking pool; a busy file never stalls a runtime worker.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::store::{ActionCounter, CounterStore, KindCounter, QuotaKind, QuotaLimits};
use crate::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS daily_stats (
    date TEXT PRIMARY KEY,
    connections_sent INTEGER NOT NULL DEFAULT 0,
    messages_sent INTEGER NOT NULL DEFAULT 0,
    connections_limit INTEGER NOT NULL,
    messages_limit INTEGER NOT NULL
);
";

fn sent_column(kind: QuotaKind) -> &'static str {
    match kind {
        QuotaKind::Connection => "connections_sent",
        QuotaKind::Message => "messages_sent",
    }
}

/// SQLite counter store
#[derive(Debug)]
pub struct SqliteCounterStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCounterStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    /// Private database that disappears with the store
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| Error::store_unavailable(format!("Lock error: {}", e)))?;
            op(&mut *conn)
        })
        .await
        .map_err(|e| Error::internal(format!("Blocking task failed: {}", e)))?
    }
}

fn read_row(conn: &Connection, date: &str) -> Result<Option<ActionCounter>> {
    let row = conn
        .query_row(
            "SELECT date, connections_sent, messages_sent, connections_limit, messages_limit
             FROM daily_stats WHERE date = ?1",
            params![date],
            |row| {
                Ok(ActionCounter {
                    date: row.get(0)?,
                    connection: KindCounter {
                        sent: row.get(1)?,
                        limit: row.get(3)?,
                    },
                    message: KindCounter {
                        sent: row.get(2)?,
                        limit: row.get(4)?,
                    },
                })
            },
        )
        .optional()?;
    Ok(row)
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn get_counter_row(&self, date: &str) -> Result<Option<ActionCounter>> {
        let date = date.to_string();
        self.with_conn(move |conn| read_row(conn, &date)).await
    }

    async fn upsert_increment(
        &self,
        date: &str,
        kind: QuotaKind,
        limits: &QuotaLimits,
    ) -> Result<ActionCounter> {
        let date = date.to_string();
        let limits = limits.clone();
        self.with_conn(move |conn| increment(conn, &date, kind, &limits))
            .await
    }
}

fn increment(
    conn: &mut Connection,
    date: &str,
    kind: QuotaKind,
    limits: &QuotaLimits,
) -> Result<ActionCounter> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut row = match read_row(&tx, date)? {
        Some(row) => row,
        None => {
            let fresh = ActionCounter::fresh(date, limits);
            tx.execute(
                "INSERT INTO daily_stats (date, connections_sent, messages_sent, connections_limit, messages_limit)
                 VALUES (?1, 0, 0, ?2, ?3)",
                params![date, fresh.connection.limit, fresh.message.limit],
            )?;
            fresh
        }
    };

    let counter = row.get_mut(kind);
    counter.sent = counter.sent.saturating_add(1);
    tx.execute(
        &format!("UPDATE daily_stats SET {} = ?1 WHERE date = ?2", sent_column(kind)),
        params![counter.sent, date],
    )?;
    tx.commit()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_and_read_back() {
        let store = SqliteCounterStore::open_in_memory().unwrap();
        let limits = QuotaLimits::default();

        assert!(store.get_counter_row("2024-02-29").await.unwrap().is_none());

        store.upsert_increment("2024-02-29", QuotaKind::Connection, &limits).await.unwrap();
        let row = store
            .upsert_increment("2024-02-29", QuotaKind::Connection, &limits)
            .await
            .unwrap();
        assert_eq!(row.connection, KindCounter { sent: 2, limit: 50 });

        let stored = store.get_counter_row("2024-02-29").await.unwrap().unwrap();
        assert_eq!(stored, row);
    }

    #[tokio::test]
    async fn test_row_keeps_limits_from_creation() {
        let store = SqliteCounterStore::open_in_memory().unwrap();
        let original = QuotaLimits {
            daily_messages: 5,
            ..Default::default()
        };
        store.upsert_increment("2024-03-01", QuotaKind::Message, &original).await.unwrap();

        let changed = QuotaLimits {
            daily_messages: 99,
            ..Default::default()
        };
        let row = store
            .upsert_increment("2024-03-01", QuotaKind::Message, &changed)
            .await
            .unwrap();
        assert_eq!(row.message, KindCounter { sent: 2, limit: 5 });
    }

    #[tokio::test]
    async fn test_counts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");
        let limits = QuotaLimits::default();

        {
            let store = SqliteCounterStore::open(&path).unwrap();
            for _ in 0..3 {
                store.upsert_increment("2024-03-04", QuotaKind::Message, &limits).await.unwrap();
            }
        }

        let reopened = SqliteCounterStore::open(&path).unwrap();
        let row = reopened.get_counter_row("2024-03-04").await.unwrap().unwrap();
        assert_eq!(row.message.sent, 3);
        assert_eq!(row.connection.sent, 0);
    }

    #[tokio::test]
    async fn test_two_handles_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let limits = QuotaLimits::default();

        let a = SqliteCounterStore::open(&path).unwrap();
        let b = SqliteCounterStore::open(&path).unwrap();
        for _ in 0..5 {
            a.upsert_increment("2024-03-05", QuotaKind::Connection, &limits).await.unwrap();
            b.upsert_increment("2024-03-05", QuotaKind::Connection, &limits).await.unwrap();
        }

        let row = a.get_counter_row("2024-03-05").await.unwrap().unwrap();
        assert_eq!(row.connection.sent, 10);
    }

    #[tokio::test]
    async fn test_busy_file_does_not_stall_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy.db");
        let store = Arc::new(SqliteCounterStore::open(&path).unwrap());

        // Another writer holds the write lock
        let holder = Connection::open(&path).unwrap();
        holder.execute_batch("BEGIN IMMEDIATE").unwrap();

        let writer = store.clone();
        let pending = tokio::spawn(async move {
            writer
                .upsert_increment("2024-03-06", QuotaKind::Message, &QuotaLimits::default())
                .await
        });

        // The current-thread runtime keeps running while the increment waits
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!pending.is_finished());
        holder.execute_batch("COMMIT").unwrap();

        let row = pending.await.unwrap().unwrap();
        assert_eq!(row.message.sent, 1);
    }
}
