//! In-memory [`LiveStore`] used by unit tests.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use futures::future::BoxFuture;

use super::LiveStore;
use crate::dao::models::{ChatMessageEntity, ChatSenderEntity, TableStateEntity};
use crate::dao::storage::{StorageError, StorageResult};

/// Shared store double backed by plain vectors, with scriptable failures.
#[derive(Clone)]
pub struct MockLiveStore {
    inner: Arc<MockStoreInner>,
}

struct MockStoreInner {
    rows: Mutex<Vec<ChatMessageEntity>>,
    snapshots: Mutex<HashMap<String, TableStateEntity>>,
    polls: AtomicUsize,
    fail_latest: AtomicBool,
    failing_polls: AtomicUsize,
}

impl MockLiveStore {
    /// Empty store that answers every call successfully.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockStoreInner {
                rows: Mutex::new(Vec::new()),
                snapshots: Mutex::new(HashMap::new()),
                polls: AtomicUsize::new(0),
                fail_latest: AtomicBool::new(false),
                failing_polls: AtomicUsize::new(0),
            }),
        }
    }

    /// Append a chat row.
    pub fn push_row(&self, row: ChatMessageEntity) {
        self.inner.rows.lock().unwrap().push(row);
    }

    /// Store a table snapshot.
    pub fn put_snapshot(&self, entity: TableStateEntity) {
        self.inner
            .snapshots
            .lock()
            .unwrap()
            .insert(entity.table_id.clone(), entity);
    }

    /// Number of poll queries served (successful or failed).
    pub fn polls(&self) -> usize {
        self.inner.polls.load(Ordering::SeqCst)
    }

    /// Make the cursor-seed lookup fail.
    pub fn fail_latest_lookup(&self) {
        self.inner.fail_latest.store(true, Ordering::SeqCst);
    }

    /// Make the next `count` poll queries fail.
    pub fn fail_next_polls(&self, count: usize) {
        self.inner.failing_polls.store(count, Ordering::SeqCst);
    }
}

/// Minimal chat row for test scenarios.
pub fn row(id: &str, room_id: &str, created_at_ms: i64) -> ChatMessageEntity {
    ChatMessageEntity {
        id: id.to_owned(),
        room_id: room_id.to_owned(),
        content: format!("message {id}"),
        created_at_ms,
        sender: ChatSenderEntity {
            id: "u1".into(),
            nickname: "ace".into(),
            avatar_url: None,
            level: 1,
        },
    }
}

fn injected(context: &str) -> std::io::Error {
    std::io::Error::other(context.to_owned())
}

impl LiveStore for MockLiveStore {
    fn latest_message_ts(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let inner = self.inner.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move {
            if inner.fail_latest.load(Ordering::SeqCst) {
                return Err(StorageError::query(
                    "mock seed failure".into(),
                    injected("seed"),
                ));
            }
            let latest = inner
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|row| row.room_id == room_id)
                .map(|row| row.created_at_ms)
                .max();
            Ok(latest)
        })
    }

    fn messages_after(
        &self,
        room_id: &str,
        after_ms: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatMessageEntity>>> {
        let inner = self.inner.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move {
            inner.polls.fetch_add(1, Ordering::SeqCst);
            let failing = inner.failing_polls.load(Ordering::SeqCst);
            if failing > 0 {
                inner.failing_polls.store(failing - 1, Ordering::SeqCst);
                return Err(StorageError::query(
                    "mock poll failure".into(),
                    injected("poll"),
                ));
            }

            let mut matched: Vec<ChatMessageEntity> = inner
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|row| row.room_id == room_id)
                .filter(|row| after_ms.is_none_or(|after| row.created_at_ms > after))
                .cloned()
                .collect();
            matched.sort_by(|a, b| {
                a.created_at_ms
                    .cmp(&b.created_at_ms)
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(matched)
        })
    }

    fn table_snapshot(
        &self,
        table_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TableStateEntity>>> {
        let inner = self.inner.clone();
        let table_id = table_id.to_owned();
        Box::pin(async move { Ok(inner.snapshots.lock().unwrap().get(&table_id).cloned()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
