use std::{sync::Arc, time::Duration};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tokio::time::sleep;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{MongoChatMessageDocument, MongoTableStateDocument},
};
use crate::dao::{
    live_store::LiveStore,
    models::{ChatMessageEntity, TableStateEntity},
    storage::StorageResult,
};

const CHAT_COLLECTION_NAME: &str = "chat_messages";
const TABLE_STATE_COLLECTION_NAME: &str = "table_states";

const CONNECT_MAX_ATTEMPTS: u32 = 5;
const CONNECT_INITIAL_DELAY: Duration = Duration::from_millis(250);
const CONNECT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Read-only MongoDB backend for the chat log and table snapshots.
#[derive(Clone)]
pub struct MongoLiveStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoLiveStore {
    /// Connect, verify with a ping, and ensure the chat log index exists.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;
        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn database(&self) -> Database {
        self.inner.state.read().await.database.clone()
    }

    async fn chat_collection(&self) -> Collection<MongoChatMessageDocument> {
        self.database().await.collection(CHAT_COLLECTION_NAME)
    }

    /// The poll query filters on `(room_id, created_at)` and tie-breaks on
    /// `_id`, so the index covers all three.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.chat_collection().await;
        let index = IndexModel::builder()
            .keys(doc! {"room_id": 1, "created_at": 1, "_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("room_created_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: CHAT_COLLECTION_NAME,
                index: "room_id,created_at,_id",
                source,
            })?;

        Ok(())
    }

    async fn find_latest_ts(&self, room_id: &str) -> MongoResult<Option<i64>> {
        let collection = self.chat_collection().await;
        let found = collection
            .find_one(doc! {"room_id": room_id})
            .sort(doc! {"created_at": -1, "_id": -1})
            .await
            .map_err(|source| MongoDaoError::LatestMessage {
                room_id: room_id.to_owned(),
                source,
            })?;

        Ok(found.map(|row| row.created_at))
    }

    async fn find_messages_after(
        &self,
        room_id: &str,
        after_ms: Option<i64>,
    ) -> MongoResult<Vec<ChatMessageEntity>> {
        let collection = self.chat_collection().await;
        let filter = match after_ms {
            Some(after) => doc! {"room_id": room_id, "created_at": {"$gt": after}},
            None => doc! {"room_id": room_id},
        };

        let list_err = |source| MongoDaoError::ListMessages {
            room_id: room_id.to_owned(),
            source,
        };
        let rows: Vec<MongoChatMessageDocument> = collection
            .find(filter)
            .sort(doc! {"created_at": 1, "_id": 1})
            .await
            .map_err(list_err)?
            .try_collect()
            .await
            .map_err(list_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_table_snapshot(&self, table_id: &str) -> MongoResult<Option<TableStateEntity>> {
        let collection = self
            .database()
            .await
            .collection::<MongoTableStateDocument>(TABLE_STATE_COLLECTION_NAME);
        let found = collection
            .find_one(doc! {"_id": table_id})
            .await
            .map_err(|source| MongoDaoError::LoadTableState {
                table_id: table_id.to_owned(),
                source,
            })?;

        Ok(found.map(Into::into))
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database()
            .await
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.inner.config).await?;
        let mut guard = self.inner.state.write().await;
        guard.database = database;
        Ok(())
    }
}

/// Build a client and wait for a successful ping, backing off between attempts.
async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut attempts = 0;
    let mut delay = CONNECT_INITIAL_DELAY;

    loop {
        match database.run_command(doc! {"ping": 1}).await {
            Ok(_) => return Ok(database),
            Err(err) => {
                attempts += 1;
                if attempts >= CONNECT_MAX_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                sleep(delay).await;
                delay = (delay * 2).min(CONNECT_MAX_DELAY);
            }
        }
    }
}

impl LiveStore for MongoLiveStore {
    fn latest_message_ts(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move { store.find_latest_ts(&room_id).await.map_err(Into::into) })
    }

    fn messages_after(
        &self,
        room_id: &str,
        after_ms: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatMessageEntity>>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move {
            store
                .find_messages_after(&room_id, after_ms)
                .await
                .map_err(Into::into)
        })
    }

    fn table_snapshot(
        &self,
        table_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TableStateEntity>>> {
        let store = self.clone();
        let table_id = table_id.to_owned();
        Box::pin(async move {
            store
                .find_table_snapshot(&table_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
