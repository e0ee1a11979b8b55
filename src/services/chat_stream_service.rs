use async_stream::stream;
use futures::Stream;
use tokio::time::sleep;
use tracing::warn;

use crate::{dto::stream::ChatStreamEvent, state::SharedState};

/// Open the event stream backing one chat room connection.
///
/// The stream owns a server-held cursor over the room's append-only log and
/// emits `connected`, `message`, `heartbeat`, and `error` events per the
/// wire contract. Dropping the stream (the subscriber disconnecting) cancels
/// the generator at its next suspension point, so an in-flight poll result
/// is discarded rather than emitted.
pub fn open_room_stream(
    state: SharedState,
    room_id: String,
) -> impl Stream<Item = ChatStreamEvent> + Send + 'static {
    let poll_interval = state.config().poll_interval;
    let first_poll_delay = state.config().first_poll_delay;
    let heartbeat_after = state.config().heartbeat_after_polls;

    stream! {
        yield ChatStreamEvent::connected();

        // Unavailable at connection time is fatal for this connection only.
        let Some(store) = state.live_store().await else {
            warn!(room_id = %room_id, "chat stream refused; backing store unavailable");
            yield ChatStreamEvent::error("chat history unavailable");
            return;
        };

        // Seed the cursor with the newest existing row so a fresh connection
        // replays nothing. A failed lookup degrades to the full history.
        let mut cursor: Option<i64> = match store.latest_message_ts(&room_id).await {
            Ok(latest) => latest,
            Err(err) => {
                warn!(room_id = %room_id, error = %err, "cursor seed failed; tailing from history start");
                None
            }
        };
        let mut idle_polls: u32 = 0;

        sleep(first_poll_delay).await;

        loop {
            match store.messages_after(&room_id, cursor).await {
                Ok(rows) if !rows.is_empty() => {
                    idle_polls = 0;
                    for row in rows {
                        cursor = Some(row.created_at_ms);
                        yield ChatStreamEvent::from(row);
                    }
                }
                Ok(_) => {
                    idle_polls += 1;
                    if idle_polls >= heartbeat_after {
                        idle_polls = 0;
                        yield ChatStreamEvent::heartbeat();
                    }
                }
                Err(err) => {
                    // Recoverable: report and keep polling; the stream
                    // self-heals on the next successful poll.
                    warn!(room_id = %room_id, error = %err, "chat poll failed");
                    yield ChatStreamEvent::error("failed to read new messages");
                }
            }

            // The next poll is scheduled only after this one completed, so
            // slow queries never overlap.
            sleep(poll_interval).await;
        }
    }
}
