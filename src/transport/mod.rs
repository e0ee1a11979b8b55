#[cfg(feature = "redis-push")]
pub mod redis;
#[cfg(test)]
pub mod testing;

use std::error::Error;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result alias for push transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Error raised by push transport backends regardless of the broker.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The broker could not be reached or the connection was refused.
    #[error("push broker unreachable: {message}")]
    Connection {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying broker error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The subscribe handshake was refused or the connection dropped before
    /// the broker acknowledged it.
    #[error("subscription to `{channel}` failed")]
    Subscribe {
        /// Channel whose handshake failed.
        channel: String,
        /// Underlying broker error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A publish on an established channel was rejected.
    #[error("publish on `{channel}` failed")]
    Publish {
        /// Channel the publish targeted.
        channel: String,
        /// Underlying broker error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TransportError {
    /// Construct a connection error from any broker failure.
    pub fn connection(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Connection {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a subscribe error from any broker failure.
    pub fn subscribe(channel: String, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Subscribe {
            channel,
            source: Box::new(source),
        }
    }

    /// Construct a publish error from any broker failure.
    pub fn publish(channel: String, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Publish {
            channel,
            source: Box::new(source),
        }
    }
}

/// Broadcast message carried on a table channel.
///
/// Shape is part of the wire contract with viewer clients:
/// `{"type":"broadcast","event":"game_state","payload":<snapshot>}`.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEnvelope {
    /// Always `"broadcast"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Event name viewers filter on.
    pub event: &'static str,
    /// Opaque state snapshot produced by the game engine.
    pub payload: Value,
}

impl BroadcastEnvelope {
    /// Wrap a snapshot in the `game_state` broadcast envelope.
    pub fn game_state(payload: Value) -> Self {
        Self {
            kind: "broadcast",
            event: "game_state",
            payload,
        }
    }
}

/// Abstraction over the pub/sub broker used to push state to viewers.
pub trait PushTransport: Send + Sync {
    /// Open a named channel. The returned channel is not usable for
    /// publishing until [`PushChannel::subscribed`] has resolved.
    fn open(&self, channel: &str) -> BoxFuture<'static, TransportResult<Arc<dyn PushChannel>>>;
}

/// One live pub/sub channel bound to a table.
pub trait PushChannel: Send + Sync {
    /// Resolves once the broker acknowledges the subscription; errors if the
    /// handshake is refused or the connection closes first. The caller bounds
    /// the wait with a timeout.
    fn subscribed(&self) -> BoxFuture<'static, TransportResult<()>>;
    /// Publish an already-serialized payload on the channel.
    fn publish(&self, payload: String) -> BoxFuture<'static, TransportResult<()>>;
    /// Tear the channel down. Infallible; a channel being closed twice or
    /// after a transport drop is a no-op.
    fn close(&self) -> BoxFuture<'static, ()>;
}
