//! Scripted in-memory [`PushTransport`] used by unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use tokio::time::sleep;

use super::{PushChannel, PushTransport, TransportError, TransportResult};

/// Scripted subscribe handshake outcome.
#[derive(Debug, Clone, Copy)]
pub enum SubscribeBehavior {
    /// Confirm immediately.
    Confirm,
    /// Confirm after a delay.
    ConfirmAfter(Duration),
    /// Refuse the subscription.
    Refuse,
    /// Never answer; the caller's timeout must fire.
    Stall,
}

/// Scripted publish outcome.
#[derive(Debug, Clone, Copy)]
pub enum PublishBehavior {
    /// Accept every publish.
    Accept,
    /// Reject the next `n` publishes, then accept.
    RejectNext(usize),
    /// Reject every publish.
    RejectAll,
}

/// Shared transport double recording opens, closes, and publishes.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockTransportInner>,
}

struct MockTransportInner {
    subscribe: Mutex<SubscribeBehavior>,
    publish: Mutex<PublishBehavior>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    publish_attempts: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    /// Transport that confirms subscriptions and accepts publishes.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockTransportInner {
                subscribe: Mutex::new(SubscribeBehavior::Confirm),
                publish: Mutex::new(PublishBehavior::Accept),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                publish_attempts: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Script the handshake outcome for channels opened from now on.
    pub fn set_subscribe(&self, behavior: SubscribeBehavior) {
        *self.inner.subscribe.lock().unwrap() = behavior;
    }

    /// Script the publish outcome.
    pub fn set_publish(&self, behavior: PublishBehavior) {
        *self.inner.publish.lock().unwrap() = behavior;
    }

    /// Number of channels opened so far.
    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Number of channels closed so far.
    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of publish attempts, accepted or not.
    pub fn publish_attempts(&self) -> usize {
        self.inner.publish_attempts.load(Ordering::SeqCst)
    }

    /// Accepted publishes as `(channel, payload)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.sent.lock().unwrap().clone()
    }
}

impl PushTransport for MockTransport {
    fn open(&self, channel: &str) -> BoxFuture<'static, TransportResult<Arc<dyn PushChannel>>> {
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        let channel = channel.to_owned();
        Box::pin(async move { Ok(Arc::new(MockChannel { inner, channel }) as Arc<dyn PushChannel>) })
    }
}

struct MockChannel {
    inner: Arc<MockTransportInner>,
    channel: String,
}

fn injected(context: &str) -> std::io::Error {
    std::io::Error::other(context.to_owned())
}

impl PushChannel for MockChannel {
    fn subscribed(&self) -> BoxFuture<'static, TransportResult<()>> {
        let behavior = *self.inner.subscribe.lock().unwrap();
        let channel = self.channel.clone();
        Box::pin(async move {
            match behavior {
                SubscribeBehavior::Confirm => Ok(()),
                SubscribeBehavior::ConfirmAfter(delay) => {
                    sleep(delay).await;
                    Ok(())
                }
                SubscribeBehavior::Refuse => Err(TransportError::subscribe(
                    channel,
                    injected("subscription refused"),
                )),
                SubscribeBehavior::Stall => future::pending().await,
            }
        })
    }

    fn publish(&self, payload: String) -> BoxFuture<'static, TransportResult<()>> {
        self.inner.publish_attempts.fetch_add(1, Ordering::SeqCst);
        let accepted = {
            let mut behavior = self.inner.publish.lock().unwrap();
            match *behavior {
                PublishBehavior::Accept | PublishBehavior::RejectNext(0) => true,
                PublishBehavior::RejectNext(remaining) => {
                    *behavior = PublishBehavior::RejectNext(remaining - 1);
                    false
                }
                PublishBehavior::RejectAll => false,
            }
        };
        let channel = self.channel.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            if accepted {
                inner.sent.lock().unwrap().push((channel, payload));
                Ok(())
            } else {
                Err(TransportError::publish(channel, injected("publish rejected")))
            }
        })
    }

    fn close(&self) -> BoxFuture<'static, ()> {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(()))
    }
}
