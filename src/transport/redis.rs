use std::sync::Arc;

use fred::prelude::*;
use futures::future::BoxFuture;
use tracing::info;

use super::{PushChannel, PushTransport, TransportError, TransportResult};

/// Redis pub/sub implementation of [`PushTransport`].
///
/// Publishes go through one shared client. Each table channel gets its own
/// subscriber connection whose SUBSCRIBE acknowledgement doubles as the
/// handshake confirmation, so a dead broker surfaces at channel-open time
/// rather than on the first lost publish.
pub struct RedisPushTransport {
    publisher: Client,
    config: Config,
}

impl RedisPushTransport {
    /// Connect the shared publisher client to the broker at `url`.
    pub async fn connect(url: &str) -> TransportResult<Self> {
        let config = Config::from_url(url)
            .map_err(|err| TransportError::connection(format!("invalid Redis URL `{url}`"), err))?;

        let publisher = Builder::from_config(config.clone())
            .build()
            .map_err(|err| TransportError::connection("failed to build Redis client".into(), err))?;
        publisher
            .init()
            .await
            .map_err(|err| TransportError::connection("Redis connection failed".into(), err))?;

        info!("connected to Redis push broker");
        Ok(Self { publisher, config })
    }
}

impl PushTransport for RedisPushTransport {
    fn open(&self, channel: &str) -> BoxFuture<'static, TransportResult<Arc<dyn PushChannel>>> {
        let publisher = self.publisher.clone();
        let config = self.config.clone();
        let channel = channel.to_owned();

        Box::pin(async move {
            let subscriber = Builder::from_config(config).build().map_err(|err| {
                TransportError::connection("failed to build Redis subscriber".into(), err)
            })?;
            subscriber.init().await.map_err(|err| {
                TransportError::connection("Redis subscriber connection failed".into(), err)
            })?;

            Ok(Arc::new(RedisPushChannel {
                publisher,
                subscriber,
                channel,
            }) as Arc<dyn PushChannel>)
        })
    }
}

struct RedisPushChannel {
    publisher: Client,
    subscriber: Client,
    channel: String,
}

impl PushChannel for RedisPushChannel {
    fn subscribed(&self) -> BoxFuture<'static, TransportResult<()>> {
        let subscriber = self.subscriber.clone();
        let channel = self.channel.clone();
        Box::pin(async move {
            subscriber
                .subscribe(channel.clone())
                .await
                .map_err(|err| TransportError::subscribe(channel, err))
        })
    }

    fn publish(&self, payload: String) -> BoxFuture<'static, TransportResult<()>> {
        let publisher = self.publisher.clone();
        let channel = self.channel.clone();
        Box::pin(async move {
            let _receivers: i64 = publisher
                .publish(channel.clone(), payload)
                .await
                .map_err(|err| TransportError::publish(channel, err))?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'static, ()> {
        let subscriber = self.subscriber.clone();
        Box::pin(async move {
            // The publisher is shared across channels; only the dedicated
            // subscriber connection is torn down.
            let _ = subscriber.quit().await;
        })
    }
}
