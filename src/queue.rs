//! Job queue seam and its AMQP implementation.

use std::sync::Arc;

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};

use tokio::sync::Mutex;

use crate::error::Result;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Declares a durable queue. Declaring an existing queue is a no-op.
    async fn declare_queue(&self, queue: &str) -> Result<()>;
    /// Publishes a persistent JSON message to `queue` via the default exchange.
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()>;
}

/// AMQP 0-9-1 queue with publisher confirms enabled.
///
/// The channel is reopened, and if needed the connection too, the next
/// time it is used after the broker closed it.
#[derive(Clone)]
pub struct AmqpQueue {
    url: String,
    link: Arc<Mutex<AmqpLink>>,
}

struct AmqpLink {
    connection: Connection,
    channel: Channel,
}

/// Delivery mode 2 marks a message persistent.
const PERSISTENT: u8 = 2;

/// What has to be reopened before the link can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
    None,
    Channel,
    Connection,
}

fn repair_needed(connection_up: bool, channel_up: bool) -> Repair {
    match (connection_up, channel_up) {
        (true, true) => Repair::None,
        (true, false) => Repair::Channel,
        (false, _) => Repair::Connection,
    }
}

async fn open_channel(connection: &Connection) -> Result<Channel> {
    let channel = connection.create_channel().await?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await?;
    Ok(channel)
}

impl AmqpLink {
    async fn open(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = open_channel(&connection).await?;
        Ok(Self { connection, channel })
    }
}

impl AmqpQueue {
    pub async fn connect(url: &str) -> Result<Self> {
        let link = AmqpLink::open(url).await?;
        Ok(Self {
            url: url.to_string(),
            link: Arc::new(Mutex::new(link)),
        })
    }

    /// A usable channel, reopening whatever the broker closed.
    async fn channel(&self) -> Result<Channel> {
        let mut link = self.link.lock().await;
        match repair_needed(
            link.connection.status().connected(),
            link.channel.status().connected(),
        ) {
            Repair::None => {}
            Repair::Channel => {
                tracing::warn!("⚠️ AMQP channel closed, reopening");
                link.channel = open_channel(&link.connection).await?;
            }
            Repair::Connection => {
                tracing::warn!("⚠️ AMQP connection closed, reconnecting");
                *link = AmqpLink::open(&self.url).await?;
            }
        }
        Ok(link.channel.clone())
    }
}

#[async_trait]
impl JobQueue for AmqpQueue {
    async fn declare_queue(&self, queue: &str) -> Result<()> {
        self.channel()
            .await?
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    auto_delete: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let confirm = self
            .channel()
            .await?
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await?
            .await?;

        if confirm.is_nack() {
            return Err(crate::error::AppError::Queue(format!(
                "broker rejected message for queue {}",
                queue
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_channel_on_live_connection_reopens_only_the_channel() {
        assert_eq!(repair_needed(true, true), Repair::None);
        assert_eq!(repair_needed(true, false), Repair::Channel);
    }

    #[test]
    fn closed_connection_reconnects() {
        assert_eq!(repair_needed(false, true), Repair::Connection);
        assert_eq!(repair_needed(false, false), Repair::Connection);
    }
}
