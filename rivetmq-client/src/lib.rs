//! A single-session AMQP 0-9-1 client.
//!
//! One [`Session`] owns one connection, one channel and the socket behind
//! them. After the handshake the session either publishes messages or runs a
//! consume loop which hands deliveries to a callback while keeping the peer
//! connection alive with heartbeats.
//!
//! # Examples
//!
//! ```no_run
//! use rivetmq_client::{PublishOpts, Session, SessionConfig};
//!
//! async fn produce_and_consume() -> anyhow::Result<()> {
//!     let config = SessionConfig::default().host("127.0.0.1").queue("inbox");
//!
//!     let mut publisher = Session::connect(config.clone()).await?;
//!     publisher
//!         .publish(b"hello", PublishOpts::default().routing_key("inbox"))
//!         .await?;
//!     publisher.close().await?;
//!
//!     let consumer = Session::connect(config).await?;
//!     let shutdown = consumer.cancellation_token();
//!
//!     consumer
//!         .consume(move |delivery| {
//!             println!("{}", String::from_utf8_lossy(delivery.body));
//!             shutdown.cancel();
//!             Ok(())
//!         })
//!         .await
//! }
//! ```

mod channel_api;
mod config;
mod consumer;
pub mod error;
mod handshake;
mod session;
mod stream;

pub use config::{
    BindOpts, ConsumeOpts, ExchangeDeclareOpts, ExchangeDeleteOpts, PublishOpts, QueueDeclareOpts, QueueDeleteOpts,
    Role, SessionConfig, DEFAULT_FRAME_SIZE, DEFAULT_HEARTBEAT, DEFAULT_MAX_CHANNELS,
};
pub use consumer::Delivery;
pub use error::{ClientError, ConnectionError};
pub use session::{CloseReason, Session, SessionState};

// The cancellation token type the consume loop listens on, re-exported so
// hosts do not need their own tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

use rivetmq_codec::frame;

/// AMQP channel number
pub type Channel = frame::Channel;
/// AMQP method class id
pub type ClassId = frame::ClassId;
/// AMQP class id method id number
pub type ClassMethod = frame::ClassMethod;

/// Convenience function for setting up `env_logger` to see log messages.
pub fn setup_logger() {
    env_logger::Builder::from_default_env().format_timestamp_millis().init();
}
