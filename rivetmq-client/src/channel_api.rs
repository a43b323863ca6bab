//! One-shot operations on the open channel: queue and exchange management,
//! consumer registration and publishing. Every synchronous method blocks for
//! its paired `*-ok` unless the caller asked for no-wait.

use crate::client_error;
use crate::config::{
    self, BindOpts, ConsumeOpts, ExchangeDeclareOpts, ExchangeDeleteOpts, PublishOpts, QueueDeclareOpts,
    QueueDeleteOpts,
};
use crate::error::ConnectionError;
use crate::session::{Session, SessionState};
use anyhow::Result;
use rivetmq_codec::frame::{self, MethodFrameArgs};

impl Session {
    fn ensure_channel_open(&self) -> Result<()> {
        if self.channel_state != SessionState::Established {
            return client_error!(
                Some(self.channel),
                ConnectionError::CommandInvalid.code(),
                "Session is not initialized, the channel is not open",
                0
            );
        }

        Ok(())
    }

    pub async fn queue_declare(&mut self, queue: &str, opts: QueueDeclareOpts) -> Result<frame::QueueDeclareOkArgs> {
        self.ensure_channel_open()?;

        let mut args = frame::QueueDeclareArgs::default()
            .name(queue)
            .passive(opts.passive.unwrap_or(false))
            .durable(opts.durable.unwrap_or(false))
            .exclusive(opts.exclusive.unwrap_or(false))
            .auto_delete(opts.auto_delete.unwrap_or(true));
        args.flags.set(frame::QueueDeclareFlags::NO_WAIT, opts.no_wait);

        if opts.no_wait {
            self.send_frame(args.frame(self.channel)).await?;

            return Ok(frame::QueueDeclareOkArgs::default().name(queue));
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;

        match self.expect_method(reply, frame::QUEUE_DECLARE_OK)? {
            MethodFrameArgs::QueueDeclareOk(ok) => Ok(ok),
            _ => unreachable!(),
        }
    }

    pub async fn queue_bind(&mut self, queue: &str, exchange: &str, opts: BindOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let routing_key = config::resolve_str(opts.routing_key.as_deref(), &self.config.routing_key, "");
        let mut args = frame::QueueBindArgs::new(queue, exchange).routing_key(routing_key);
        args.no_wait = opts.no_wait;

        if opts.no_wait {
            return self.send_frame(args.frame(self.channel)).await;
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::QUEUE_BIND_OK)?;

        Ok(())
    }

    pub async fn queue_unbind(&mut self, queue: &str, exchange: &str, opts: BindOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let routing_key = config::resolve_str(opts.routing_key.as_deref(), &self.config.routing_key, "");
        let args = frame::QueueUnbindArgs::new(queue, exchange).routing_key(routing_key);

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::QUEUE_UNBIND_OK)?;

        Ok(())
    }

    /// Delete a queue, giving back the number of messages it held.
    pub async fn queue_delete(&mut self, queue: &str, opts: QueueDeleteOpts) -> Result<u32> {
        self.ensure_channel_open()?;

        let mut args = frame::QueueDeleteArgs::default()
            .queue_name(queue)
            .if_unused(opts.if_unused.unwrap_or(false))
            .if_empty(opts.if_empty.unwrap_or(false));
        args.flags.set(frame::QueueDeleteFlags::NO_WAIT, opts.no_wait);

        if opts.no_wait {
            self.send_frame(args.frame(self.channel)).await?;

            return Ok(0);
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;

        match self.expect_method(reply, frame::QUEUE_DELETE_OK)? {
            MethodFrameArgs::QueueDeleteOk(ok) => Ok(ok.message_count),
            _ => unreachable!(),
        }
    }

    pub async fn exchange_declare(&mut self, exchange: &str, opts: ExchangeDeclareOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let exchange_type = opts.exchange_type.as_deref().unwrap_or("topic");

        let mut args = frame::ExchangeDeclareArgs::default()
            .exchange_name(exchange)
            .exchange_type(exchange_type)
            .passive(opts.passive.unwrap_or(false))
            .durable(opts.durable.unwrap_or(false))
            .auto_delete(opts.auto_delete.unwrap_or(false))
            .internal(opts.internal.unwrap_or(false));
        args.flags.set(frame::ExchangeDeclareFlags::NO_WAIT, opts.no_wait);

        if opts.no_wait {
            return self.send_frame(args.frame(self.channel)).await;
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::EXCHANGE_DECLARE_OK)?;

        Ok(())
    }

    pub async fn exchange_bind(&mut self, source: &str, destination: &str, opts: BindOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let routing_key = config::resolve_str(opts.routing_key.as_deref(), &self.config.routing_key, "");
        let mut args = frame::ExchangeBindArgs::new(source, destination).routing_key(routing_key);
        args.no_wait = opts.no_wait;

        if opts.no_wait {
            return self.send_frame(args.frame(self.channel)).await;
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::EXCHANGE_BIND_OK)?;

        Ok(())
    }

    pub async fn exchange_unbind(&mut self, source: &str, destination: &str, opts: BindOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let routing_key = config::resolve_str(opts.routing_key.as_deref(), &self.config.routing_key, "");
        let mut args = frame::ExchangeUnbindArgs::new(source, destination).routing_key(routing_key);
        args.no_wait = opts.no_wait;

        if opts.no_wait {
            return self.send_frame(args.frame(self.channel)).await;
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::EXCHANGE_UNBIND_OK)?;

        Ok(())
    }

    pub async fn exchange_delete(&mut self, exchange: &str, opts: ExchangeDeleteOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let mut args = frame::ExchangeDeleteArgs::default()
            .exchange_name(exchange)
            .if_unused(opts.if_unused.unwrap_or(true));
        args.flags.set(frame::ExchangeDeleteFlags::NO_WAIT, opts.no_wait);

        if opts.no_wait {
            return self.send_frame(args.frame(self.channel)).await;
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;
        self.expect_method(reply, frame::EXCHANGE_DELETE_OK)?;

        Ok(())
    }

    /// Register the consumer on a queue; the server assigns and returns the
    /// consumer tag. The ack mode mirrors the session's `no_ack` setting so
    /// the wire flags and the consume loop cannot disagree.
    pub async fn basic_consume(&mut self, queue: &str, opts: ConsumeOpts) -> Result<String> {
        self.ensure_channel_open()?;

        let mut args = frame::BasicConsumeArgs::default()
            .queue(queue)
            .no_local(opts.no_local.unwrap_or(false))
            .no_ack(self.config.no_ack)
            .exclusive(opts.exclusive.unwrap_or(false));
        args.flags.set(frame::BasicConsumeFlags::NO_WAIT, opts.no_wait);

        if opts.no_wait {
            self.send_frame(args.frame(self.channel)).await?;

            return Ok(String::new());
        }

        let reply = self.wire_method(args.frame(self.channel)).await?;

        match self.expect_method(reply, frame::BASIC_CONSUME_OK)? {
            MethodFrameArgs::BasicConsumeOk(ok) => {
                self.consumer_tag = Some(ok.consumer_tag.clone());

                Ok(ok.consumer_tag)
            }
            _ => unreachable!(),
        }
    }

    /// Cancel the running consumer, if any. Part of a graceful consumer
    /// shutdown; without a known consumer tag this is a no-op.
    pub async fn basic_cancel(&mut self) -> Result<()> {
        self.ensure_channel_open()?;

        let consumer_tag = match self.consumer_tag.take() {
            Some(tag) => tag,
            None => return Ok(()),
        };

        let reply = self
            .wire_method(frame::BasicCancelArgs::new(&consumer_tag).frame(self.channel))
            .await?;
        self.expect_method(reply, frame::BASIC_CANCEL_OK)?;

        Ok(())
    }

    /// Publish a payload: one method frame, one content header and as many
    /// body frames as the negotiated frame size requires. No reply is awaited.
    pub async fn publish(&mut self, payload: &[u8], opts: PublishOpts) -> Result<()> {
        self.ensure_channel_open()?;

        let exchange = config::resolve_str(opts.exchange.as_deref(), &self.config.exchange, "").to_string();
        let routing_key = config::resolve_str(opts.routing_key.as_deref(), &self.config.routing_key, "").to_string();

        let method = frame::BasicPublishArgs::new(&exchange)
            .routing_key(&routing_key)
            .mandatory(opts.mandatory.unwrap_or(false))
            .immediate(opts.immediate.unwrap_or(false));

        let mut header = frame::ContentHeaderFrame::new(self.channel, frame::BASIC_CLASS, payload.len() as u64);

        if let Some(ref content_type) = opts.content_type {
            header = header.content_type(content_type);
        }

        let mut frames = vec![method.frame(self.channel), header.frame()];

        // Frame header and end byte make up 8 bytes of overhead per frame.
        let max_body = (self.frame_max as usize).saturating_sub(8).max(1);

        for chunk in payload.chunks(max_body) {
            frames.push(
                frame::ContentBodyFrame {
                    channel: self.channel,
                    body: chunk.to_vec(),
                }
                .frame(),
            );
        }

        self.send_frames(frames).await
    }

    /// Declare the configured queue, bind it unless the default exchange is
    /// used and start consuming. Gives back the server-assigned consumer tag.
    pub async fn prepare_to_consume(&mut self) -> Result<String> {
        self.ensure_channel_open()?;

        if self.config.role != config::Role::Consumer {
            return client_error!(
                Some(self.channel),
                ConnectionError::CommandInvalid.code(),
                "The session is not configured as a consumer",
                0
            );
        }

        let queue = self.config.queue.clone();

        if queue.is_empty() {
            return client_error!(
                Some(self.channel),
                ConnectionError::CommandInvalid.code(),
                "The consumer role requires a queue name",
                0
            );
        }

        self.queue_declare(&queue, QueueDeclareOpts::default()).await?;

        if !self.config.exchange.is_empty() {
            let exchange = self.config.exchange.clone();

            self.queue_bind(&queue, &exchange, BindOpts::default()).await?;
        }

        self.basic_consume(&queue, ConsumeOpts::default()).await
    }
}
