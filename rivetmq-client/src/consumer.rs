//! The consume loop: a single-task interleaver of message delivery and
//! heartbeat liveness, running until the peer closes, the link dies, the
//! heartbeat window trips or the host cancels.

use crate::client_error;
use crate::error::ConnectionError;
use crate::handshake;
use crate::session::{Session, SessionState};
use anyhow::Result;
use log::{debug, error, warn};
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};
use std::time::Duration;
use tokio::time::Instant;

/// One delivered message, borrowed for the duration of the callback.
#[derive(Debug)]
pub struct Delivery<'a> {
    pub body: &'a [u8],
    pub deliver: &'a frame::BasicDeliverArgs,
    pub properties: &'a frame::ContentHeaderFrame,
}

/// Tracks peer liveness over a sliding window of heartbeat intervals.
///
/// Each silent interval shifts a one into the miss bitmap, any sign of life
/// clears it. The peer counts as gone when at least `threshold` of the last
/// `window` intervals were silent, which tolerates transient jitter without
/// keeping a dead connection around for long.
#[derive(Debug)]
pub(crate) struct LivenessWindow {
    last_activity: Instant,
    missed: u32,
    window: u32,
    threshold: u32,
}

impl LivenessWindow {
    pub(crate) fn new() -> Self {
        Self {
            last_activity: Instant::now(),
            missed: 0,
            window: 5,
            threshold: 4,
        }
    }

    /// A heartbeat arrived, the miss history is wiped.
    pub(crate) fn mark_alive(&mut self) {
        self.last_activity = Instant::now();
        self.missed = 0;
    }

    /// Whether a whole heartbeat interval passed without any sign of the peer.
    pub(crate) fn interval_elapsed(&self, interval: Duration) -> bool {
        self.last_activity.elapsed() > interval
    }

    /// Record a silent interval and restart the interval clock.
    pub(crate) fn mark_missed(&mut self) {
        self.missed = (self.missed << 1) | 1;
        self.last_activity = Instant::now();
    }

    pub(crate) fn timed_out(&self) -> bool {
        let mask = (1u32 << self.window) - 1;

        (self.missed & mask).count_ones() >= self.threshold
    }
}

impl Session {
    /// Declare and bind the configured queue, start the consumer and run the
    /// delivery loop until a terminal condition. The session is torn down on
    /// the way out whatever the outcome was.
    ///
    /// The callback gets each message once, fully reassembled. Returning an
    /// error from it is logged and answered with a negative ack, it does not
    /// stop the loop.
    pub async fn consume<F>(mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(Delivery<'_>) -> Result<()> + Send,
    {
        if let Err(e) = self.prepare_to_consume().await {
            handshake::teardown(&mut self, None).await;

            return Err(e);
        }

        let result = consume_loop(&mut self, &mut handler).await;

        handshake::teardown(&mut self, None).await;

        result
    }
}

async fn consume_loop<F>(session: &mut Session, handler: &mut F) -> Result<()>
where
    F: FnMut(Delivery<'_>) -> Result<()> + Send,
{
    let cancel = session.cancellation_token();
    let heartbeat = Duration::from_secs(session.heartbeat as u64);

    let mut pending_deliver: Option<frame::BasicDeliverArgs> = None;
    let mut pending_header: Option<frame::ContentHeaderFrame> = None;
    let mut body: Vec<u8> = Vec::new();

    session.liveness.mark_alive();

    loop {
        let received = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                return client_error!(None, ConnectionError::Success.code(), "exiting", 0);
            }
            received = session.try_consume_frame() => received?,
        };

        let frame = match received {
            Some(frame) => frame,
            None => {
                // Read timeout. Not fatal by itself, it drives the heartbeat
                // scheduler: a whole silent interval is recorded as a miss and
                // answered with a heartbeat of our own.
                if session.heartbeat == 0 || !session.liveness.interval_elapsed(heartbeat) {
                    continue;
                }

                session.liveness.mark_missed();
                session.send_frame(frame::heartbeat()).await?;

                if session.liveness.timed_out() {
                    return client_error!(None, ConnectionError::FrameError.code(), "heartbeat timeout", 0);
                }

                continue;
            }
        };

        match frame {
            AMQPFrame::Method(channel, cm, args) => match args {
                MethodFrameArgs::ChannelClose(args) => {
                    let connection_state = session.connection_state;
                    session.set_state(SessionState::CloseWait, connection_state);

                    return client_error!(
                        Some(channel),
                        args.code,
                        args.text,
                        frame::unify_class_method(args.class_id, args.method_id)
                    );
                }
                MethodFrameArgs::ConnectionClose(args) => {
                    session.set_state(SessionState::Closed, SessionState::CloseWait);

                    return client_error!(
                        None,
                        args.code,
                        args.text,
                        frame::unify_class_method(args.class_id, args.method_id)
                    );
                }
                MethodFrameArgs::BasicDeliver(args) => {
                    pending_deliver = Some(args);
                    pending_header = None;
                    body.clear();
                }
                other => {
                    debug!("Ignoring method {:08X} {:?} while consuming", cm, other);
                }
            },
            AMQPFrame::ContentHeader(header) => {
                pending_header = Some(header);
            }
            AMQPFrame::ContentBody(mut chunk) => {
                body.append(&mut chunk.body);

                let body_size = pending_header.as_ref().map(|h| h.body_size).unwrap_or(0);

                // A logical message may span several body frames.
                if (body.len() as u64) < body_size {
                    continue;
                }

                dispatch_delivery(session, handler, &mut pending_deliver, &mut pending_header, &mut body).await?;
            }
            AMQPFrame::Heartbeat(_) => {
                session.liveness.mark_alive();
            }
            AMQPFrame::Header => {
                debug!("Ignoring protocol header while consuming");
            }
        }
    }
}

/// Hand a reassembled message to the callback and answer the broker, ack on
/// success, nack with requeue on callback failure. Skipped entirely when the
/// session runs in no-ack mode.
async fn dispatch_delivery<F>(
    session: &mut Session,
    handler: &mut F,
    pending_deliver: &mut Option<frame::BasicDeliverArgs>,
    pending_header: &mut Option<frame::ContentHeaderFrame>,
    body: &mut Vec<u8>,
) -> Result<()>
where
    F: FnMut(Delivery<'_>) -> Result<()> + Send,
{
    let (deliver, header) = match (pending_deliver.take(), pending_header.take()) {
        (Some(deliver), Some(header)) => (deliver, header),
        _ => {
            warn!("Dropping a content body which arrived without a delivery method");
            body.clear();

            return Ok(());
        }
    };

    let outcome = handler(Delivery {
        body: &body[..],
        deliver: &deliver,
        properties: &header,
    });

    if let Err(ref e) = outcome {
        error!("Delivery callback failed: {:?}", e);
    }

    if !session.config.no_ack {
        let answer = match outcome {
            Ok(()) => frame::BasicAckArgs::default()
                .delivery_tag(deliver.delivery_tag)
                .multiple(false)
                .frame(session.channel),
            Err(_) => frame::BasicNackArgs::default()
                .delivery_tag(deliver.delivery_tag)
                .multiple(false)
                .requeue(true)
                .frame(session.channel),
        };

        session.send_frame(answer).await?;
    }

    body.clear();

    Ok(())
}
