use crate::client_error;
use crate::config::{self, SessionConfig};
use crate::consumer::LivenessWindow;
use crate::error::ConnectionError;
use crate::handshake;
use crate::stream::{self, ClientStream};
use anyhow::Result;
use futures::stream::StreamExt;
use futures::SinkExt;
use log::trace;
use rivetmq_codec::codec::{AMQPCodec, Frame};
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

pub(crate) type Transport = Framed<ClientStream, AMQPCodec>;

/// Lifecycle state of the connection and of the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Established,
    /// The peer initiated the close; the close-ok is still owed.
    CloseWait,
}

/// Reason carried in `Channel.Close` and `Connection.Close` frames.
///
/// A partially filled reason is completed before sending: a zero reply code
/// becomes connection-forced and zero class/method ids are taken from the
/// method the session had in flight.
#[derive(Clone, Debug, Default)]
pub struct CloseReason {
    pub reply_code: u16,
    pub reply_text: String,
    pub class_id: u16,
    pub method_id: u16,
}

impl CloseReason {
    pub fn new(reply_code: u16, reply_text: &str) -> Self {
        Self {
            reply_code,
            reply_text: reply_text.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn completed(mut self, ongoing: Option<(frame::ClassId, frame::MethodId)>) -> CloseReason {
        if self.reply_code == 0 {
            self.reply_code = ConnectionError::ConnectionForced.code();
        }

        if self.class_id == 0 && self.method_id == 0 {
            if let Some((class_id, method_id)) = ongoing {
                self.class_id = class_id;
                self.method_id = method_id;
            }
        }

        self
    }
}

/// A single AMQP session: one connection, one channel, exclusively owning its
/// transport. All operations run on the caller's task; nothing is spawned.
#[derive(Debug)]
pub struct Session {
    pub(crate) transport: Transport,
    pub(crate) config: SessionConfig,
    pub(crate) version: (u8, u8, u8),
    pub(crate) frame_max: u32,
    pub(crate) channel_max: u16,
    pub(crate) heartbeat: u16,
    pub(crate) mechanism: String,
    pub(crate) channel: frame::Channel,
    pub(crate) connection_state: SessionState,
    pub(crate) channel_state: SessionState,
    pub(crate) ongoing: Option<(frame::ClassId, frame::MethodId)>,
    pub(crate) consumer_tag: Option<String>,
    pub(crate) liveness: LivenessWindow,
    pub(crate) cancel: CancellationToken,
}

impl Session {
    /// Open the socket and drive the whole AMQP handshake: protocol header,
    /// start, tune, connection open and channel open. On any failure the
    /// session is torn down best-effort and the error is returned.
    pub async fn connect(config: SessionConfig) -> Result<Session> {
        let socket = stream::connect(&config.host, config.port, config.ssl, config.connect_timeout).await?;

        let mut session = Session {
            transport: Framed::new(socket, AMQPCodec {}),
            version: (0, 9, 1),
            frame_max: config::DEFAULT_FRAME_SIZE,
            channel_max: config::DEFAULT_MAX_CHANNELS,
            heartbeat: config.heartbeat,
            mechanism: config::DEFAULT_MECHANISM.to_string(),
            channel: config.channel,
            connection_state: SessionState::Closed,
            channel_state: SessionState::Closed,
            ongoing: None,
            consumer_tag: None,
            liveness: LivenessWindow::new(),
            cancel: CancellationToken::new(),
            config,
        };

        if let Err(e) = handshake::setup(&mut session).await {
            handshake::teardown(&mut session, None).await;

            return Err(e);
        }

        Ok(session)
    }

    /// Close the channel and the connection gracefully and drop the socket.
    pub async fn close(mut self) -> Result<()> {
        handshake::teardown(&mut self, None).await;

        Ok(())
    }

    /// Like [`Session::close`] but with an explicit close reason.
    pub async fn close_with(mut self, reason: CloseReason) -> Result<()> {
        handshake::teardown(&mut self, Some(reason)).await;

        Ok(())
    }

    /// Token the host can trigger to stop a running consume loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn channel(&self) -> frame::Channel {
        self.channel
    }

    pub fn frame_max(&self) -> u32 {
        self.frame_max
    }

    pub fn channel_max(&self) -> u16 {
        self.channel_max
    }

    /// Negotiated heartbeat interval in seconds.
    pub fn heartbeat(&self) -> u16 {
        self.heartbeat
    }

    /// Channel and connection state, in that order.
    pub fn state(&self) -> (SessionState, SessionState) {
        (self.channel_state, self.connection_state)
    }

    /// The one place where the two lifecycle flags change.
    pub(crate) fn set_state(&mut self, channel_state: SessionState, connection_state: SessionState) {
        trace!(
            "State transition channel {:?} -> {:?}, connection {:?} -> {:?}",
            self.channel_state,
            channel_state,
            self.connection_state,
            connection_state
        );

        self.channel_state = channel_state;
        self.connection_state = connection_state;
    }

    /// Fire-and-forget frame send, used for heartbeats, acks, content frames
    /// and close-ok replies.
    pub(crate) async fn send_frame(&mut self, frame: AMQPFrame) -> Result<()> {
        trace!("Sending {:?}", frame);

        if let Err(e) = self.transport.send(Frame::Frame(frame)).await {
            self.set_state(SessionState::Closed, SessionState::Closed);

            return client_error!(
                None,
                ConnectionError::FrameError.code(),
                format!("Send error {:?}", e),
                0
            );
        }

        Ok(())
    }

    /// Send a batch of frames in one write, keeping a published message's
    /// method, header and body frames together.
    pub(crate) async fn send_frames(&mut self, frames: Vec<AMQPFrame>) -> Result<()> {
        trace!("Sending {:?}", frames);

        if let Err(e) = self.transport.send(Frame::Frames(frames)).await {
            self.set_state(SessionState::Closed, SessionState::Closed);

            return client_error!(
                None,
                ConnectionError::FrameError.code(),
                format!("Send error {:?}", e),
                0
            );
        }

        Ok(())
    }

    /// Read one frame, treating an elapsed read timeout as an error. Used in
    /// the synchronous request/reply exchanges where silence means failure.
    pub(crate) async fn consume_frame(&mut self) -> Result<AMQPFrame> {
        match self.try_consume_frame().await? {
            Some(frame) => Ok(frame),
            None => client_error!(
                None,
                ConnectionError::FrameError.code(),
                "Timeout waiting for a frame",
                0
            ),
        }
    }

    /// Read one frame with the configured read timeout. `Ok(None)` reports the
    /// timeout, which the consume loop turns into heartbeat bookkeeping. A
    /// closed or broken transport moves both states to closed.
    pub(crate) async fn try_consume_frame(&mut self) -> Result<Option<AMQPFrame>> {
        match tokio::time::timeout(self.config.read_timeout, self.transport.next()).await {
            Err(_elapsed) => Ok(None),
            Ok(None) => {
                self.set_state(SessionState::Closed, SessionState::Closed);

                client_error!(
                    None,
                    ConnectionError::FrameError.code(),
                    "Connection closed by peer",
                    0
                )
            }
            Ok(Some(Err(e))) => {
                self.set_state(SessionState::Closed, SessionState::Closed);

                client_error!(None, ConnectionError::FrameError.code(), format!("Read error {:?}", e), 0)
            }
            Ok(Some(Ok(Frame::Frame(frame)))) => {
                trace!("Received {:?}", frame);

                Ok(Some(frame))
            }
            Ok(Some(Ok(Frame::Frames(_)))) => client_error!(
                None,
                ConnectionError::UnexpectedFrame.code(),
                "Unexpected frame batch",
                0
            ),
        }
    }

    /// Send a method frame and read the one synchronous reply its class-level
    /// request/reply pairing promises. Callers check the pairing with
    /// [`Session::expect_method`].
    pub(crate) async fn wire_method(&mut self, frame: AMQPFrame) -> Result<AMQPFrame> {
        if let AMQPFrame::Method(_, cm, _) = &frame {
            self.ongoing = Some(frame::split_class_method(*cm));
        }

        self.send_frame(frame).await?;
        self.consume_frame().await
    }

    /// Verify a reply frame is the expected `*-ok`. A close frame sent by the
    /// peer instead of the reply becomes a close-wait transition plus an error
    /// carrying the peer's reason; anything else is a fatal protocol error.
    pub(crate) fn expect_method(
        &mut self,
        frame: AMQPFrame,
        expected: frame::ClassMethod,
    ) -> Result<MethodFrameArgs> {
        match frame {
            AMQPFrame::Method(_, cm, args) if cm == expected => Ok(args),
            AMQPFrame::Method(_, frame::CONNECTION_CLOSE, MethodFrameArgs::ConnectionClose(args)) => {
                self.set_state(SessionState::Closed, SessionState::CloseWait);

                client_error!(
                    None,
                    args.code,
                    args.text,
                    frame::unify_class_method(args.class_id, args.method_id)
                )
            }
            AMQPFrame::Method(channel, frame::CHANNEL_CLOSE, MethodFrameArgs::ChannelClose(args)) => {
                let connection_state = self.connection_state;
                self.set_state(SessionState::CloseWait, connection_state);

                client_error!(
                    Some(channel),
                    args.code,
                    args.text,
                    frame::unify_class_method(args.class_id, args.method_id)
                )
            }
            other => client_error!(
                None,
                ConnectionError::UnexpectedFrame.code(),
                format!("Unexpected frame {:?}", other),
                expected
            ),
        }
    }
}
