//! Connection driver: the ordered handshake after the socket opens and the
//! best-effort teardown mirroring it.

use crate::client_error;
use crate::config;
use crate::error::ConnectionError;
use crate::session::{CloseReason, Session, SessionState};
use anyhow::Result;
use futures::SinkExt;
use log::{debug, info, warn};
use rivetmq_codec::frame::{self, AMQPFieldValue, AMQPFrame, MethodFrameArgs};

/// Run the connection establishment sequence, aborting on the first failure:
/// protocol header, version and mechanism checks, start-ok, tune negotiation,
/// connection open and finally channel open.
pub(crate) async fn setup(session: &mut Session) -> Result<()> {
    // Protocol header first; the server answers with Connection.Start.
    session.send_frame(AMQPFrame::Header).await?;

    let greeting = session.consume_frame().await?;
    let start = match session.expect_method(greeting, frame::CONNECTION_START)? {
        MethodFrameArgs::ConnectionStart(args) => args,
        _ => unreachable!(),
    };

    // Revision is deliberately not compared, only major and minor count.
    let (major, minor, _revision) = session.version;

    if start.version_major != major || start.version_minor != minor {
        session.set_state(SessionState::Closed, SessionState::Closed);

        return client_error!(
            None,
            ConnectionError::SyntaxError.code(),
            "protocol version does not match",
            frame::CONNECTION_START
        );
    }

    if !start.mechanisms.split_whitespace().any(|m| m == session.mechanism) {
        session.set_state(SessionState::Closed, SessionState::Closed);

        return client_error!(
            None,
            ConnectionError::SyntaxError.code(),
            format!("mechanism {} is not offered by the server", session.mechanism),
            frame::CONNECTION_START
        );
    }

    let start_ok = frame::ConnectionStartOkArgs::new(&session.config.user, &session.config.password)
        .mechanism(&session.mechanism)
        .locale(config::DEFAULT_LOCALE)
        .properties(client_properties());

    let reply = session.wire_method(start_ok.frame()).await?;
    let tune = match session.expect_method(reply, frame::CONNECTION_TUNE)? {
        MethodFrameArgs::ConnectionTune(args) => args,
        _ => unreachable!(),
    };

    session.channel_max = negotiate(session.channel_max, tune.channel_max);
    session.frame_max = negotiate(session.frame_max, tune.frame_max);

    debug!(
        "Tuned to channel_max {}, frame_max {}, heartbeat {}s",
        session.channel_max, session.frame_max, session.heartbeat
    );

    session
        .send_frame(frame::connection_tune_ok(
            session.channel_max,
            session.frame_max,
            session.heartbeat,
        ))
        .await?;

    let open = frame::ConnectionOpenArgs::default()
        .virtual_host(&session.config.virtual_host)
        .frame();

    let reply = session.wire_method(open).await?;
    session.expect_method(reply, frame::CONNECTION_OPEN_OK)?;
    session.set_state(SessionState::Closed, SessionState::Established);

    let reply = session.wire_method(frame::channel_open(session.config.channel)).await?;

    let channel = match &reply {
        AMQPFrame::Method(channel, _, _) => *channel,
        _ => session.config.channel,
    };

    session.expect_method(reply, frame::CHANNEL_OPEN_OK)?;
    session.channel = channel;
    session.set_state(SessionState::Established, SessionState::Established);

    info!(
        "Connected to {}:{}{} on channel {}",
        session.config.host, session.config.port, session.config.virtual_host, session.channel
    );

    Ok(())
}

/// Close the channel, then the connection, then the socket. Which frames go
/// out depends on who initiated the close: an established level sends close
/// and waits for close-ok, a close-wait level owes the peer a close-ok, a
/// closed level stays quiet. Every error in here is logged and swallowed.
pub(crate) async fn teardown(session: &mut Session, reason: Option<CloseReason>) {
    let reason = reason.unwrap_or_default().completed(session.ongoing);

    match session.channel_state {
        SessionState::Established => {
            let close = frame::ChannelCloseArgs {
                code: reason.reply_code,
                text: reason.reply_text.clone(),
                class_id: reason.class_id,
                method_id: reason.method_id,
            }
            .frame(session.channel);

            match session.wire_method(close).await {
                Ok(reply) => {
                    if let Err(e) = session.expect_method(reply, frame::CHANNEL_CLOSE_OK) {
                        warn!("Unexpected reply to channel close: {:?}", e);
                    }
                }
                Err(e) => warn!("Channel close failed: {:?}", e),
            }
        }
        SessionState::CloseWait => {
            if let Err(e) = session.send_frame(frame::channel_close_ok(session.channel)).await {
                warn!("Channel close-ok failed: {:?}", e);
            }
        }
        SessionState::Closed => (),
    }

    let connection_state = session.connection_state;
    session.set_state(SessionState::Closed, connection_state);

    match session.connection_state {
        SessionState::Established => {
            let close = frame::ConnectionCloseArgs {
                code: reason.reply_code,
                text: reason.reply_text,
                class_id: reason.class_id,
                method_id: reason.method_id,
            }
            .frame();

            match session.wire_method(close).await {
                Ok(reply) => {
                    if let Err(e) = session.expect_method(reply, frame::CONNECTION_CLOSE_OK) {
                        warn!("Unexpected reply to connection close: {:?}", e);
                    }
                }
                Err(e) => warn!("Connection close failed: {:?}", e),
            }
        }
        SessionState::CloseWait => {
            if let Err(e) = session.send_frame(frame::connection_close_ok()).await {
                warn!("Connection close-ok failed: {:?}", e);
            }
        }
        SessionState::Closed => (),
    }

    session.set_state(SessionState::Closed, SessionState::Closed);

    if let Err(e) = session.transport.close().await {
        debug!("Error closing the transport: {:?}", e);
    }
}

/// Non-zero values are capped by the peer, zero means the peer does not care
/// and the client keeps its own limit.
fn negotiate<T: Ord + Copy + Default>(client: T, server: T) -> T {
    if server == T::default() {
        client
    } else {
        std::cmp::min(client, server)
    }
}

/// The client-properties table sent in start-ok. The platform string is
/// advisory, derived from the build target.
fn client_properties() -> frame::FieldTable {
    let mut properties = frame::FieldTable::new();

    properties.insert(
        "product".into(),
        AMQPFieldValue::LongString(env!("CARGO_PKG_NAME").into()),
    );
    properties.insert(
        "version".into(),
        AMQPFieldValue::LongString(env!("CARGO_PKG_VERSION").into()),
    );
    properties.insert(
        "platform".into(),
        AMQPFieldValue::LongString(format!("Rust {}/{}", std::env::consts::OS, std::env::consts::ARCH)),
    );
    properties.insert(
        "copyright".into(),
        AMQPFieldValue::LongString("rivetmq contributors".into()),
    );
    properties.insert(
        "capabilities".into(),
        AMQPFieldValue::FieldTable(Box::new(frame::ConnectionStartOkArgs::capabilities())),
    );

    properties
}
