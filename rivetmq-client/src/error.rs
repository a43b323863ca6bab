use rivetmq_codec::frame;
use std::fmt;

/// Represents a connection or channel error. If `channel` is `None` it is a
/// connection error.
#[derive(Clone, Debug)]
pub struct ClientError {
    pub channel: Option<frame::Channel>,
    pub code: u16,
    pub message: String,
    pub class_method: frame::ClassMethod,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientError")
            .field("channel", &self.channel)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("class_method", &format!("{:08X}", &self.class_method))
            .finish()
    }
}

impl std::error::Error for ClientError {}

/// Reply codes in connection scope used by this client.
#[derive(Clone, Copy, Debug)]
pub enum ConnectionError {
    /// An operation finished in a normal way.
    Success = 200,
    /// The connection is forced to close.
    ConnectionForced = 320,
    /// A frame could not be read or written.
    FrameError = 501,
    /// The peer sent a frame with erroneous data, for example an unsupported protocol version.
    SyntaxError = 502,
    /// An operation arrived in a state it is not valid in.
    CommandInvalid = 503,
    /// The peer sent a frame which does not fit the expected request/reply pairing.
    UnexpectedFrame = 505,
}

impl ConnectionError {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Shorthand for creating errors in async functions.
#[macro_export]
macro_rules! client_error {
    ($channel:expr, $code:expr, $message:expr, $cm:expr) => {
        ::std::result::Result::Err(anyhow::Error::new($crate::error::ClientError {
            channel: $channel,
            code: $code,
            message: ::std::string::String::from($message),
            class_method: $cm,
        }))
    };
}
