use std::time::Duration;

/// Largest frame payload the client offers during tune negotiation.
pub const DEFAULT_FRAME_SIZE: u32 = 131_072;
/// Largest channel number the client offers during tune negotiation.
pub const DEFAULT_MAX_CHANNELS: u16 = 65_535;
/// Heartbeat interval in seconds advertised in `Connection.TuneOk`.
pub const DEFAULT_HEARTBEAT: u16 = 60;
/// Locale sent in `Connection.StartOk`.
pub const DEFAULT_LOCALE: &str = "en_US";
/// SASL mechanism the client authenticates with.
pub const DEFAULT_MECHANISM: &str = "PLAIN";
/// The single channel the session opens after the connection handshake.
pub const DEFAULT_CHANNEL: u16 = 1;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// What the session is set up to do after the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Consumer,
    Publisher,
}

/// All the options a session consumes.
///
/// Options unset here fall back to the protocol defaults above; options a single
/// operation overrides come in through the per-call opts records below, so the
/// resolution order is always per-call, then session, then protocol default.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Heartbeat interval in seconds.
    pub heartbeat: u16,
    pub user: String,
    pub password: String,
    pub virtual_host: String,
    pub role: Role,
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
    pub channel: u16,
    /// When true the server delivers without expecting acks and the consume loop
    /// sends none. This is the single source of truth for the ack path.
    pub no_ack: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5672,
            ssl: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            heartbeat: DEFAULT_HEARTBEAT,
            user: "guest".to_string(),
            password: "guest".to_string(),
            virtual_host: "/".to_string(),
            role: Role::Consumer,
            exchange: "".to_string(),
            queue: "".to_string(),
            routing_key: "".to_string(),
            channel: DEFAULT_CHANNEL,
            no_ack: false,
        }
    }
}

impl SessionConfig {
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn ssl(mut self, mode: bool) -> Self {
        self.ssl = mode;
        self
    }

    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    pub fn virtual_host(mut self, virtual_host: &str) -> Self {
        self.virtual_host = virtual_host.to_string();
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn exchange(mut self, exchange: &str) -> Self {
        self.exchange = exchange.to_string();
        self
    }

    pub fn queue(mut self, queue: &str) -> Self {
        self.queue = queue.to_string();
        self
    }

    pub fn routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = routing_key.to_string();
        self
    }

    pub fn channel(mut self, channel: u16) -> Self {
        self.channel = channel;
        self
    }

    pub fn heartbeat(mut self, seconds: u16) -> Self {
        self.heartbeat = seconds;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn no_ack(mut self, mode: bool) -> Self {
        self.no_ack = mode;
        self
    }
}

/// Resolve a string option: an explicit per-call value wins, a non-empty session
/// value comes next, the protocol default last.
pub(crate) fn resolve_str<'a>(call: Option<&'a str>, session: &'a str, default: &'a str) -> &'a str {
    match call {
        Some(value) => value,
        None if !session.is_empty() => session,
        None => default,
    }
}

/// Options of `Queue.Declare`. Unset flags fall back to the protocol defaults:
/// everything false except `auto_delete`.
#[derive(Debug, Default)]
pub struct QueueDeclareOpts {
    pub passive: Option<bool>,
    pub durable: Option<bool>,
    pub exclusive: Option<bool>,
    pub auto_delete: Option<bool>,
    pub no_wait: bool,
}

impl QueueDeclareOpts {
    pub fn durable(mut self, mode: bool) -> Self {
        self.durable = Some(mode);
        self
    }

    pub fn exclusive(mut self, mode: bool) -> Self {
        self.exclusive = Some(mode);
        self
    }

    pub fn auto_delete(mut self, mode: bool) -> Self {
        self.auto_delete = Some(mode);
        self
    }

    pub fn passive(mut self, mode: bool) -> Self {
        self.passive = Some(mode);
        self
    }
}

/// Options of `Queue.Bind`, `Queue.Unbind`, `Exchange.Bind` and `Exchange.Unbind`.
#[derive(Debug, Default)]
pub struct BindOpts {
    pub routing_key: Option<String>,
    pub no_wait: bool,
}

impl BindOpts {
    pub fn routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = Some(routing_key.to_string());
        self
    }
}

/// Options of `Queue.Delete`; both conditions default to false.
#[derive(Debug, Default)]
pub struct QueueDeleteOpts {
    pub if_unused: Option<bool>,
    pub if_empty: Option<bool>,
    pub no_wait: bool,
}

impl QueueDeleteOpts {
    pub fn if_unused(mut self, mode: bool) -> Self {
        self.if_unused = Some(mode);
        self
    }

    pub fn if_empty(mut self, mode: bool) -> Self {
        self.if_empty = Some(mode);
        self
    }
}

/// Options of `Exchange.Declare`. The exchange type defaults to "topic".
#[derive(Debug, Default)]
pub struct ExchangeDeclareOpts {
    pub exchange_type: Option<String>,
    pub passive: Option<bool>,
    pub durable: Option<bool>,
    pub auto_delete: Option<bool>,
    pub internal: Option<bool>,
    pub no_wait: bool,
}

impl ExchangeDeclareOpts {
    pub fn exchange_type(mut self, exchange_type: &str) -> Self {
        self.exchange_type = Some(exchange_type.to_string());
        self
    }

    pub fn durable(mut self, mode: bool) -> Self {
        self.durable = Some(mode);
        self
    }

    pub fn auto_delete(mut self, mode: bool) -> Self {
        self.auto_delete = Some(mode);
        self
    }
}

/// Options of `Exchange.Delete`; `if_unused` defaults to true.
#[derive(Debug, Default)]
pub struct ExchangeDeleteOpts {
    pub if_unused: Option<bool>,
    pub no_wait: bool,
}

impl ExchangeDeleteOpts {
    pub fn if_unused(mut self, mode: bool) -> Self {
        self.if_unused = Some(mode);
        self
    }
}

/// Options of `Basic.Consume`. The ack mode is not here on purpose, the session
/// configuration owns it.
#[derive(Debug, Default)]
pub struct ConsumeOpts {
    pub no_local: Option<bool>,
    pub exclusive: Option<bool>,
    pub no_wait: bool,
}

impl ConsumeOpts {
    pub fn no_local(mut self, mode: bool) -> Self {
        self.no_local = Some(mode);
        self
    }

    pub fn exclusive(mut self, mode: bool) -> Self {
        self.exclusive = Some(mode);
        self
    }
}

/// Options of `Basic.Publish`. Exchange and routing key fall back to the
/// session configuration.
#[derive(Debug, Default)]
pub struct PublishOpts {
    pub exchange: Option<String>,
    pub routing_key: Option<String>,
    pub mandatory: Option<bool>,
    pub immediate: Option<bool>,
    pub content_type: Option<String>,
}

impl PublishOpts {
    pub fn exchange(mut self, exchange: &str) -> Self {
        self.exchange = Some(exchange.to_string());
        self
    }

    pub fn routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = Some(routing_key.to_string());
        self
    }

    pub fn mandatory(mut self, mode: bool) -> Self {
        self.mandatory = Some(mode);
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}
