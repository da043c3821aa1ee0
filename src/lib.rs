use std::time::Duration;

pub mod client;
pub mod errors;
pub mod server;
mod utils;

pub use client::ChatProbe;
pub use errors::{Error, Result};
pub use server::{GreeterServer, ServerEvent, ServerHandle};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7878;

/// Upper bound of a single receive call.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Pause between a send and the receive that follows it.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Delimited framing stops collecting once this many bytes arrived.
pub const MAX_REPLY_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Decides when the bytes received after a send count as the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyFraming {
    /// Sleep, then take whatever one receive returns.
    FixedDelay(Duration),
    /// Keep receiving until the text ends with the delimiter.
    Delimited(String),
}

impl Default for ReplyFraming {
    fn default() -> Self {
        ReplyFraming::FixedDelay(DEFAULT_DELAY)
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub credential: Credential,
    pub commands: Vec<String>,
    pub framing: ReplyFraming,
    pub read_timeout: Option<Duration>,
    pub recv_buffer: usize,
}

impl ProbeConfig {
    pub fn new(host: impl Into<String>, port: u16, credential: Credential) -> Self {
        ProbeConfig {
            host: host.into(),
            port,
            credential,
            commands: vec!["hello".to_string()],
            framing: ReplyFraming::default(),
            read_timeout: None,
            recv_buffer: RECV_BUFFER_SIZE,
        }
    }

    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_framing(mut self, framing: ReplyFraming) -> Self {
        self.framing = framing;
        self
    }

    /// A zero timeout is treated as no timeout; sockets reject it.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn with_recv_buffer(mut self, size: usize) -> Self {
        self.recv_buffer = size.clamp(1, MAX_REPLY_LEN);
        self
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_original_tool() {
        let config = ProbeConfig::new(DEFAULT_HOST, DEFAULT_PORT, Credential::new("a", "b"));
        assert_eq!(config.commands, vec!["hello".to_string()]);
        assert_eq!(config.framing, ReplyFraming::FixedDelay(DEFAULT_DELAY));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.recv_buffer, 1024);
    }

    #[test]
    fn zero_buffer_is_clamped() {
        let config =
            ProbeConfig::new(DEFAULT_HOST, DEFAULT_PORT, Credential::new("a", "b")).with_recv_buffer(0);
        assert_eq!(config.recv_buffer, 1);
    }

    #[test]
    fn huge_buffer_is_capped_at_max_reply_len() {
        let config = ProbeConfig::new(DEFAULT_HOST, DEFAULT_PORT, Credential::new("a", "b"))
            .with_recv_buffer(usize::MAX);
        assert_eq!(config.recv_buffer, MAX_REPLY_LEN);
    }

    #[test]
    fn zero_read_timeout_means_none() {
        let config = ProbeConfig::new(DEFAULT_HOST, DEFAULT_PORT, Credential::new("a", "b"))
            .with_read_timeout(Some(Duration::ZERO));
        assert_eq!(config.read_timeout, None);
    }
}
