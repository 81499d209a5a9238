//! Transport session configuration

use std::time::Duration;

use lettre::SmtpTransport;
use tracing::debug;

/// Explicit configuration for a mail transport session
///
/// A session fixes the connection target (host, port) and the socket
/// connection timeout that the SMTP transport will use. Creating one
/// performs no network I/O; the transport produced by
/// [`MailSession::transport`] connects lazily, on first send.
///
/// Sessions are plain values. Pass them around explicitly instead of
/// relying on process-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSession {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl MailSession {
    /// Creates a session targeting `host` on `port`
    pub fn new<S: Into<String>>(host: S, port: u16) -> MailSession {
        MailSession {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Set the socket connection timeout passed through to the transport
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The configured socket connection timeout, if any
    pub fn socket_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Builds an SMTP transport for this session
    pub fn transport(&self) -> SmtpTransport {
        debug!(host = %self.host, port = self.port, "creating SMTP transport");

        SmtpTransport::builder_dangerous(self.host.as_str())
            .port(self.port)
            .timeout(self.timeout)
            .build()
    }
}
