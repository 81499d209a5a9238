//! The email accumulator and its one-shot build state machine

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Mailbox, Message};
use mime::Mime;
use tracing::debug;

use crate::error::Error;
use crate::session::MailSession;

/// Default SMTP port used when none was configured
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Default socket connection timeout passed to the transport
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts an address or an address with a display name to a [`Mailbox`],
/// validating address syntax on the way
pub trait IntoMailbox {
    /// Converts to a `Mailbox` struct
    fn into_mailbox(self) -> Result<Mailbox, Error>;
}

impl IntoMailbox for Mailbox {
    fn into_mailbox(self) -> Result<Mailbox, Error> {
        Ok(self)
    }
}

impl IntoMailbox for &str {
    fn into_mailbox(self) -> Result<Mailbox, Error> {
        Ok(self.parse::<Mailbox>()?)
    }
}

impl IntoMailbox for String {
    fn into_mailbox(self) -> Result<Mailbox, Error> {
        self.as_str().into_mailbox()
    }
}

impl IntoMailbox for &String {
    fn into_mailbox(self) -> Result<Mailbox, Error> {
        self.as_str().into_mailbox()
    }
}

impl<S: AsRef<str>, T: Into<String>> IntoMailbox for (S, T) {
    fn into_mailbox(self) -> Result<Mailbox, Error> {
        let (address, name) = self;
        let address = address.as_ref().parse()?;
        Ok(Mailbox::new(Some(name.into()), address))
    }
}

#[derive(Debug, Clone)]
struct Content {
    body: String,
    mime_type: String,
}

/// Build state of an [`Email`]
///
/// The transition from `Unbuilt` to `Built` happens at most once, in
/// [`Email::build_message`]. The built variant carries the message
/// snapshot and the sent date fixed at build time.
#[derive(Debug, Clone)]
enum BuildState {
    Unbuilt,
    Built {
        message: Message,
        sent_at: SystemTime,
    },
}

/// Accumulates email fields and builds a [`Message`] exactly once
///
/// `Email` collects recipients, headers, content and transport settings
/// through setter and accumulator calls, in any order. A call to
/// [`build_message`][Email::build_message] validates the accumulated
/// fields, produces an immutable [`Message`] snapshot, and marks the
/// email as built; building a second time is an error. Field mutation
/// after a successful build stays legal but no longer affects the
/// snapshot.
///
/// All address parsing, MIME encoding and transport work is delegated
/// to [`lettre`].
///
/// # Examples
///
/// ```rust
/// use mailforge::Email;
///
/// # fn main() -> Result<(), mailforge::Error> {
/// let mut email = Email::new();
/// email.set_from("orders@example.com")?;
/// email.add_to(["customer@example.org"])?;
/// email.set_subject("Your order");
/// email.set_content("Thanks for your order!", "text/plain");
///
/// let message = email.build_message()?;
/// assert!(message.headers().get_raw("Subject").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Email {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    headers: Vec<(String, String)>,
    subject: Option<String>,
    charset: Option<String>,
    content: Option<Content>,
    sent_date: Option<SystemTime>,
    host_name: Option<String>,
    smtp_port: u16,
    socket_connection_timeout: Duration,
    session: Option<MailSession>,
    state: BuildState,
}

impl Default for Email {
    fn default() -> Self {
        Email::new()
    }
}

impl Email {
    /// Creates a new empty email
    pub fn new() -> Email {
        Email {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            headers: Vec::new(),
            subject: None,
            charset: None,
            content: None,
            sent_date: None,
            host_name: None,
            smtp_port: DEFAULT_SMTP_PORT,
            socket_connection_timeout: DEFAULT_SOCKET_TIMEOUT,
            session: None,
            state: BuildState::Unbuilt,
        }
    }

    /// Appends one or more addresses to the `To` recipients
    ///
    /// Accepts bare addresses and `(address, display name)` pairs. Fails
    /// with [`Error::EmptyAddressList`] when `addresses` is empty and
    /// with [`Error::Address`] when an entry is malformed; on failure no
    /// recipient is added.
    pub fn add_to<A, I>(&mut self, addresses: I) -> Result<&mut Self, Error>
    where
        A: IntoMailbox,
        I: IntoIterator<Item = A>,
    {
        let mailboxes = collect_mailboxes(addresses)?;
        self.to.extend(mailboxes);
        Ok(self)
    }

    /// Appends one or more addresses to the `Cc` recipients
    ///
    /// Same contract as [`add_to`][Email::add_to].
    pub fn add_cc<A, I>(&mut self, addresses: I) -> Result<&mut Self, Error>
    where
        A: IntoMailbox,
        I: IntoIterator<Item = A>,
    {
        let mailboxes = collect_mailboxes(addresses)?;
        self.cc.extend(mailboxes);
        Ok(self)
    }

    /// Appends one or more addresses to the `Bcc` recipients
    ///
    /// Same contract as [`add_to`][Email::add_to].
    pub fn add_bcc<A, I>(&mut self, addresses: I) -> Result<&mut Self, Error>
    where
        A: IntoMailbox,
        I: IntoIterator<Item = A>,
    {
        let mailboxes = collect_mailboxes(addresses)?;
        self.bcc.extend(mailboxes);
        Ok(self)
    }

    /// Appends one or more `Reply-To` addresses
    ///
    /// Same contract as [`add_to`][Email::add_to].
    pub fn add_reply_to<A, I>(&mut self, addresses: I) -> Result<&mut Self, Error>
    where
        A: IntoMailbox,
        I: IntoIterator<Item = A>,
    {
        let mailboxes = collect_mailboxes(addresses)?;
        self.reply_to.extend(mailboxes);
        Ok(self)
    }

    /// Inserts a header, overwriting any previous value for the same name
    ///
    /// An empty name or value is a misuse error ([`Error::EmptyHeaderName`]
    /// or [`Error::EmptyHeaderValue`]), as is a name containing characters
    /// not allowed in header names.
    pub fn add_header<S: Into<String>, T: Into<String>>(
        &mut self,
        name: S,
        value: T,
    ) -> Result<&mut Self, Error> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() {
            return Err(Error::EmptyHeaderName);
        }
        if value.is_empty() {
            return Err(Error::EmptyHeaderValue);
        }
        header_name(&name)?;

        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some((_, v)) => *v = value,
            None => self.headers.push((name, value)),
        }
        Ok(self)
    }

    /// Sets the sender address
    ///
    /// Accepts a bare address or an `(address, display name)` pair; the
    /// address is validated on entry.
    pub fn set_from<A: IntoMailbox>(&mut self, address: A) -> Result<&mut Self, Error> {
        self.from = Some(address.into_mailbox()?);
        Ok(self)
    }

    /// Sets the subject
    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the charset applied to the content type at build time
    ///
    /// Ignored when the content type set through
    /// [`set_content`][Email::set_content] already carries a `charset`
    /// parameter.
    pub fn set_charset<S: Into<String>>(&mut self, charset: S) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the body and its MIME type
    ///
    /// The MIME type is parsed at build time; a malformed type surfaces
    /// there as [`Error::InvalidContentType`].
    pub fn set_content<S: Into<String>, T: Into<String>>(
        &mut self,
        body: S,
        mime_type: T,
    ) -> &mut Self {
        self.content = Some(Content {
            body: body.into(),
            mime_type: mime_type.into(),
        });
        self
    }

    /// Sets or clears the sent date
    ///
    /// `None` defers the sent date to build time, when the current time
    /// is used. Dates before the Unix epoch are rejected at build time
    /// with [`Error::SentDateOutOfRange`].
    pub fn set_sent_date(&mut self, date: Option<SystemTime>) -> &mut Self {
        self.sent_date = date;
        self
    }

    /// Sets the socket connection timeout passed through to the transport
    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.socket_connection_timeout = timeout;
        self
    }

    /// Sets the SMTP host name used when creating the mail session
    pub fn set_host_name<S: Into<String>>(&mut self, host_name: S) -> &mut Self {
        self.host_name = Some(host_name.into());
        self
    }

    /// Sets the SMTP port used when creating the mail session
    pub fn set_smtp_port(&mut self, port: u16) -> &mut Self {
        self.smtp_port = port;
        self
    }

    /// Injects an explicit mail session
    ///
    /// Once set, the session takes precedence over the configured host
    /// name in [`host_name`][Email::host_name] and is returned as-is by
    /// [`mail_session`][Email::mail_session].
    pub fn set_mail_session(&mut self, session: MailSession) -> &mut Self {
        self.session = Some(session);
        self
    }

    /// Builds the message from the accumulated fields
    ///
    /// Requires a sender address ([`Error::MissingFrom`] otherwise) and
    /// may only be called once per email; a second call fails with
    /// [`Error::AlreadyBuilt`]. On success the email transitions to the
    /// built state and the message snapshot becomes available here and
    /// through [`message`][Email::message].
    ///
    /// The underlying library additionally rejects messages without any
    /// recipient; that failure surfaces as [`Error::Email`] and leaves
    /// the email unbuilt.
    pub fn build_message(&mut self) -> Result<&Message, Error> {
        if let BuildState::Built { .. } = self.state {
            return Err(Error::AlreadyBuilt);
        }
        let from = self.from.clone().ok_or(Error::MissingFrom)?;

        // RFC 2822 dates carry whole seconds only
        let sent_at = truncate_to_seconds(self.sent_date.unwrap_or_else(SystemTime::now))?;

        let mut builder = Message::builder().from(from).date(sent_at);
        for mailbox in &self.reply_to {
            builder = builder.reply_to(mailbox.clone());
        }
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in &self.cc {
            builder = builder.cc(mailbox.clone());
        }
        for mailbox in &self.bcc {
            builder = builder.bcc(mailbox.clone());
        }
        if let Some(subject) = &self.subject {
            builder = builder.subject(subject.clone());
        }

        let body = match &self.content {
            Some(content) => {
                builder = builder.header(self.content_type(&content.mime_type)?);
                content.body.clone()
            }
            None => String::new(),
        };

        let mut message = builder.body(body)?;
        for (name, value) in &self.headers {
            message
                .headers_mut()
                .insert_raw(HeaderValue::new(header_name(name)?, value.clone()));
        }

        debug!(
            to = self.to.len(),
            cc = self.cc.len(),
            bcc = self.bcc.len(),
            "message built"
        );

        self.state = BuildState::Built { message, sent_at };
        match &self.state {
            BuildState::Built { message, .. } => Ok(message),
            BuildState::Unbuilt => unreachable!(),
        }
    }

    /// The built message, or `None` before a successful build
    pub fn message(&self) -> Option<&Message> {
        match &self.state {
            BuildState::Built { message, .. } => Some(message),
            BuildState::Unbuilt => None,
        }
    }

    /// Returns the mail session, creating one from the configured host
    /// name, port and timeout if none exists yet
    ///
    /// Fails with [`Error::MissingHost`] when no session was injected and
    /// no host name was configured.
    pub fn mail_session(&mut self) -> Result<&MailSession, Error> {
        if self.session.is_none() {
            let host = self.host_name.clone().ok_or(Error::MissingHost)?;
            debug!(host = %host, port = self.smtp_port, "creating mail session");
            self.session = Some(
                MailSession::new(host, self.smtp_port)
                    .timeout(Some(self.socket_connection_timeout)),
            );
        }
        match &self.session {
            Some(session) => Ok(session),
            None => Err(Error::MissingHost),
        }
    }

    /// The effective host name
    ///
    /// Defers to the session's host when a session exists, falls back to
    /// the configured host name, and returns `None` when neither is set.
    pub fn host_name(&self) -> Option<&str> {
        match &self.session {
            Some(session) => Some(session.host()),
            None => self.host_name.as_deref(),
        }
    }

    /// The sent date
    ///
    /// The explicitly set date if any, or, once built, the timestamp
    /// fixed at build time.
    pub fn sent_date(&self) -> Option<SystemTime> {
        if let Some(date) = self.sent_date {
            return Some(date);
        }
        match self.state {
            BuildState::Built { sent_at, .. } => Some(sent_at),
            BuildState::Unbuilt => None,
        }
    }

    /// The sender address, if set
    pub fn from_address(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    /// The accumulated `To` recipients, in insertion order
    pub fn to_addresses(&self) -> &[Mailbox] {
        &self.to
    }

    /// The accumulated `Cc` recipients, in insertion order
    pub fn cc_addresses(&self) -> &[Mailbox] {
        &self.cc
    }

    /// The accumulated `Bcc` recipients, in insertion order
    pub fn bcc_addresses(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// The accumulated `Reply-To` addresses, in insertion order
    pub fn reply_to_addresses(&self) -> &[Mailbox] {
        &self.reply_to
    }

    /// The accumulated custom headers, in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a custom header value by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The subject, if set
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The charset, if set
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// The configured SMTP port
    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
    }

    /// The configured socket connection timeout
    pub fn socket_connection_timeout(&self) -> Duration {
        self.socket_connection_timeout
    }

    fn content_type(&self, mime_type: &str) -> Result<ContentType, Error> {
        let mime: Mime = mime_type
            .parse()
            .map_err(|_| Error::InvalidContentType(mime_type.to_string()))?;
        let raw = match (&self.charset, mime.get_param(mime::CHARSET)) {
            (Some(charset), None) => format!("{mime}; charset={charset}"),
            _ => mime.to_string(),
        };
        ContentType::parse(&raw).map_err(|_| Error::InvalidContentType(raw))
    }
}

fn collect_mailboxes<A, I>(addresses: I) -> Result<Vec<Mailbox>, Error>
where
    A: IntoMailbox,
    I: IntoIterator<Item = A>,
{
    let mut mailboxes = Vec::new();
    for address in addresses {
        mailboxes.push(address.into_mailbox()?);
    }
    if mailboxes.is_empty() {
        return Err(Error::EmptyAddressList);
    }
    Ok(mailboxes)
}

fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::new_from_ascii(name.to_string())
        .map_err(|_| Error::InvalidHeaderName(name.to_string()))
}

fn truncate_to_seconds(date: SystemTime) -> Result<SystemTime, Error> {
    let elapsed = date
        .duration_since(UNIX_EPOCH)
        .map_err(|_| Error::SentDateOutOfRange)?;
    Ok(UNIX_EPOCH + Duration::from_secs(elapsed.as_secs()))
}
