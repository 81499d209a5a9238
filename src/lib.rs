//! mailforge provides a convenience API for assembling email messages.
//!
//! The central type is [`Email`], a mutable accumulator in the spirit of
//! classic convenience mail APIs: recipients, headers, content and
//! transport settings are collected through setter calls in any order,
//! then [`Email::build_message`] produces an immutable
//! [`Message`] exactly once. Address parsing, MIME encoding and SMTP
//! transport are delegated to [`lettre`].
//!
//! ## Example
//!
//! ```rust
//! use mailforge::Email;
//!
//! # fn main() -> Result<(), mailforge::Error> {
//! let mut email = Email::new();
//! email.set_from(("no-reply@example.com", "Example Corp"))?;
//! email.add_to(["user@example.org"])?;
//! email.add_reply_to([("support@example.com", "Support")])?;
//! email.add_header("X-Mailer", "mailforge")?;
//! email.set_subject("Welcome");
//! email.set_content("<h1>Welcome!</h1>", "text/html");
//!
//! let message = email.build_message()?;
//! let raw = message.formatted();
//! # assert!(!raw.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Delivery goes through a [`MailSession`], an explicit configuration
//! object holding the transport target:
//!
//! ```rust,no_run
//! use lettre::Transport;
//! use mailforge::Email;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut email = Email::new();
//! email.set_host_name("localhost");
//! email.set_smtp_port(2525);
//! email.set_from("no-reply@example.com")?;
//! email.add_to(["user@example.org"])?;
//! email.set_content("plain text", "text/plain");
//!
//! email.build_message()?;
//! let transport = email.mail_session()?.transport();
//! if let Some(message) = email.message() {
//!     transport.send(message)?;
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/mailforge/0.1.0")]
#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

mod email;
mod error;
mod session;

pub use crate::email::{Email, IntoMailbox, DEFAULT_SMTP_PORT, DEFAULT_SOCKET_TIMEOUT};
pub use crate::error::Error;
pub use crate::session::MailSession;

pub use lettre::message::{Mailbox, Message};
