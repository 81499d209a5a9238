use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

use lettre::address::AddressError;

/// Error type for email construction
///
/// Errors come in two kinds: recoverable domain errors caused by the input
/// (an empty address list, a malformed address, a missing sender), and
/// misuse errors caused by incorrect caller code (rebuilding an already
/// built message, empty header names). [`Error::is_misuse`] tells them
/// apart.
#[derive(Debug)]
pub enum Error {
    /// No addresses were supplied to an accumulator call
    EmptyAddressList,
    /// An address failed syntax validation
    Address(AddressError),
    /// No from address was set before building the message
    MissingFrom,
    /// No host name was configured before creating a mail session
    MissingHost,
    /// The content MIME type could not be parsed
    InvalidContentType(String),
    /// The sent date precedes the Unix epoch and cannot be carried in a
    /// `Date` header
    SentDateOutOfRange,
    /// The underlying mail library rejected the message
    Email(lettre::error::Error),
    /// The message was already built
    AlreadyBuilt,
    /// A header was added with an empty name
    EmptyHeaderName,
    /// A header was added with an empty value
    EmptyHeaderValue,
    /// A header name contains characters not allowed in header names
    InvalidHeaderName(String),
}

impl Error {
    /// Returns true if the error signals caller misuse rather than
    /// recoverable input
    ///
    /// Misuse errors are defects in the calling code. Retrying the
    /// operation with the same arguments will fail again.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::AlreadyBuilt
                | Error::EmptyHeaderName
                | Error::EmptyHeaderValue
                | Error::InvalidHeaderName(_)
        )
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::EmptyAddressList => fmt.write_str("Address List provided was invalid"),
            Error::Address(e) => write!(fmt, "invalid email address: {e}"),
            Error::MissingFrom => fmt.write_str("missing from address, cannot build the message"),
            Error::MissingHost => {
                fmt.write_str("no host name configured, cannot create a mail session")
            }
            Error::InvalidContentType(s) => write!(fmt, "invalid content type: {s}"),
            Error::SentDateOutOfRange => {
                fmt.write_str("sent date precedes the Unix epoch")
            }
            Error::Email(e) => e.fmt(fmt),
            Error::AlreadyBuilt => fmt.write_str("the message was already built"),
            Error::EmptyHeaderName => fmt.write_str("header name can not be empty"),
            Error::EmptyHeaderValue => fmt.write_str("header value can not be empty"),
            Error::InvalidHeaderName(name) => write!(fmt, "invalid header name: {name:?}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Address(e) => Some(e),
            Error::Email(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Error {
        Error::Address(err)
    }
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Error {
        Error::Email(err)
    }
}
