use std::time::{Duration, SystemTime};

use mailforge::{Email, Error, MailSession};
use pretty_assertions::assert_eq;

const TEST_EMAILS: [&str; 3] = ["ab@bc.com", "a.b@c.org", "abcdefg@abcdefg.com.bd"];
const HEADER_NAME: &str = "X-Header-Test";
const HEADER_VALUE: &str = "TestValue";
const VALID_NAME: &str = "Valid Name";
const SMTP_HOST: &str = "smtp.example.com";

/// An email with every field populated, ready to build.
fn populated_email() -> Email {
    let mut email = Email::new();
    email.set_host_name("localhost");
    email.set_smtp_port(1234);
    email.set_from("abcde@b.com").unwrap();
    email.add_to(["cfgkgm@d.com"]).unwrap();
    email.set_subject("test mail");
    email.set_charset("ISO-8859-1");
    email.set_content("test content", "text/plain");
    email.add_cc(["cc@example.com"]).unwrap();
    email.add_bcc(["bcc@example.com"]).unwrap();
    email.add_reply_to(["reply@example.com"]).unwrap();
    email.add_header("X-Custom-Header", "Value").unwrap();
    email
}

#[test]
fn add_bcc_accumulates_all_addresses() {
    let mut email = Email::new();
    email.add_bcc(TEST_EMAILS).unwrap();
    assert_eq!(email.bcc_addresses().len(), 3);
}

#[test]
fn add_cc_accumulates_addresses() {
    let mut email = Email::new();
    email.add_cc([TEST_EMAILS[1]]).unwrap();
    assert_eq!(email.cc_addresses().len(), 1);
}

#[test]
fn add_cc_with_empty_list_is_a_domain_error() {
    let mut email = Email::new();
    let err = email.add_cc(Vec::<&str>::new()).unwrap_err();
    assert!(!err.is_misuse());
    assert_eq!(err.to_string(), "Address List provided was invalid");
    assert!(email.cc_addresses().is_empty());
}

#[test]
fn add_header_stores_the_mapping() {
    let mut email = Email::new();
    email.add_header(HEADER_NAME, HEADER_VALUE).unwrap();
    assert_eq!(email.header(HEADER_NAME), Some(HEADER_VALUE));
}

#[test]
fn add_header_rejects_empty_name_and_value() {
    let mut email = Email::new();

    let err = email.add_header("", HEADER_VALUE).unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(err.to_string(), "header name can not be empty");

    let err = email.add_header(HEADER_NAME, "").unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(err.to_string(), "header value can not be empty");

    assert!(email.headers().is_empty());
}

#[test]
fn add_reply_to_preserves_order_and_names() {
    let mut email = Email::new();
    for address in TEST_EMAILS {
        email.add_reply_to([(address, VALID_NAME)]).unwrap();
    }

    assert_eq!(email.reply_to_addresses().len(), TEST_EMAILS.len());
    for (mailbox, address) in email.reply_to_addresses().iter().zip(TEST_EMAILS) {
        assert_eq!(mailbox.email.to_string(), address);
        assert_eq!(mailbox.name.as_deref(), Some(VALID_NAME));
    }
}

#[test]
fn add_to_rejects_malformed_addresses_atomically() {
    let mut email = Email::new();
    let err = email.add_to(["good@example.com", "not-an-address"]).unwrap_err();
    assert!(matches!(err, Error::Address(_)));
    assert!(email.to_addresses().is_empty());
}

#[test]
fn build_message_produces_a_message() {
    let mut email = populated_email();
    email.build_message().unwrap();

    let message = email.message().unwrap();
    assert_eq!(message.headers().get_raw("X-Custom-Header"), Some("Value"));
    assert_eq!(message.headers().get_raw("Subject"), Some("test mail"));
    assert!(message.headers().get_raw("Date").is_some());

    // envelope collects to, cc and bcc recipients
    assert_eq!(message.envelope().to().len(), 3);
}

#[test]
fn build_message_twice_is_a_misuse_error() {
    let mut email = populated_email();
    email.build_message().unwrap();

    let err = email.build_message().unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(err.to_string(), "the message was already built");
}

#[test]
fn build_message_twice_fails_despite_intervening_changes() {
    let mut email = populated_email();
    email.build_message().unwrap();

    email.set_subject("changed subject");
    email.add_to(["another@example.com"]).unwrap();
    assert!(matches!(email.build_message(), Err(Error::AlreadyBuilt)));
}

#[test]
fn build_message_with_explicit_sent_date() {
    let mut email = populated_email();
    let custom = SystemTime::now();
    email.set_sent_date(Some(custom));
    email.build_message().unwrap();

    let sent = email.sent_date().unwrap();
    let drift = match custom.duration_since(sent) {
        Ok(d) => d,
        Err(e) => e.duration(),
    };
    assert!(drift <= Duration::from_secs(1));
    assert!(email.message().unwrap().headers().get_raw("Date").is_some());
}

#[test]
fn build_message_with_html_content() {
    let mut email = populated_email();
    email.set_content("<html><body><h1>HTML Content</h1></body></html>", "text/html");
    email.build_message().unwrap();
    assert!(email.message().is_some());
}

#[test]
fn build_message_without_from_is_a_domain_error() {
    let mut email = Email::new();
    email.set_host_name("localhost");
    email.set_smtp_port(1234);
    email.add_to(["recipient@example.com"]).unwrap();
    email.set_subject("Test email without from address");
    email.set_charset("UTF-8");
    email.set_content("Test content without from address", "text/plain");

    let err = email.build_message().unwrap_err();
    assert!(!err.is_misuse());
    assert!(matches!(err, Error::MissingFrom));
    assert!(email.message().is_none());
}

#[test]
fn host_name_is_none_when_nothing_is_configured() {
    let email = Email::new();
    assert_eq!(email.host_name(), None);
}

#[test]
fn host_name_returns_the_configured_host_without_a_session() {
    let mut email = Email::new();
    email.set_host_name(SMTP_HOST);
    assert_eq!(email.host_name(), Some(SMTP_HOST));
}

#[test]
fn host_name_defers_to_the_session_host() {
    let mut email = Email::new();
    email.set_host_name(SMTP_HOST);
    email.set_mail_session(MailSession::new("relay.example.net", 587));
    assert_eq!(email.host_name(), Some("relay.example.net"));
}

#[test]
fn mail_session_without_host_is_a_domain_error() {
    let mut email = Email::new();
    let err = email.mail_session().unwrap_err();
    assert!(!err.is_misuse());
    assert!(matches!(err, Error::MissingHost));
}

#[test]
fn mail_session_is_created_from_the_configured_target() {
    let mut email = Email::new();
    email.set_host_name(SMTP_HOST);
    email.set_smtp_port(2525);
    email.set_socket_connection_timeout(Duration::from_millis(10_000));

    let session = email.mail_session().unwrap().clone();
    assert_eq!(session.host(), SMTP_HOST);
    assert_eq!(session.port(), 2525);
    assert_eq!(session.socket_timeout(), Some(Duration::from_millis(10_000)));

    // later host changes do not replace the cached session
    email.set_host_name("other.example.com");
    assert_eq!(email.mail_session().unwrap(), &session);
}

#[test]
fn sent_date_is_none_before_build_when_cleared() {
    let mut email = Email::new();
    email.set_sent_date(None);
    assert_eq!(email.sent_date(), None);
}

#[test]
fn sent_date_returns_the_explicit_date() {
    let mut email = Email::new();
    let date = SystemTime::now();
    email.set_sent_date(Some(date));
    assert_eq!(email.sent_date(), Some(date));
}

#[test]
fn socket_connection_timeout_round_trips() {
    let mut email = Email::new();
    email.set_socket_connection_timeout(Duration::from_millis(10_000));
    assert_eq!(
        email.socket_connection_timeout(),
        Duration::from_millis(10_000)
    );
}

#[test]
fn set_from_stores_a_validated_address() {
    let mut email = Email::new();
    email.set_from("test@example.com").unwrap();
    assert_eq!(
        email.from_address().unwrap().email.to_string(),
        "test@example.com"
    );
}

#[test]
fn set_from_rejects_a_malformed_address() {
    let mut email = Email::new();
    assert!(matches!(email.set_from("nope"), Err(Error::Address(_))));
    assert!(email.from_address().is_none());
}
