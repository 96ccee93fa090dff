//! IMAP/SMTP transport implementation.
//!
//! Reads the inbox over IMAP (TLS, via `async-imap`) and sends through SMTP
//! (via `lettre`, implicit TLS on port 465 and STARTTLS otherwise).
//!
//! # Connection handling
//!
//! The IMAP session is opened lazily on first use and shared behind a mutex,
//! so concurrent commands queue up rather than interleave on the wire. Any
//! I/O error drops the session; the next call reconnects. Combined with the
//! client's periodic refresh this makes a dropped connection self-healing.
//!
//! # UID caching
//!
//! Message UIDs are cached between listings and only searched again when a
//! refresh is forced or the mailbox message count changed.

use async_imap::types::Fetch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use mail_parser::MessageParser;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::MailTransport;
use crate::config::Config;
use crate::error::{Result, TransportError};
use crate::types::{Message, MessageHeader, MessageId, OutgoingMessage};

const INBOX: &str = "INBOX";
const IMPLICIT_TLS_SMTP_PORT: u16 = 465;

/// Install `ring` as the process-wide rustls crypto provider.
///
/// Both the IMAP TLS stream and lettre build rustls configs from the
/// process default. Safe to call more than once; a provider that is already
/// installed is left in place.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::trace!("rustls crypto provider already installed");
    }
}

/// Type alias for the IMAP session with TLS (using tokio-util compat layer).
type ImapSession = async_imap::Session<Compat<TlsStream<TcpStream>>>;

/// Connection settings taken from [`Config`]
#[derive(Clone)]
struct Settings {
    imap_host: String,
    imap_port: u16,
    smtp_host: String,
    smtp_port: u16,
    username: String,
    imap_password: String,
    smtp_password: String,
}

impl Settings {
    fn from_config(config: &Config) -> Result<Self> {
        if config.imap_server.trim().is_empty() {
            return Err(TransportError::Connection("IMAP server is not configured".to_string()).into());
        }
        if config.email_address.trim().is_empty() {
            return Err(TransportError::Connection("email address is not configured".to_string()).into());
        }
        if config.imap_port == 0 || config.smtp_port == 0 {
            return Err(TransportError::Connection("port 0 is not a valid server port".to_string()).into());
        }

        Ok(Self {
            imap_host: config.imap_server.trim().to_string(),
            imap_port: config.imap_port,
            smtp_host: config.smtp_server.trim().to_string(),
            smtp_port: config.smtp_port,
            username: config.email_address.clone(),
            imap_password: config.imap_password.clone(),
            smtp_password: config.smtp_password_or_imap().to_string(),
        })
    }
}

#[derive(Default)]
struct ImapState {
    session: Option<ImapSession>,
    /// Cached UIDs, newest first
    uids: Vec<u32>,
    /// Message count the cached UIDs were taken at
    known_count: Option<usize>,
}

/// IMAP/SMTP mail transport
pub struct ImapSmtpTransport {
    settings: Settings,
    state: Mutex<ImapState>,
}

impl ImapSmtpTransport {
    /// Create a transport for `config`
    ///
    /// Does not connect; the first operation does. Fails if the
    /// configuration cannot possibly reach a server.
    pub fn new(config: &Config) -> Result<Self> {
        let settings = Settings::from_config(config)?;
        install_crypto_provider();
        tracing::info!(
            imap_host = %settings.imap_host,
            imap_port = settings.imap_port,
            smtp_host = %settings.smtp_host,
            smtp_port = settings.smtp_port,
            "built IMAP/SMTP transport"
        );
        Ok(Self {
            settings,
            state: Mutex::new(ImapState::default()),
        })
    }

    /// Establishes TLS connection to the IMAP server with futures compat wrapper.
    async fn connect_tls(settings: &Settings) -> Result<Compat<TlsStream<TcpStream>>> {
        let tcp_stream = TcpStream::connect(format!("{}:{}", settings.imap_host, settings.imap_port))
            .await
            .map_err(|e| TransportError::Connection(format!("TCP connect failed: {}", e)))?;

        let config = ClientConfig::builder()
            .with_root_certificates(tokio_rustls::rustls::RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            ))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(settings.imap_host.clone())
            .map_err(|e| TransportError::Connection(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| TransportError::Connection(format!("TLS handshake failed: {}", e)))?;

        Ok(tls_stream.compat())
    }

    async fn login(settings: &Settings) -> Result<ImapSession> {
        let stream = Self::connect_tls(settings).await?;
        let client = async_imap::Client::new(stream);

        let session = client
            .login(&settings.username, &settings.imap_password)
            .await
            .map_err(|(e, _)| TransportError::Authentication(format!("IMAP login failed: {}", e)))?;

        tracing::info!(host = %settings.imap_host, "IMAP session established");
        Ok(session)
    }

    /// The open session, connecting first if there is none
    async fn session<'a>(
        settings: &Settings,
        slot: &'a mut Option<ImapSession>,
    ) -> Result<&'a mut ImapSession> {
        if slot.is_none() {
            *slot = Some(Self::login(settings).await?);
        }
        slot.as_mut().ok_or_else(|| TransportError::NotConnected.into())
    }

    async fn select_inbox(session: &mut ImapSession) -> Result<usize> {
        let mailbox = session
            .select(INBOX)
            .await
            .map_err(|e| TransportError::Protocol(format!("SELECT failed: {}", e)))?;
        Ok(mailbox.exists as usize)
    }

    async fn list_locked(
        settings: &Settings,
        state: &mut ImapState,
        force_refresh: bool,
    ) -> Result<Vec<MessageHeader>> {
        let session = Self::session(settings, &mut state.session).await?;
        let count = Self::select_inbox(session).await?;

        if force_refresh || state.known_count != Some(count) {
            let found = session
                .uid_search("NOT DELETED")
                .await
                .map_err(|e| TransportError::Protocol(format!("SEARCH failed: {}", e)))?;
            let mut uids: Vec<u32> = found.into_iter().collect();
            uids.sort_unstable_by(|a, b| b.cmp(a));
            tracing::debug!(count, uids = uids.len(), "refreshed UID cache");
            state.uids = uids;
            state.known_count = Some(count);
        }

        if state.uids.is_empty() {
            return Ok(Vec::new());
        }

        let fetches: Vec<Fetch> = session
            .uid_fetch(uid_set(&state.uids), "(UID ENVELOPE)")
            .await
            .map_err(|e| TransportError::Protocol(format!("FETCH failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| TransportError::Protocol(format!("FETCH stream: {}", e)))?;

        let mut by_uid: HashMap<u32, MessageHeader> = fetches
            .iter()
            .filter_map(|fetch| {
                let uid = fetch.uid?;
                header_from_fetch(uid, fetch).map(|header| (uid, header))
            })
            .collect();

        Ok(state.uids.iter().filter_map(|uid| by_uid.remove(uid)).collect())
    }

    async fn read_locked(
        settings: &Settings,
        state: &mut ImapState,
        id: MessageId,
    ) -> Result<Message> {
        let session = Self::session(settings, &mut state.session).await?;
        Self::select_inbox(session).await?;

        let fetches: Vec<Fetch> = session
            .uid_fetch(id.to_string(), "(UID ENVELOPE BODY.PEEK[])")
            .await
            .map_err(|e| TransportError::Protocol(format!("FETCH failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| TransportError::Protocol(format!("FETCH stream: {}", e)))?;

        let fetch = fetches
            .iter()
            .find(|f| f.uid == Some(id.0))
            .ok_or(TransportError::NotFound(id))?;

        let raw = fetch
            .body()
            .ok_or_else(|| TransportError::Protocol("unable to get message body".to_string()))?;
        let parsed = MessageParser::default().parse(raw);

        let header = header_from_fetch(id.0, fetch)
            .or_else(|| parsed.as_ref().map(|p| header_from_parsed(id, p)))
            .ok_or_else(|| TransportError::Protocol("message has no envelope".to_string()))?;

        let body = parsed
            .as_ref()
            .and_then(|p| p.body_text(0).map(|text| text.into_owned()))
            .unwrap_or_default();

        Ok(Message { header, body })
    }

    /// Drops the session when `result` is an error so the next call reconnects
    fn with_reset<T>(state: &mut ImapState, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "IMAP operation failed, dropping session");
            state.session = None;
        }
        result
    }

    fn smtp_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        if self.settings.smtp_host.is_empty() {
            return Err(TransportError::Send("SMTP server is not configured".to_string()).into());
        }

        let credentials = SmtpCredentials::new(
            self.settings.username.clone(),
            self.settings.smtp_password.clone(),
        );

        let builder = if self.settings.smtp_port == IMPLICIT_TLS_SMTP_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_host)
        }
        .map_err(|e| TransportError::Send(format!("SMTP relay error: {}", e)))?;

        Ok(builder
            .credentials(credentials)
            .port(self.settings.smtp_port)
            .build())
    }
}

#[async_trait]
impl MailTransport for ImapSmtpTransport {
    async fn list_headers(&self, force_refresh: bool) -> Result<Vec<MessageHeader>> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let result = Self::list_locked(&self.settings, state, force_refresh).await;
        Self::with_reset(state, result)
    }

    async fn read_body(&self, id: MessageId) -> Result<Message> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let result = Self::read_locked(&self.settings, state, id).await;
        Self::with_reset(state, result)
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let email = build_email(message)?;
        let mailer = self.smtp_transport()?;

        let response = mailer
            .send(email)
            .await
            .map_err(|e| TransportError::Send(format!("SMTP send failed: {}", e)))?;

        tracing::info!(
            to = ?message.to,
            code = %response.code(),
            "message sent via SMTP"
        );
        Ok(())
    }

    async fn count_messages(&self) -> Result<usize> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let result = match Self::session(&self.settings, &mut state.session).await {
            Ok(session) => Self::select_inbox(session).await,
            Err(e) => Err(e),
        };
        Self::with_reset(state, result)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(mut session) = state.session.take() {
            session
                .logout()
                .await
                .map_err(|e| TransportError::Connection(format!("LOGOUT failed: {}", e)))?;
            tracing::info!("IMAP session closed");
        }
        Ok(())
    }
}

/// Build the SMTP message for an outgoing draft
fn build_email(message: &OutgoingMessage) -> Result<lettre::Message> {
    if message.to.is_empty() {
        return Err(TransportError::InvalidAddress("no recipients".to_string()).into());
    }

    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", message.from, e)))?;

    let mut builder = lettre::Message::builder()
        .from(from)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &message.to {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", recipient, e)))?;
        builder = builder.to(to);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| TransportError::Send(format!("failed to build message: {}", e)).into())
}

/// Comma-separated UID set for FETCH
fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// `Name <mailbox@host>` from envelope address parts
fn format_address(
    name: Option<&Cow<'_, [u8]>>,
    mailbox: Option<&Cow<'_, [u8]>>,
    host: Option<&Cow<'_, [u8]>>,
) -> String {
    let email = match (mailbox, host) {
        (Some(m), Some(h)) => format!("{}@{}", bytes_to_string(m), bytes_to_string(h)),
        (Some(m), None) => bytes_to_string(m),
        _ => String::new(),
    };
    match name.map(|n| bytes_to_string(n)).filter(|n| !n.is_empty()) {
        Some(name) => format!("{} <{}>", name, email),
        None => email,
    }
}

fn header_from_fetch(uid: u32, fetch: &Fetch) -> Option<MessageHeader> {
    let envelope = fetch.envelope()?;

    let from = envelope
        .from
        .as_ref()
        .and_then(|addrs| addrs.first())
        .map(|a| format_address(a.name.as_ref(), a.mailbox.as_ref(), a.host.as_ref()))
        .unwrap_or_default();

    let to = envelope
        .to
        .as_ref()
        .map(|addrs| {
            addrs
                .iter()
                .map(|a| format_address(a.name.as_ref(), a.mailbox.as_ref(), a.host.as_ref()))
                .collect()
        })
        .unwrap_or_default();

    let subject = envelope
        .subject
        .as_ref()
        .map(|s| bytes_to_string(s))
        .unwrap_or_default();

    let date = envelope
        .date
        .as_ref()
        .and_then(|d| DateTime::parse_from_rfc2822(&bytes_to_string(d)).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(MessageHeader {
        id: MessageId(uid),
        from,
        to,
        subject,
        date,
    })
}

fn parsed_addresses(addr: Option<&mail_parser::Address<'_>>) -> Vec<String> {
    addr.and_then(|a| a.as_list())
        .map(|list| {
            list.iter()
                .map(|a| match (a.name(), a.address()) {
                    (Some(name), Some(email)) => format!("{} <{}>", name, email),
                    (None, Some(email)) => email.to_string(),
                    (Some(name), None) => name.to_string(),
                    (None, None) => String::new(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn header_from_parsed(id: MessageId, parsed: &mail_parser::Message<'_>) -> MessageHeader {
    MessageHeader {
        id,
        from: parsed_addresses(parsed.from())
            .into_iter()
            .next()
            .unwrap_or_default(),
        to: parsed_addresses(parsed.to()),
        subject: parsed.subject().unwrap_or_default().to_string(),
        date: parsed
            .date()
            .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
            .unwrap_or_else(Utc::now),
    }
}
