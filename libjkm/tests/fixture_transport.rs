//! Integration tests for the in-memory transport
//!
//! The fixture stands in for a mail server in the client's own tests, so
//! these pin down the behaviour those tests lean on.

use libjkm::transport::fixture::{sample_headers, FixtureTransport};
use libjkm::transport::{FixtureFactory, MailTransport, TransportFactory};
use libjkm::{Config, Draft, JkmError, Message, MessageId, TransportError};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_list_is_newest_first_and_repeatable() {
    let transport = FixtureTransport::new();

    let first = transport.list_headers(false).await.unwrap();
    let second = transport.list_headers(true).await.unwrap();

    let ids: Vec<u32> = first.iter().map(|h| h.id.0).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(first, second);
    assert_eq!(transport.list_calls(), 2);
}

#[tokio::test]
async fn test_delivered_message_appears_first() {
    let transport = FixtureTransport::new();
    let mut header = sample_headers().remove(0);
    header.id = MessageId(4);
    header.subject = "Fresh".to_string();

    transport.deliver(Message {
        header,
        body: "new".to_string(),
    });

    let headers = transport.list_headers(false).await.unwrap();
    assert_eq!(headers[0].id, MessageId(4));
    assert_eq!(transport.count_messages().await.unwrap(), 4);
}

#[tokio::test]
async fn test_read_unknown_id_is_not_found() {
    let transport = FixtureTransport::new();

    let err = transport.read_body(MessageId(99)).await.unwrap_err();

    assert!(matches!(
        err,
        JkmError::Transport(TransportError::NotFound(MessageId(99)))
    ));
}

#[tokio::test]
async fn test_injected_errors_surface_until_cleared() {
    let transport = FixtureTransport::new();
    transport.set_list_error(Some(TransportError::Connection("refused".to_string())));

    assert!(transport.list_headers(false).await.is_err());

    transport.set_list_error(None);
    assert!(transport.list_headers(false).await.is_ok());
}

#[tokio::test]
async fn test_send_records_outbox() {
    let transport = FixtureTransport::new();
    let outgoing = Draft::new("bob@example.com, carol@example.com", "Hi", "Hello")
        .into_outgoing("alice@example.com");

    transport.send(&outgoing).await.unwrap();

    let outbox = transport.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, vec!["bob@example.com", "carol@example.com"]);
    assert_eq!(transport.send_calls(), 1);
}

#[tokio::test]
async fn test_failed_send_leaves_outbox_empty() {
    let transport = FixtureTransport::new();
    transport.set_send_error(Some(TransportError::Send("relay denied".to_string())));
    let outgoing = Draft::new("bob@example.com", "Hi", "Hello").into_outgoing("alice@example.com");

    let err = transport.send(&outgoing).await.unwrap_err();

    assert!(err.to_string().contains("relay denied"));
    assert!(transport.outbox().is_empty());
}

#[tokio::test]
async fn test_delay_is_applied() {
    let transport = FixtureTransport::new();
    transport.set_delay(Duration::from_millis(50));

    let start = Instant::now();
    transport.list_headers(false).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_factory_shares_one_transport() {
    let transport = Arc::new(FixtureTransport::new());
    let factory = FixtureFactory::new(transport.clone());

    let a = factory.build(&Config::default()).unwrap();
    let b = factory.build(&Config::default()).unwrap();
    drop((a, b));

    assert_eq!(transport.builds(), 2);
    assert!(Arc::ptr_eq(&factory.transport(), &transport));
}
