//! Router state machine transitions
//!
//! Drives the router through the event vocabulary with a fixture transport
//! and checks mode changes, dispatched work and the send guard.

mod common;

use common::{complete_config, key, Harness};
use crossterm::event::KeyCode;
use jkm_tui::app::{Command, Event, Mode, Task, View};
use libjkm::transport::fixture::sample_headers;
use libjkm::{Config, Draft, MessageId, TransportError};

fn draft() -> Draft {
    Draft::new("bob@example.com", "Lunch", "Noon?")
}

#[test]
fn test_show_events_switch_modes() {
    let mut h = Harness::new(complete_config());

    h.send(Event::ShowCompose);
    assert_eq!(h.mode(), Mode::Compose);

    h.send(Event::ShowRead(sample_headers()[0].clone()));
    assert_eq!(h.mode(), Mode::Read);
    assert_eq!(h.dispatched, vec![Task::FetchBody(MessageId(3))]);

    h.send(Event::ShowList);
    assert_eq!(h.mode(), Mode::List);
    assert_eq!(
        h.dispatched.last(),
        Some(&Task::ListHeaders {
            force_refresh: false
        })
    );
}

#[test]
fn test_failure_routes_to_error_from_any_mode() {
    for setup in [Event::ShowCompose, Event::ShowList, Event::ShowRead(sample_headers()[1].clone())] {
        let mut h = Harness::new(complete_config());
        h.send(setup);
        h.send(Event::Failure("connection reset".to_string()));
        assert_eq!(h.mode(), Mode::Error);
    }
}

#[test]
fn test_error_round_trip_fetches_exactly_once() {
    let mut h = Harness::new(complete_config());
    h.fixture
        .set_list_error(Some(TransportError::Connection("refused".to_string())));
    h.start().run_tasks();
    assert_eq!(h.mode(), Mode::Error);

    h.fixture.set_list_error(None);
    h.take_dispatched();
    h.send(key(KeyCode::Char('x')));

    assert_eq!(h.mode(), Mode::List);
    assert_eq!(h.list_fetches(), 1);

    h.run_tasks();
    match h.router.view() {
        View::List(list) => assert_eq!(list.headers().len(), 3),
        _ => panic!("expected list view"),
    }
}

#[test]
fn test_duplicate_send_is_suppressed() {
    let mut h = Harness::new(complete_config());
    h.send(Event::ShowCompose);

    h.send(Event::SendRequested(draft()));
    h.send(Event::SendRequested(draft()));

    assert_eq!(h.send_tasks(), 1);
    assert!(h.router.is_sending());
    assert_eq!(h.mode(), Mode::Sending);
}

#[test]
fn test_send_completion_allows_next_send() {
    let mut h = Harness::new(complete_config());
    h.send(Event::ShowCompose);
    h.send(Event::SendRequested(draft()));

    h.send(Event::SendSucceeded);
    assert!(!h.router.is_sending());
    assert_eq!(h.mode(), Mode::List);
    assert_eq!(
        h.dispatched.last(),
        Some(&Task::ListHeaders {
            force_refresh: true
        })
    );

    h.send(Event::SendRequested(draft()));
    assert_eq!(h.send_tasks(), 2);
    assert!(h.router.is_sending());
}

#[test]
fn test_send_reaches_fixture_once() {
    let mut h = Harness::new(complete_config());
    h.send(Event::ShowCompose);
    h.send(Event::SendRequested(draft()));
    h.send(Event::SendRequested(draft()));
    h.run_tasks();

    assert_eq!(h.fixture.send_calls(), 1);
    assert_eq!(h.fixture.outbox()[0].from, "alice@example.com");
    assert_eq!(h.mode(), Mode::List);
    assert!(!h.router.is_sending());
}

#[test]
fn test_send_failure_shows_error_and_clears_guard() {
    let mut h = Harness::new(complete_config());
    h.fixture
        .set_send_error(Some(TransportError::Send("relay denied".to_string())));
    h.send(Event::ShowCompose);
    h.send(Event::SendRequested(draft()));
    h.run_tasks();

    assert_eq!(h.mode(), Mode::Error);
    assert!(!h.router.is_sending());
    match h.router.view() {
        View::Error(error) => assert!(error.message().contains("relay denied")),
        _ => panic!("expected error view"),
    }
}

#[test]
fn test_send_succeeded_outside_sending_keeps_mode() {
    let mut h = Harness::new(complete_config());
    h.send(Event::SendRequested(draft()));
    h.send(Event::ShowRead(sample_headers()[0].clone()));
    h.take_dispatched();

    h.send(Event::SendSucceeded);

    assert_eq!(h.mode(), Mode::Read);
    assert!(!h.router.is_sending());
    assert!(h.dispatched.is_empty());
}

#[test]
fn test_tick_refreshes_and_reschedules() {
    let mut h = Harness::new(complete_config());
    let interval = complete_config().refresh_interval();

    let command = h.router.update(Event::Tick);

    assert_eq!(
        command,
        Command::Batch(vec![
            Command::Task(Task::ListHeaders {
                force_refresh: false
            }),
            Command::ScheduleTick(interval),
        ])
    );
}

#[test]
fn test_tick_reschedules_after_failed_refresh() {
    let mut h = Harness::new(complete_config());
    h.fixture
        .set_list_error(Some(TransportError::Connection("down".to_string())));
    h.send(Event::Tick).run_tasks();
    assert_eq!(h.mode(), Mode::Error);

    let command = h.router.update(Event::Tick);

    assert!(command.tasks().len() == 1);
    assert!(matches!(
        command,
        Command::Batch(ref children) if children.contains(&Command::ScheduleTick(complete_config().refresh_interval()))
    ));
}

#[test]
fn test_tick_without_transport_only_reschedules() {
    let mut h = Harness::new(Config::default());
    assert_eq!(h.mode(), Mode::Setup);

    let command = h.router.update(Event::Tick);

    assert_eq!(command, Command::ScheduleTick(Config::default().refresh_interval()));
}

#[test]
fn test_configured_builds_transport_and_lists() {
    let mut h = Harness::new(Config::default());
    assert_eq!(h.fixture.builds(), 0);

    h.send(Event::Configured(complete_config()));

    assert_eq!(h.mode(), Mode::List);
    assert_eq!(h.fixture.builds(), 1);
    assert_eq!(h.router.config(), &complete_config());
    assert_eq!(
        h.dispatched,
        vec![Task::ListHeaders {
            force_refresh: true
        }]
    );
}

#[test]
fn test_transport_is_built_once() {
    let mut h = Harness::new(complete_config());
    h.send(Event::Configured(complete_config()));
    h.send(Event::ShowList);
    h.send(Event::Failure("x".to_string()));
    h.send(Event::ShowList);

    assert_eq!(h.fixture.builds(), 1);
}

#[test]
fn test_stale_body_is_discarded() {
    let mut h = Harness::new(complete_config());
    h.send(Event::ShowRead(sample_headers()[0].clone()));

    h.send(Event::BodyFetched {
        id: MessageId(1),
        body: "not this one".to_string(),
    });

    match h.router.view() {
        View::Read(read) => assert_eq!(read.body(), None),
        _ => panic!("expected read view"),
    }
}

#[test]
fn test_unhandled_events_leave_mode_unchanged() {
    let forwarded = vec![
        Event::Resize(100, 30),
        Event::SpinnerTick,
        Event::ListRefreshed(sample_headers()),
        Event::BodyFetched {
            id: MessageId(2),
            body: "b".to_string(),
        },
    ];
    let entries = vec![
        (Event::ShowList, Mode::List),
        (Event::ShowCompose, Mode::Compose),
        (Event::ShowRead(sample_headers()[0].clone()), Mode::Read),
        (Event::Failure("e".to_string()), Mode::Error),
        (Event::SendRequested(draft()), Mode::Sending),
    ];

    for (entry, mode) in entries {
        for event in &forwarded {
            let mut h = Harness::new(complete_config());
            h.send(entry.clone());
            assert_eq!(h.mode(), mode);

            h.send(event.clone());
            assert_eq!(h.mode(), mode, "{:?} changed mode {:?}", event, mode);
        }
    }
}
