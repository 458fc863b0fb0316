//! Engine lifecycle: connection handling, heartbeats, user commands,
//! persistence and local interaction.

use std::sync::Arc;

use phoneiot::adapters::storage::SettingsStore;
use phoneiot::app::commands::EngineCommand;
use phoneiot::app::events::EngineEvent;
use phoneiot::app::service::Engine;
use phoneiot::config::EngineConfig;
use phoneiot::rpc::codec::encode_command;
use phoneiot::rpc::io_task::LinkState;

use super::mock_transport::{
    MockTransport, PW, RecordingEvents, button_fields, collaborators, memory_storage, server,
};

const PROBE: &[u8] = &[b'I', 0];
const HEARTBEAT: &[u8] = &[b'I'];

fn config() -> EngineConfig {
    EngineConfig {
        initial_password: Some(PW),
        server: Some("127.0.0.1".into()),
        heartbeat_interval_ms: 100,
        reconnect_delay_ms: 100,
        ..EngineConfig::default()
    }
}

fn start_with(
    config: EngineConfig,
    storage: Box<dyn phoneiot::app::ports::StoragePort>,
) -> (Engine, Arc<MockTransport>, Arc<RecordingEvents>) {
    let transport = MockTransport::new();
    let events = Arc::new(RecordingEvents::default());
    let engine = Engine::start_with_transport(
        config,
        collaborators(Arc::clone(&events), storage),
        Arc::clone(&transport),
    )
    .expect("engine starts");
    (engine, transport, events)
}

fn start() -> (Engine, Arc<MockTransport>, Arc<RecordingEvents>) {
    start_with(config(), memory_storage())
}

/// Wait for the probe and acknowledge it.
fn connect(transport: &MockTransport, events: &RecordingEvents) {
    assert!(transport.wait_for(|c, to| c == PROBE && to == server()).is_some());
    transport.inject(vec![b'I', 1], server());
    assert!(events.wait_for(|e| *e == EngineEvent::Connected(server())));
}

fn temp_settings(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("phoneiot-it-{}-{name}.bin", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn startup_announces_identity_and_probes_server() {
    let (engine, transport, events) = start();
    connect(&transport, &events);

    let all = events.all();
    assert!(all.iter().any(|e| matches!(e, EngineEvent::DeviceIdReady(id) if id.len() == 12)));
    assert!(all.contains(&EngineEvent::PasswordChanged(PW)));
    assert!(all.contains(&EngineEvent::SensorsRunning(true)));
    assert!(all.contains(&EngineEvent::ProbeSent(server())));
    assert_eq!(engine.context().link.state(), LinkState::Connected(server()));
    engine.shutdown();
}

#[test]
fn heartbeats_follow_the_probe() {
    let (engine, transport, events) = start();
    connect(&transport, &events);
    assert!(transport.wait_nth(2, |c, to| c == HEARTBEAT && to == server()).is_some());
    engine.shutdown();
}

#[test]
fn server_reset_schedules_reconnect() {
    let (engine, transport, events) = start();
    connect(&transport, &events);

    transport.inject(vec![b'I', 87], server());
    assert!(events.wait_for(|e| *e == EngineEvent::ConnectionReset));
    // Reconnect after the configured delay, to the same host.
    assert!(transport.wait_nth(2, |c, to| c == PROBE && to == server()).is_some());
    // The endpoint survives the reset.
    assert_eq!(engine.context().link.endpoint(), Some(server()));
    engine.shutdown();
}

#[test]
fn user_reset_request_goes_to_endpoint() {
    let (mut engine, transport, events) = start();
    connect(&transport, &events);
    engine.handle_command(EngineCommand::ResetConnection).unwrap();
    assert!(transport.wait_reply(&[b'I', 86]));
    engine.shutdown();
}

#[test]
fn explicit_connect_probes_new_host() {
    let mut cfg = config();
    cfg.server = None;
    let (mut engine, transport, events) = start_with(cfg, memory_storage());
    assert_eq!(engine.context().link.endpoint(), None);

    engine
        .handle_command(EngineCommand::Connect("http://127.0.0.1:8080/".into()))
        .unwrap();
    connect(&transport, &events);
    engine.shutdown();
}

#[test]
fn unresolvable_host_is_reported() {
    let mut cfg = config();
    cfg.server = Some("host.invalid".into());
    let (engine, _transport, events) = start_with(cfg, memory_storage());
    assert!(events.wait_for(
        |e| matches!(e, EngineEvent::EndpointUnreachable(h) if h == "host.invalid")
    ));
    assert_eq!(engine.context().link.endpoint(), None);
    engine.shutdown();
}

#[test]
fn regenerated_password_replaces_old_one() {
    let (mut engine, transport, events) = start();
    connect(&transport, &events);

    engine.handle_command(EngineCommand::RegeneratePassword).unwrap();
    let fresh = engine.context().password.current();
    assert_ne!(fresh, PW);
    assert!(events.all().contains(&EngineEvent::PasswordChanged(fresh)));

    transport.inject(encode_command(b'a', PW, &[]), server());
    transport.inject(encode_command(b'a', fresh, &[]), server());
    assert!(transport.wait_reply(b"a"));
    assert_eq!(transport.count(|c| c == b"a"), 1);
    engine.shutdown();
}

#[test]
fn pause_and_resume() {
    let (mut engine, _transport, events) = start();
    engine.handle_command(EngineCommand::Pause).unwrap();
    assert!(!engine.context().gate.is_running());
    assert!(events.all().contains(&EngineEvent::SensorsRunning(false)));

    engine.handle_command(EngineCommand::Resume).unwrap();
    assert!(engine.context().gate.is_running());
    engine.shutdown();
}

#[test]
fn run_in_background_persists_and_keeps_sensors_running() {
    let path = temp_settings("background");
    let (mut engine, _t, _e) = start_with(config(), Box::new(SettingsStore::open(&path).unwrap()));
    let device = engine.context().identity;
    assert!(!engine.run_in_background());
    engine
        .handle_command(EngineCommand::SetRunInBackground(true))
        .unwrap();
    engine.shutdown();

    let (mut engine, _t, _e) = start_with(config(), Box::new(SettingsStore::open(&path).unwrap()));
    assert!(engine.run_in_background());
    assert_eq!(engine.context().identity, device);
    engine.handle_command(EngineCommand::Pause).unwrap();
    assert!(engine.context().gate.is_running());
    engine.shutdown();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn tapping_a_button_notifies_server() {
    let (engine, transport, events) = start();
    connect(&transport, &events);
    transport.command(b'B', &button_fields(b"go", "Go"));
    assert!(transport.wait_reply(&[b'B', 0]));

    // 10%,10% of 720×1200 is (72, 120); the button is 144×120.
    assert!(engine.pointer_down(3, 100.0, 150.0).is_none());
    engine.pointer_up(3);
    assert!(transport.wait_reply(b"bgo"));

    // A miss sends nothing.
    assert!(engine.pointer_down(4, 700.0, 1100.0).is_none());
    engine.pointer_up(4);
    assert_eq!(transport.count(|c| c.first() == Some(&b'b')), 1);
    engine.shutdown();
}
