//! Request/reply behaviour seen from the server side of the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use phoneiot::adapters::image_codec::JpegImageCodec;
use phoneiot::app::ports::ImageCodec;
use phoneiot::app::service::Engine;
use phoneiot::config::EngineConfig;
use phoneiot::controls::Capability;
use phoneiot::rpc::codec::{OUTBOUND_HEADER_SIZE, encode_command};
use phoneiot::rpc::image::Image;
use phoneiot::rpc::transport::MAX_DATAGRAM;

use super::mock_transport::{
    MockTransport, PW, RecordingEvents, button_fields, collaborators, memory_storage, server,
};

fn start() -> (Engine, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let events = Arc::new(RecordingEvents::default());
    let config = EngineConfig {
        initial_password: Some(PW),
        server: Some("127.0.0.1".into()),
        ..EngineConfig::default()
    };
    let engine = Engine::start_with_transport(
        config,
        collaborators(Arc::clone(&events), memory_storage()),
        Arc::clone(&transport),
    )
    .expect("engine starts");
    assert!(transport.wait_for(|c, _| c == [b'I', 0]).is_some());
    transport.inject(vec![b'I'], server());
    (engine, transport)
}

fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Pseudo-random camera-like frame that JPEG cannot squeeze much.
fn noise(width: u32, height: u32) -> Image {
    let mut state = 0x2545_F491_u32;
    image::RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgba([r, g, b, 255])
    })
    .into()
}

/// Matches a joystick/touchpad position event with the given pointer tag.
fn position_tag(tag: u8) -> impl Fn(&[u8], SocketAddr) -> bool {
    move |c, _| c.first() == Some(&b'n') && c.get(5) == Some(&tag)
}

#[test]
fn replies_go_to_the_sender() {
    let (engine, transport) = start();
    let other: SocketAddr = ([10, 1, 2, 3], 4000).into();
    transport.inject(encode_command(b'a', PW, &[]), other);
    assert!(transport.wait_for(|c, to| c == b"a" && to == other).is_some());
    engine.shutdown();
}

#[test]
fn add_duplicate_and_query() {
    let (engine, transport) = start();
    transport.command(b'B', &button_fields(b"b1", "Go"));
    assert!(transport.wait_reply(&[b'B', 0]));
    transport.command(b'B', &button_fields(b"b1", "Go"));
    assert!(transport.wait_reply(&[b'B', 2]));

    transport.command(b'h', b"b1");
    assert!(transport.wait_reply(b"h\0Go"));
    transport.command(b'h', b"missing");
    assert!(transport.wait_reply(b"h"));
    engine.shutdown();
}

#[test]
fn malformed_and_unauthenticated_packets_get_no_reply() {
    let (engine, transport) = start();
    transport.inject(vec![b'a', 0, 0, 0], server());
    transport.inject(encode_command(b'a', PW ^ 1, &[]), server());
    transport.command(b'B', &[0; 10]);
    transport.command(b'a', &[]);
    assert!(transport.wait_reply(b"a"));
    assert_eq!(transport.count(|c| c == b"a"), 1);
    assert_eq!(transport.count(|c| c.first() == Some(&b'B')), 0);
    assert!(engine.context().registry.is_empty());
    engine.shutdown();
}

#[test]
fn sensor_reads_report_support() {
    let (engine, transport) = start();
    transport.command(b'l', &[]);
    assert!(transport.wait_reply(b"l"));

    let light = &engine.context().sensors.light;
    light.set_supported(true);
    light.update(&[321.0]);
    transport.command(b'l', &[]);
    let mut expected = vec![b'l'];
    expected.extend_from_slice(&321.0f64.to_be_bytes());
    assert!(transport.wait_reply(&expected));
    engine.shutdown();
}

#[test]
fn periods_start_snapshot_stream() {
    let (engine, transport) = start();
    let mut periods = 500i32.to_be_bytes().to_vec();
    periods.extend_from_slice(&30i32.to_be_bytes());
    transport.command(b'p', &periods);
    assert!(transport.wait_reply(b"p"));

    let (first, _) = transport
        .wait_nth(3, |c, to| c.first() == Some(&b'Q') && to == server())
        .expect("snapshots");
    // 13 sensors, all unsupported: one zero count each.
    assert_eq!(first.len(), 1 + 4 + 13);
    let stamps: Vec<i32> = transport
        .sent()
        .iter()
        .filter(|(c, _)| c.first() == Some(&b'Q'))
        .map(|(c, _)| i32::from_be_bytes([c[1], c[2], c[3], c[4]]))
        .collect();
    assert_eq!(&stamps[..3], &[0, 1, 2]);
    engine.shutdown();
}

#[test]
fn oversized_image_is_scaled_for_the_reply() {
    let (engine, transport) = start();
    let mut f = floats(&[0.0, 0.0, 50.0, 50.0]);
    f.extend_from_slice(&[0, 0, 0]);
    f.extend_from_slice(b"pic");
    transport.command(b'U', &f);
    assert!(transport.wait_reply(&[b'U', 0]));

    let target = engine
        .context()
        .registry
        .find_where(b"pic", Capability::Image)
        .unwrap();
    engine.submit_image(&target, noise(2000, 2000));
    assert!(transport.wait_reply(b"bpic"));

    transport.command(b'u', b"pic");
    let (reply, _) = transport
        .wait_for(|c, _| c.first() == Some(&b'u'))
        .unwrap();
    assert!(OUTBOUND_HEADER_SIZE + reply.len() <= MAX_DATAGRAM);
    let image = JpegImageCodec.decode(&reply[1..]).unwrap();
    assert!(image.raw_size() <= engine.context().config.image_budget_bytes);
    assert_eq!(image.width(), image.height());
    engine.shutdown();
}

#[test]
fn joystick_drag_reports_positions() {
    let (engine, transport) = start();
    // x 10%, y 10%, width 40% of 720 → 288px square at (72, 120).
    let mut f = floats(&[10.0, 10.0, 40.0]);
    f.extend_from_slice(&0xFF00_00FFu32.to_be_bytes());
    f.push(0);
    f.extend_from_slice(b"js");
    transport.command(b'j', &f);
    assert!(transport.wait_reply(&[b'j', 0]));

    let (cx, cy) = (72.0 + 144.0, 120.0 + 144.0);
    engine.pointer_down(0, cx, cy);
    engine.pointer_up(0);

    assert!(transport.wait_for(position_tag(0)).is_some());
    assert!(transport.wait_for(position_tag(2)).is_some());
    transport.command(b'J', b"js");
    assert!(transport.wait_for(|c, _| c.first() == Some(&b'J')).is_some());
    engine.shutdown();
}
