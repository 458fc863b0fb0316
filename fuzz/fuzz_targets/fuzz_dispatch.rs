//! Fuzz target: `Dispatcher::handle`
//!
//! Feeds a sequence of authenticated commands, split from the input on a
//! 0xFF separator, to one dispatcher so that later commands see the state
//! earlier ones built.  Replies must echo their opcode and the registry must
//! stay under its cap.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use phoneiot::adapters::image_codec::JpegImageCodec;
use phoneiot::adapters::device_id::DeviceIdentity;
use phoneiot::adapters::headless::HeadlessRenderer;
use phoneiot::adapters::log_sink::LogEventSink;
use phoneiot::adapters::resolver::StaticPortResolver;
use phoneiot::adapters::time::SystemClock;
use phoneiot::app::context::EngineContext;
use phoneiot::config::EngineConfig;
use phoneiot::rpc::codec::{Inbound, decode_inbound, encode_command};
use phoneiot::rpc::dispatcher::Dispatcher;

const PW: u64 = 42;
const MAX_CONTROLS: usize = 16;

fuzz_target!(|data: &[u8]| {
    let config = EngineConfig {
        initial_password: Some(PW),
        max_controls: MAX_CONTROLS,
        image_budget_bytes: 64 * 1024,
        ..EngineConfig::default()
    };
    let ctx = EngineContext::new(
        config,
        DeviceIdentity::from_bytes([0; 6]),
        Arc::new(SystemClock),
        Arc::new(HeadlessRenderer::new(640.0, 480.0)),
        Arc::new(LogEventSink),
        Arc::new(JpegImageCodec),
        Arc::new(StaticPortResolver(1976)),
    );
    let dispatcher = Dispatcher::new(Arc::new(ctx));

    for chunk in data.split(|&b| b == 0xFF) {
        let Some((&opcode, fields)) = chunk.split_first() else {
            continue;
        };
        let packet = encode_command(opcode, PW, fields);
        let Some(Inbound::Command(cmd)) = decode_inbound(&packet) else {
            continue;
        };
        if let Some(reply) = dispatcher.handle(&cmd) {
            assert_eq!(reply.first(), Some(&opcode));
        }
        assert!(dispatcher.context().registry.len() <= MAX_CONTROLS);
    }
});
