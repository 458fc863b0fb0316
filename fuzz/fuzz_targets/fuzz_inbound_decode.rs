//! Fuzz target: `decode_inbound` and the add-control decoder
//!
//! Classifies arbitrary datagrams and, for commands, walks every field
//! reader the dispatcher uses.  Nothing may panic or read past the packet.
//!
//! cargo fuzz run fuzz_inbound_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use phoneiot::rpc::codec::{HEADER_SIZE, Inbound, decode_inbound};
use phoneiot::rpc::messages::decode_add;
use phoneiot::rpc::opcode::Opcode;

fuzz_target!(|data: &[u8]| {
    let Some(Inbound::Command(cmd)) = decode_inbound(data) else {
        return;
    };
    assert!(cmd.len() >= HEADER_SIZE);

    let mut r = cmd.fields();
    assert_eq!(r.remaining(), cmd.len() - HEADER_SIZE);
    while r.short_bytes().is_some() {}
    let _ = r.rest();

    if let Some(op) = Opcode::from_u8(cmd.opcode) {
        if let Some(req) = decode_add(op, &cmd) {
            assert!(req.id.len() <= 255);
        }
    }
});
