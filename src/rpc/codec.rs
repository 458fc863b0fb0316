//! Datagram codec.
//!
//! Inbound wire format (authenticated commands):
//! ```text
//! ┌───────────┬────────────────────┬──────────────────┐
//! │ Opcode 1B │ Password (8B)      │ Fields (N B)     │
//! │           │ BE u64             │                  │
//! └───────────┴────────────────────┴──────────────────┘
//! ```
//!
//! Outbound wire format (every packet):
//! ```text
//! ┌──────────────────┬──────────────┬──────────────────┐
//! │ Device id (6B)   │ Zero (4B)    │ Content (N B)    │
//! └──────────────────┴──────────────┴──────────────────┘
//! ```
//!
//! Two unauthenticated pseudo-packets share the `'I'` opcode: `['I']` or
//! `['I', 1]` acknowledge a connection and `['I', 87]` reports that the
//! server reset it.
//!
//! Multi-byte numbers are big-endian.  Length-prefixed fields carry a
//! single unsigned length byte, so they are capped at 255 bytes.

use crate::error::CodecError;

use super::opcode;

/// Opcode plus password.
pub const HEADER_SIZE: usize = 9;

/// Length of the device id that prefixes every outbound packet.
pub const DEVICE_ID_SIZE: usize = 6;

/// Device id plus the reserved zero word.
pub const OUTBOUND_HEADER_SIZE: usize = DEVICE_ID_SIZE + 4;

/// A decoded inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// The server acknowledged our probe or heartbeat.
    ConnectAck,
    /// The server dropped our session.
    ConnectionReset,
    /// An authenticated command; the password is not yet checked.
    Command(Command<'a>),
}

/// Header view over an authenticated command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub opcode: u8,
    pub password: u64,
    packet: &'a [u8],
}

impl<'a> Command<'a> {
    /// Total packet length including the header.
    pub fn len(&self) -> usize {
        self.packet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packet.len() == HEADER_SIZE
    }

    /// Reader positioned at the first field after the header.
    pub fn fields(&self) -> Reader<'a> {
        Reader {
            buf: self.packet,
            pos: HEADER_SIZE,
        }
    }
}

/// Classify a raw datagram.  Returns `None` for anything that is neither a
/// connection pseudo-packet nor long enough to carry a password.
pub fn decode_inbound(packet: &[u8]) -> Option<Inbound<'_>> {
    let (&first, rest) = packet.split_first()?;

    if first == opcode::CONNECTION {
        match rest {
            [] | [opcode::CONNECT_ACK] => return Some(Inbound::ConnectAck),
            [opcode::RESET_NOTICE] => return Some(Inbound::ConnectionReset),
            _ => {}
        }
    }

    if packet.len() < HEADER_SIZE {
        return None;
    }
    let mut password = [0u8; 8];
    password.copy_from_slice(&packet[1..HEADER_SIZE]);
    Some(Inbound::Command(Command {
        opcode: first,
        password: u64::from_be_bytes(password),
        packet,
    }))
}

/// Build an authenticated command packet (used by tests and tools that play
/// the server role).
pub fn encode_command(opcode: u8, password: u64, fields: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_SIZE + fields.len());
    packet.push(opcode);
    packet.extend_from_slice(&password.to_be_bytes());
    packet.extend_from_slice(fields);
    packet
}

/// Prefix `content` with the outbound header.
pub fn frame_outbound(device_id: &[u8; DEVICE_ID_SIZE], content: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(OUTBOUND_HEADER_SIZE + content.len());
    packet.extend_from_slice(device_id);
    packet.extend_from_slice(&[0; 4]);
    packet.extend_from_slice(content);
    packet
}

// ── Field reader ─────────────────────────────────────────────

/// Cursor over the fields of a command.  Every accessor returns `None` once
/// the packet runs out, so a truncated packet can never yield a value.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let out = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(out)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Some(out)
    }

    pub fn u8(&mut self) -> Option<u8> {
        Some(self.bytes(1)?[0])
    }

    /// Any non-zero byte is `true`.
    pub fn flag(&mut self) -> Option<bool> {
        self.u8().map(|b| b != 0)
    }

    pub fn i32(&mut self) -> Option<i32> {
        self.array().map(i32::from_be_bytes)
    }

    pub fn f32(&mut self) -> Option<f32> {
        self.array().map(f32::from_be_bytes)
    }

    /// One length byte followed by that many bytes.
    pub fn short_bytes(&mut self) -> Option<&'a [u8]> {
        let len = self.u8()? as usize;
        self.bytes(len)
    }

    /// Everything left in the packet (possibly empty).
    pub fn rest(&mut self) -> &'a [u8] {
        let out = self.buf.get(self.pos..).unwrap_or_default();
        self.pos = self.buf.len();
        out
    }

    /// Remaining bytes as text; invalid UTF-8 is replaced, not rejected.
    pub fn rest_text(&mut self) -> String {
        String::from_utf8_lossy(self.rest()).into_owned()
    }
}

// ── Content writer ───────────────────────────────────────────

/// Builds reply and event content (everything after the outbound header).
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Start a message with its opcode byte.
    pub fn new(opcode: u8) -> Self {
        let mut buf = Vec::with_capacity(16);
        buf.push(opcode);
        Self { buf }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buf.push(value);
        self
    }

    pub fn flag(self, value: bool) -> Self {
        self.u8(u8::from(value))
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn f64(mut self, value: f64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Length byte plus data; fails for fields longer than 255 bytes.
    pub fn short_bytes(mut self, data: &[u8]) -> Result<Self, CodecError> {
        let len = u8::try_from(data.len()).map_err(|_| CodecError::FieldTooLong)?;
        self.buf.push(len);
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_ack_forms() {
        assert_eq!(decode_inbound(b"I"), Some(Inbound::ConnectAck));
        assert_eq!(decode_inbound(&[b'I', 1]), Some(Inbound::ConnectAck));
        assert_eq!(decode_inbound(&[b'I', 87]), Some(Inbound::ConnectionReset));
    }

    #[test]
    fn short_packets_are_dropped() {
        assert_eq!(decode_inbound(&[]), None);
        assert_eq!(decode_inbound(&[b'I', 5]), None);
        assert_eq!(decode_inbound(b"a1234567"), None);
    }

    #[test]
    fn command_header_is_big_endian() {
        let packet = encode_command(b'a', 0x0102_0304_0506_0708, &[9, 9]);
        let Some(Inbound::Command(cmd)) = decode_inbound(&packet) else {
            panic!("expected command");
        };
        assert_eq!(cmd.opcode, b'a');
        assert_eq!(cmd.password, 0x0102_0304_0506_0708);
        assert_eq!(cmd.len(), 11);
        assert_eq!(cmd.fields().rest(), &[9, 9]);
    }

    #[test]
    fn long_i_packet_is_a_command() {
        let packet = encode_command(b'I', 0, &[]);
        assert!(matches!(decode_inbound(&packet), Some(Inbound::Command(_))));
    }

    #[test]
    fn outbound_header_layout() {
        let framed = frame_outbound(&[1, 2, 3, 4, 5, 6], b"ok");
        assert_eq!(framed, vec![1, 2, 3, 4, 5, 6, 0, 0, 0, 0, b'o', b'k']);
    }

    #[test]
    fn reader_stops_at_end() {
        let mut r = Reader::new(&[0, 0, 0, 7, 3, b'a', b'b']);
        assert_eq!(r.i32(), Some(7));
        assert_eq!(r.short_bytes(), None);
        let mut r = Reader::new(&[2, b'a', b'b', b'c']);
        assert_eq!(r.short_bytes(), Some(&b"ab"[..]));
        assert_eq!(r.rest(), b"c");
        assert_eq!(r.u8(), None);
        assert!(r.rest().is_empty());
    }

    #[test]
    fn reader_floats() {
        let bytes = 1.5f32.to_be_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.f32(), Some(1.5));
    }

    #[test]
    fn lossy_text() {
        let mut r = Reader::new(&[b'h', 0xFF, b'i']);
        assert_eq!(r.rest_text(), "h\u{FFFD}i");
    }

    #[test]
    fn writer_rejects_long_field() {
        let long = vec![0u8; 256];
        assert_eq!(
            Writer::new(b't').short_bytes(&long).unwrap_err(),
            CodecError::FieldTooLong
        );
        let msg = Writer::new(b't').short_bytes(b"id").unwrap().finish();
        assert_eq!(msg, vec![b't', 2, b'i', b'd']);
    }
}
