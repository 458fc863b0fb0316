//! Command dispatcher: opcode table of the protocol.
//!
//! ```text
//!  Command ──▶ password ok? ──no──▶ drop
//!                  │yes
//!                  ▼
//!             Opcode::from_u8 ──unknown──▶ drop
//!                  │
//!       ┌──────────┼───────────┬──────────────┬──────────────┐
//!       ▼          ▼           ▼              ▼              ▼
//!   sensor read  session   control query   control set   add / remove
//!   [op][f64…]   [a] [p]   [op][state…]    [op][status]  [op][status]
//! ```
//!
//! Every handler checks its own minimum length and returns `None` for a
//! malformed packet, which the receive worker drops without a reply.  A well
//! formed request always gets a reply, even when its target is missing.
//!
//! Ids that run to the end of the packet can exceed the 255-byte id cap.
//! Such an id never matches a registered control, so lookups report it as
//! not found.
//!
//! Image replies are shrunk until the encoded blob fits one datagram.

use std::sync::Arc;

use log::debug;

use super::codec::{Command, HEADER_SIZE, OUTBOUND_HEADER_SIZE, Writer};
use super::image::encode_to_fit;
use super::messages::{add_min_len, decode_add};
use super::opcode::Opcode;
use super::stream::encode_reading;
use super::transport::MAX_DATAGRAM;
use crate::app::context::EngineContext;
use crate::controls::Capability;
use crate::controls::widgets::Control;
use crate::sensors::SensorKind;

/// Status byte of a set request whose target does not exist.
pub const NOT_FOUND: u8 = 3;
/// Status byte of a query whose target lacks the requested state.
pub const NO_STATE: u8 = 2;
pub const OK: u8 = 0;

/// Largest image blob that still fits one datagram after the outbound
/// header and the opcode byte.
const MAX_IMAGE_REPLY: usize = MAX_DATAGRAM - OUTBOUND_HEADER_SIZE - 1;

pub struct Dispatcher {
    ctx: Arc<EngineContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Run one authenticated command.  Returns the reply content, or `None`
    /// when the packet must be dropped.
    pub fn handle(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if !self.ctx.password.verify(cmd.password) {
            debug!("RX: wrong password on '{}'", cmd.opcode.escape_ascii());
            return None;
        }
        let Some(op) = Opcode::from_u8(cmd.opcode) else {
            debug!("RX: unknown opcode 0x{:02x}", cmd.opcode);
            return None;
        };

        if let Some(kind) = SensorKind::from_opcode(op) {
            return self.read_sensor(op, kind, cmd);
        }
        if add_min_len(op).is_some() {
            return self.add_control(op, cmd);
        }

        match op {
            Opcode::Authenticate => Some(vec![op.as_u8()]),
            Opcode::SetSensorPeriods => self.set_periods(cmd),
            Opcode::GetImage => Some(self.get_image(cmd)),
            Opcode::SetImage => self.set_image(cmd),
            Opcode::SetText => self.set_text(cmd),
            Opcode::GetText => Some(self.get_text(cmd)),
            Opcode::GetPosition => Some(self.get_position(cmd)),
            Opcode::GetLevel => Some(self.get_level(cmd)),
            Opcode::SetLevel => self.set_level(cmd),
            Opcode::IsPushed => Some(self.is_pushed(cmd)),
            Opcode::GetToggleState => Some(self.get_toggle(cmd)),
            Opcode::SetToggleState => self.set_toggle(cmd),
            Opcode::ClearControls => self.clear(cmd),
            Opcode::RemoveControl => Some(self.remove(cmd)),
            _ => None,
        }
    }

    // ── Sensors and session ──────────────────────────────────

    fn read_sensor(&self, op: Opcode, kind: SensorKind, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if !cmd.is_empty() {
            return None;
        }
        let reading = self.ctx.sensors.read(kind);
        Some(encode_reading(op.as_u8(), reading.as_ref()))
    }

    fn set_periods(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if (cmd.len() - HEADER_SIZE) % 4 != 0 {
            return None;
        }
        let mut r = cmd.fields();
        let periods: Vec<i32> = std::iter::from_fn(|| r.i32()).collect();
        self.ctx.throttle.set_periods(&periods);
        Some(vec![cmd.opcode])
    }

    // ── Control lifecycle ────────────────────────────────────

    fn add_control(&self, op: Opcode, cmd: &Command<'_>) -> Option<Vec<u8>> {
        let Some(req) = decode_add(op, cmd) else {
            debug!("RX: malformed add '{}'", cmd.opcode.escape_ascii());
            return None;
        };
        let control = Control::from_request(req, self.ctx.render.viewport());
        let outcome = self.ctx.registry.try_add(control);
        Some(vec![cmd.opcode, outcome.status()])
    }

    fn clear(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if !cmd.is_empty() {
            return None;
        }
        self.ctx.registry.clear();
        self.ctx.pointers.reset();
        Some(vec![cmd.opcode])
    }

    fn remove(&self, cmd: &Command<'_>) -> Vec<u8> {
        let id = cmd.fields().rest();
        if !self.ctx.registry.remove(id) {
            debug!("RX: remove of unknown control");
        }
        vec![cmd.opcode]
    }

    // ── Queries ──────────────────────────────────────────────

    fn get_image(&self, cmd: &Command<'_>) -> Vec<u8> {
        let reply = Writer::new(cmd.opcode);
        let id = cmd.fields().rest();
        let Some(handle) = self.ctx.registry.find_where(id, Capability::Image) else {
            return reply.finish();
        };
        let Some(image) = handle.lock().as_image().map(|i| Arc::clone(i.image())) else {
            return reply.finish();
        };
        let budget = self.ctx.config.image_budget_bytes;
        match encode_to_fit(&image, budget, MAX_IMAGE_REPLY, self.ctx.images.as_ref()) {
            Ok(blob) => reply.bytes(&blob).finish(),
            Err(e) => {
                debug!("RX: cannot encode image reply: {e}");
                reply.finish()
            }
        }
    }

    fn get_text(&self, cmd: &Command<'_>) -> Vec<u8> {
        let reply = Writer::new(cmd.opcode);
        let id = cmd.fields().rest();
        let text = self
            .ctx
            .registry
            .find_where(id, Capability::Text)
            .and_then(|h| h.lock().as_text().map(|t| t.text().to_owned()));
        match text {
            Some(text) => reply.u8(OK).bytes(text.as_bytes()).finish(),
            None => reply.finish(),
        }
    }

    fn get_position(&self, cmd: &Command<'_>) -> Vec<u8> {
        let reply = Writer::new(cmd.opcode);
        let id = cmd.fields().rest();
        let Some(handle) = self.ctx.registry.find_where(id, Capability::Position) else {
            return reply.finish();
        };
        let position = handle.lock().as_position().and_then(|p| p.position());
        match position {
            Some([x, y]) => reply.u8(1).f32(x).f32(y).finish(),
            None => reply.u8(0).finish(),
        }
    }

    fn get_level(&self, cmd: &Command<'_>) -> Vec<u8> {
        let reply = Writer::new(cmd.opcode);
        let id = cmd.fields().rest();
        let level = self
            .ctx
            .registry
            .find_where(id, Capability::Level)
            .and_then(|h| h.lock().as_level().map(|l| l.level()));
        match level {
            Some(level) => reply.f32(level).finish(),
            None => reply.finish(),
        }
    }

    fn is_pushed(&self, cmd: &Command<'_>) -> Vec<u8> {
        let id = cmd.fields().rest();
        let state = self
            .ctx
            .registry
            .find_where(id, Capability::Push)
            .and_then(|h| h.lock().as_pushable().map(|p| p.is_pushed()));
        flag_reply(cmd.opcode, state)
    }

    fn get_toggle(&self, cmd: &Command<'_>) -> Vec<u8> {
        let id = cmd.fields().rest();
        let state = self
            .ctx
            .registry
            .find_where(id, Capability::Toggle)
            .and_then(|h| h.lock().as_toggle().map(|t| t.toggle_state()));
        flag_reply(cmd.opcode, state)
    }

    // ── Mutations ────────────────────────────────────────────

    // [i][pw][idlen][id][blob…]
    fn set_image(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if cmd.len() < HEADER_SIZE + 1 {
            return None;
        }
        let mut r = cmd.fields();
        let id = r.short_bytes()?;
        let Some(handle) = self.ctx.registry.find_where(id, Capability::Image) else {
            return Some(vec![cmd.opcode, NOT_FOUND]);
        };
        let image = match self.ctx.images.decode(r.rest()) {
            Ok(image) => Arc::new(image),
            Err(e) => {
                debug!("RX: undecodable image: {e}");
                return None;
            }
        };
        self.ctx.registry.update(&handle, |c| {
            if let Some(target) = c.as_image_mut() {
                target.set_image(image);
            }
        });
        Some(vec![cmd.opcode, OK])
    }

    // [H][pw][idlen][id][text…]
    fn set_text(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        if cmd.len() < HEADER_SIZE + 1 {
            return None;
        }
        let mut r = cmd.fields();
        let id = r.short_bytes()?;
        let Some(handle) = self.ctx.registry.find_where(id, Capability::Text) else {
            return Some(vec![cmd.opcode, NOT_FOUND]);
        };
        let text = r.rest_text();
        self.ctx.registry.update(&handle, |c| {
            if let Some(target) = c.as_text_mut() {
                target.set_text(text);
            }
        });
        Some(vec![cmd.opcode, OK])
    }

    // [e][pw][level f32][id…]
    fn set_level(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        let mut r = cmd.fields();
        let level = r.f32()?;
        let id = r.rest();
        let Some(handle) = self.ctx.registry.find_where(id, Capability::Level) else {
            return Some(vec![cmd.opcode, NOT_FOUND]);
        };
        self.ctx.registry.update(&handle, |c| {
            if let Some(target) = c.as_level_mut() {
                target.set_level(level);
            }
        });
        Some(vec![cmd.opcode, OK])
    }

    // [w][pw][state][id…]
    fn set_toggle(&self, cmd: &Command<'_>) -> Option<Vec<u8>> {
        let mut r = cmd.fields();
        let state = r.flag()?;
        let id = r.rest();
        let status = match self.ctx.registry.find_where(id, Capability::Toggle) {
            Some(handle) if self.ctx.registry.set_toggle(&handle, state) => OK,
            _ => NOT_FOUND,
        };
        Some(vec![cmd.opcode, status])
    }
}

/// `[op, 1|0]` for a boolean state, `[op, 2]` when there is none.
fn flag_reply(opcode: u8, state: Option<bool>) -> Vec<u8> {
    let status = state.map_or(NO_STATE, u8::from);
    vec![opcode, status]
}
