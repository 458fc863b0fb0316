//! Server-defined controls.
//!
//! ```text
//!  add opcode ──▶ Control { id, landscape, widget: Widget::* }
//!                      │
//!                      ├── as_text()     ─▶ &dyn TextLike
//!                      ├── as_toggle()   ─▶ &dyn Toggleable
//!                      ├── as_pushable() ─▶ &dyn Pushable
//!                      ├── as_position() ─▶ &dyn PositionLike
//!                      ├── as_level()    ─▶ &dyn LevelLike
//!                      └── as_image()    ─▶ &dyn ImageLike
//! ```
//!
//! A control is a tagged variant ([`widgets::Widget`]); what the remote peer
//! may do with it is decided by capability lookup, never by the concrete
//! kind.  The [`registry::Registry`] owns all live controls and is shared by
//! the receive worker and the UI thread.

pub mod geometry;
pub mod interaction;
pub mod registry;
pub mod widgets;

use std::sync::Arc;

use crate::rpc::image::Image;

/// Control identifier: up to 255 raw bytes, compared byte-wise.
pub type ControlId = heapless::Vec<u8, 255>;

/// Build a [`ControlId`]; `None` if longer than 255 bytes.
pub fn control_id(bytes: &[u8]) -> Option<ControlId> {
    ControlId::from_slice(bytes).ok()
}

/// Behavioral facets a control may expose to remote queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Text,
    Toggle,
    Push,
    Position,
    Level,
    Image,
}

/// Concrete control variant, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Joystick,
    Touchpad,
    Slider,
    ImageBox,
    TextField,
    Label,
    Checkbox,
    RadioButton,
}

impl ControlKind {
    pub fn has(self, capability: Capability) -> bool {
        use Capability as C;
        use ControlKind as K;
        matches!(
            (self, capability),
            (K::Button, C::Text | C::Push)
                | (K::Joystick | K::Touchpad, C::Position | C::Push)
                | (K::Slider, C::Level | C::Push)
                | (K::ImageBox, C::Image)
                | (K::TextField | K::Label, C::Text)
                | (K::Checkbox | K::RadioButton, C::Toggle | C::Text)
        )
    }
}

// ── Capability traits ────────────────────────────────────────

pub trait TextLike {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: String);
}

pub trait Toggleable {
    fn toggle_state(&self) -> bool;
    fn set_toggle_state(&mut self, state: bool);
}

pub trait Pushable {
    fn is_pushed(&self) -> bool;
}

pub trait PositionLike {
    /// Normalized `[-1, 1]` position, or `None` while there is none to report.
    fn position(&self) -> Option<[f32; 2]>;
}

pub trait LevelLike {
    fn level(&self) -> f32;
    fn set_level(&mut self, level: f32);
}

pub trait ImageLike {
    fn image(&self) -> &Arc<Image>;
    fn set_image(&mut self, image: Arc<Image>);
}
