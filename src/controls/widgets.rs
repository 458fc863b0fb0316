//! Control variants, their capabilities and local pointer behavior.
//!
//! Geometry arrives in percent of the viewport and is resolved to device
//! pixels once, when the control is created.  Hit boxes follow the drawn
//! shape: ellipses for round buttons and joysticks, rotated rectangles for
//! landscape controls, padded boxes for small targets.

use std::sync::Arc;

use super::geometry::{Rect, local_pos};
use super::{
    ControlId, ControlKind, ImageLike, LevelLike, PositionLike, Pushable, TextLike, Toggleable,
};
use crate::app::ports::Viewport;
use crate::rpc::image::Image;
use crate::rpc::messages::{self, AddKind, AddRequest, PointerTag};

/// Thickness of a slider bar in pixels.
const SLIDER_BAR_HEIGHT: f32 = 20.0;
/// Extra touch margin around a slider bar.
const SLIDER_CLICK_PADDING: f32 = 25.0;
/// Extra touch margin around checkbox and radio boxes.
const TOGGLE_CLICK_PADDING: f32 = 20.0;
/// Toggle switch extent in multiples of the font size.
const SWITCH_WIDTH: f32 = 2.5;
const SWITCH_HEIGHT: f32 = 1.5;

// ── Styles ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Rectangle,
    Ellipse,
    /// Rectangle with height forced to width.
    Square,
    /// Ellipse with height forced to width.
    Circle,
}

impl ButtonStyle {
    pub fn from_u8(b: u8) -> Self {
        match b {
            1 => Self::Ellipse,
            2 => Self::Square,
            3 => Self::Circle,
            _ => Self::Rectangle,
        }
    }

    fn is_round(self) -> bool {
        matches!(self, Self::Ellipse | Self::Circle)
    }

    fn is_uniform(self) -> bool {
        matches!(self, Self::Square | Self::Circle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchpadStyle {
    Rectangle,
    Square,
}

impl TouchpadStyle {
    pub fn from_u8(b: u8) -> Self {
        if b == 1 { Self::Square } else { Self::Rectangle }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderStyle {
    Slider,
    Progress,
}

impl SliderStyle {
    pub fn from_u8(b: u8) -> Self {
        if b == 1 { Self::Progress } else { Self::Slider }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    Fit,
    Zoom,
    Stretch,
}

impl ImageFit {
    pub fn from_u8(b: u8) -> Self {
        match b {
            1 => Self::Zoom,
            2 => Self::Stretch,
            _ => Self::Fit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_u8(b: u8) -> Self {
        match b {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckboxStyle {
    ToggleSwitch,
    Checkbox,
}

impl CheckboxStyle {
    pub fn from_u8(b: u8) -> Self {
        if b == 1 { Self::Checkbox } else { Self::ToggleSwitch }
    }
}

// ── Variants ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub rect: Rect,
    pub color: u32,
    pub text_color: u32,
    pub font_size: f32,
    pub style: ButtonStyle,
    pub text: String,
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joystick {
    /// Bounding square of the pad.
    pub rect: Rect,
    pub color: u32,
    /// Stick offset in `[-1, 1]` screen axes.
    pub stick: [f32; 2],
    pub pressed: bool,
    pub time_index: i32,
    /// Reported axes are swapped when drawn sideways.
    pub landscape: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Touchpad {
    pub rect: Rect,
    pub color: u32,
    /// Cursor in `[-1, 1]` control-local axes.
    pub cursor: [f32; 2],
    pub cursor_down: bool,
    pub time_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    /// Unrotated bar.
    pub rect: Rect,
    pub color: u32,
    pub level: f32,
    pub style: SliderStyle,
    pub readonly: bool,
    pub cursor_down: bool,
    pub time_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub rect: Rect,
    pub image: Arc<Image>,
    pub readonly: bool,
    pub fit: ImageFit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub rect: Rect,
    pub color: u32,
    pub text_color: u32,
    pub font_size: f32,
    pub align: TextAlign,
    pub readonly: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub x: f32,
    pub y: f32,
    pub text_color: u32,
    pub font_size: f32,
    pub align: TextAlign,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkbox {
    /// Box or switch, unrotated, anchored at the control position.
    pub rect: Rect,
    pub check_color: u32,
    pub text_color: u32,
    pub font_size: f32,
    pub style: CheckboxStyle,
    pub checked: bool,
    pub readonly: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadioButton {
    pub rect: Rect,
    pub check_color: u32,
    pub text_color: u32,
    pub font_size: f32,
    pub checked: bool,
    pub readonly: bool,
    pub group: ControlId,
    pub text: String,
}

/// Tagged union of every control variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Button(Button),
    Joystick(Joystick),
    Touchpad(Touchpad),
    Slider(Slider),
    ImageBox(ImageBox),
    TextField(TextField),
    Label(Label),
    Checkbox(Checkbox),
    RadioButton(RadioButton),
}

/// A registered control.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: ControlId,
    pub landscape: bool,
    pub widget: Widget,
}

/// What the UI must do after a pointer-down, beyond redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Prompt the user for new text for this text field.
    EditText,
    /// Capture a new image for this image box.
    CaptureImage,
}

/// Outcome of a pointer-down on a control.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reaction {
    /// Event content to send to the server.
    pub message: Option<Vec<u8>>,
    pub followup: Option<Followup>,
    /// A radio button asked to become the checked member of its group.
    pub select_radio: bool,
}

impl Control {
    /// Resolve an add request against the viewport.
    pub fn from_request(req: AddRequest, view: Viewport) -> Self {
        let px = |p: f32| (p / 100.0 * view.width).trunc();
        let py = |p: f32| (p / 100.0 * view.height).trunc();
        let font = |size: f32| view.base_font_size() * size;

        let widget = match req.kind {
            AddKind::Button {
                x,
                y,
                width,
                height,
                color,
                text_color,
                font_size,
                style,
                text,
            } => {
                let w = px(width);
                let h = if style.is_uniform() { w } else { py(height) };
                Widget::Button(Button {
                    rect: Rect::at(px(x), py(y), w, h),
                    color,
                    text_color,
                    font_size,
                    style,
                    text,
                    pressed: false,
                })
            }
            AddKind::Joystick { x, y, width, color } => {
                let w = px(width);
                Widget::Joystick(Joystick {
                    rect: Rect::at(px(x), py(y), w, w),
                    color,
                    stick: [0.0; 2],
                    pressed: false,
                    time_index: 0,
                    landscape: req.landscape,
                })
            }
            AddKind::Touchpad {
                x,
                y,
                width,
                height,
                color,
                style,
            } => {
                let w = px(width);
                // Square copies the width percentage onto the vertical axis.
                let h = match style {
                    TouchpadStyle::Square => py(width),
                    TouchpadStyle::Rectangle => py(height),
                };
                Widget::Touchpad(Touchpad {
                    rect: Rect::at(px(x), py(y), w, h),
                    color,
                    cursor: [0.0; 2],
                    cursor_down: false,
                    time_index: 0,
                })
            }
            AddKind::Slider {
                x,
                y,
                width,
                color,
                level,
                style,
                readonly,
            } => Widget::Slider(Slider {
                rect: Rect::at(px(x), py(y), px(width), SLIDER_BAR_HEIGHT),
                color,
                level: clamp_level(level),
                style,
                readonly,
                cursor_down: false,
                time_index: 0,
            }),
            AddKind::ImageBox {
                x,
                y,
                width,
                height,
                readonly,
                fit,
            } => Widget::ImageBox(ImageBox {
                rect: Rect::at(px(x), py(y), px(width), py(height)),
                image: Arc::new(Image::placeholder()),
                readonly,
                fit,
            }),
            AddKind::TextField {
                x,
                y,
                width,
                height,
                color,
                text_color,
                font_size,
                align,
                readonly,
                text,
            } => Widget::TextField(TextField {
                rect: Rect::at(px(x), py(y), px(width), py(height)),
                color,
                text_color,
                font_size,
                align,
                readonly,
                text,
            }),
            AddKind::Label {
                x,
                y,
                text_color,
                font_size,
                align,
                text,
            } => Widget::Label(Label {
                x: px(x),
                y: py(y),
                text_color,
                font_size,
                align,
                text,
            }),
            AddKind::Checkbox {
                x,
                y,
                check_color,
                text_color,
                font_size,
                checked,
                style,
                readonly,
                text,
            } => {
                let size = font(font_size);
                let (w, h) = match style {
                    CheckboxStyle::Checkbox => (size, size),
                    CheckboxStyle::ToggleSwitch => (size * SWITCH_WIDTH, size * SWITCH_HEIGHT),
                };
                Widget::Checkbox(Checkbox {
                    rect: Rect::at(px(x), py(y), w, h),
                    check_color,
                    text_color,
                    font_size,
                    style,
                    checked,
                    readonly,
                    text,
                })
            }
            AddKind::RadioButton {
                x,
                y,
                check_color,
                text_color,
                font_size,
                checked,
                readonly,
                group,
                text,
            } => {
                let size = font(font_size);
                Widget::RadioButton(RadioButton {
                    rect: Rect::at(px(x), py(y), size, size),
                    check_color,
                    text_color,
                    font_size,
                    checked,
                    readonly,
                    group,
                    text,
                })
            }
        };

        Self {
            id: req.id,
            landscape: req.landscape,
            widget,
        }
    }

    pub fn kind(&self) -> ControlKind {
        match &self.widget {
            Widget::Button(_) => ControlKind::Button,
            Widget::Joystick(_) => ControlKind::Joystick,
            Widget::Touchpad(_) => ControlKind::Touchpad,
            Widget::Slider(_) => ControlKind::Slider,
            Widget::ImageBox(_) => ControlKind::ImageBox,
            Widget::TextField(_) => ControlKind::TextField,
            Widget::Label(_) => ControlKind::Label,
            Widget::Checkbox(_) => ControlKind::Checkbox,
            Widget::RadioButton(_) => ControlKind::RadioButton,
        }
    }

    /// Radio group, for radio buttons only.
    pub fn radio_group(&self) -> Option<&ControlId> {
        match &self.widget {
            Widget::RadioButton(r) => Some(&r.group),
            _ => None,
        }
    }

    // ── Capability lookup ────────────────────────────────────

    pub fn as_text(&self) -> Option<&dyn TextLike> {
        match &self.widget {
            Widget::Button(w) => Some(w),
            Widget::TextField(w) => Some(w),
            Widget::Label(w) => Some(w),
            Widget::Checkbox(w) => Some(w),
            Widget::RadioButton(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut dyn TextLike> {
        match &mut self.widget {
            Widget::Button(w) => Some(w),
            Widget::TextField(w) => Some(w),
            Widget::Label(w) => Some(w),
            Widget::Checkbox(w) => Some(w),
            Widget::RadioButton(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<&dyn Toggleable> {
        match &self.widget {
            Widget::Checkbox(w) => Some(w),
            Widget::RadioButton(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_toggle_mut(&mut self) -> Option<&mut dyn Toggleable> {
        match &mut self.widget {
            Widget::Checkbox(w) => Some(w),
            Widget::RadioButton(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_pushable(&self) -> Option<&dyn Pushable> {
        match &self.widget {
            Widget::Button(w) => Some(w),
            Widget::Joystick(w) => Some(w),
            Widget::Touchpad(w) => Some(w),
            Widget::Slider(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<&dyn PositionLike> {
        match &self.widget {
            Widget::Joystick(w) => Some(w),
            Widget::Touchpad(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<&dyn LevelLike> {
        match &self.widget {
            Widget::Slider(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_level_mut(&mut self) -> Option<&mut dyn LevelLike> {
        match &mut self.widget {
            Widget::Slider(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&dyn ImageLike> {
        match &self.widget {
            Widget::ImageBox(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut dyn ImageLike> {
        match &mut self.widget {
            Widget::ImageBox(w) => Some(w),
            _ => None,
        }
    }

    // ── Local pointer behavior ───────────────────────────────

    /// Whether a pointer at `(x, y)` lands on this control.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let landscape = self.landscape;
        match &self.widget {
            Widget::Button(b) => {
                let r = b.rect.oriented(landscape);
                if b.style.is_round() {
                    r.ellipse_contains(x, y)
                } else {
                    r.contains(x, y)
                }
            }
            Widget::Joystick(j) => j.rect.ellipse_contains(x, y),
            Widget::Touchpad(t) => t.rect.oriented(landscape).contains(x, y),
            Widget::Slider(s) => {
                !s.readonly
                    && s.rect
                        .oriented(landscape)
                        .inflated(SLIDER_CLICK_PADDING)
                        .contains(x, y)
            }
            Widget::ImageBox(i) => i.rect.oriented(landscape).contains(x, y),
            Widget::TextField(t) => t.rect.oriented(landscape).contains(x, y),
            Widget::Label(_) => false,
            Widget::Checkbox(Checkbox { rect, .. }) | Widget::RadioButton(RadioButton { rect, .. }) => rect
                .oriented(landscape)
                .inflated(TOGGLE_CLICK_PADDING)
                .contains(x, y),
        }
    }

    /// Pointer pressed on this control.  `may_send` is consulted for each
    /// event the gesture produces and may veto rate-limited moves.
    pub fn pointer_down(
        &mut self,
        x: f32,
        y: f32,
        may_send: &mut dyn FnMut(PointerTag) -> bool,
    ) -> Reaction {
        let landscape = self.landscape;
        let id = &self.id;
        match &mut self.widget {
            Widget::Button(b) => {
                b.pressed = true;
                Reaction {
                    message: Some(messages::pressed(id)),
                    ..Reaction::default()
                }
            }
            Widget::Joystick(j) => {
                j.pressed = true;
                j.update_stick(x, y);
                Reaction {
                    message: j.event(PointerTag::Down, id, may_send),
                    ..Reaction::default()
                }
            }
            Widget::Touchpad(t) => {
                t.cursor_down = true;
                let message = t
                    .update_cursor(x, y, landscape)
                    .then(|| t.event(PointerTag::Down, id, may_send))
                    .flatten();
                Reaction {
                    message,
                    ..Reaction::default()
                }
            }
            Widget::Slider(s) => {
                s.cursor_down = true;
                let message = s
                    .update_level(x, y, landscape)
                    .then(|| s.event(PointerTag::Down, id, may_send))
                    .flatten();
                Reaction {
                    message,
                    ..Reaction::default()
                }
            }
            Widget::ImageBox(i) => Reaction {
                followup: (!i.readonly).then_some(Followup::CaptureImage),
                ..Reaction::default()
            },
            Widget::TextField(t) => Reaction {
                followup: (!t.readonly).then_some(Followup::EditText),
                ..Reaction::default()
            },
            Widget::Label(_) => Reaction::default(),
            Widget::Checkbox(c) => {
                if c.readonly {
                    return Reaction::default();
                }
                c.checked = !c.checked;
                Reaction {
                    message: Some(messages::toggled(c.checked, id)),
                    ..Reaction::default()
                }
            }
            Widget::RadioButton(r) => {
                if r.readonly {
                    return Reaction::default();
                }
                Reaction {
                    message: Some(messages::pressed(id)),
                    select_radio: true,
                    ..Reaction::default()
                }
            }
        }
    }

    /// Pointer dragged while held on this control.
    pub fn pointer_move(
        &mut self,
        x: f32,
        y: f32,
        may_send: &mut dyn FnMut(PointerTag) -> bool,
    ) -> Option<Vec<u8>> {
        let landscape = self.landscape;
        let id = &self.id;
        match &mut self.widget {
            Widget::Joystick(j) => {
                j.update_stick(x, y);
                j.event(PointerTag::Move, id, may_send)
            }
            Widget::Touchpad(t) => t
                .update_cursor(x, y, landscape)
                .then(|| t.event(PointerTag::Move, id, may_send))
                .flatten(),
            Widget::Slider(s) => s
                .update_level(x, y, landscape)
                .then(|| s.event(PointerTag::Move, id, may_send))
                .flatten(),
            _ => None,
        }
    }

    /// Pointer lifted from this control.
    pub fn pointer_up(&mut self, may_send: &mut dyn FnMut(PointerTag) -> bool) -> Option<Vec<u8>> {
        let id = &self.id;
        match &mut self.widget {
            Widget::Button(b) => {
                b.pressed = false;
                None
            }
            Widget::Joystick(j) => {
                j.stick = [0.0; 2];
                j.pressed = false;
                j.event(PointerTag::Up, id, may_send)
            }
            Widget::Touchpad(t) => {
                t.cursor_down = false;
                t.event(PointerTag::Up, id, may_send)
            }
            Widget::Slider(s) => {
                s.cursor_down = false;
                s.event(PointerTag::Up, id, may_send)
            }
            _ => None,
        }
    }
}

/// Levels live in `[0, 1]`; NaN reads as empty.
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) }
}

impl Joystick {
    fn update_stick(&mut self, x: f32, y: f32) {
        let radius = self.rect.width() / 2.0;
        if radius <= 0.0 {
            return;
        }
        let mut dx = x - (self.rect.left + radius);
        let mut dy = y - (self.rect.top + radius);
        let dist = dx.hypot(dy);
        if dist > radius {
            dx *= radius / dist;
            dy *= radius / dist;
        }
        self.stick = [dx / radius, dy / radius];
    }

    fn reported(&self) -> [f32; 2] {
        let [sx, sy] = self.stick;
        if self.landscape { [sy, sx] } else { [sx, -sy] }
    }

    fn event(
        &mut self,
        tag: PointerTag,
        id: &[u8],
        may_send: &mut dyn FnMut(PointerTag) -> bool,
    ) -> Option<Vec<u8>> {
        if !may_send(tag) {
            return None;
        }
        let msg = messages::position(self.time_index, tag, self.reported(), id);
        self.time_index = self.time_index.wrapping_add(1);
        Some(msg)
    }
}

impl Touchpad {
    /// Move the cursor; `false` when the pointer is outside the pad.
    fn update_cursor(&mut self, x: f32, y: f32, landscape: bool) -> bool {
        let (lx, ly) = local_pos(x, y, &self.rect, landscape);
        if !(0.0..=1.0).contains(&lx) || !(0.0..=1.0).contains(&ly) {
            return false;
        }
        self.cursor = [2.0 * lx - 1.0, 2.0 * ly - 1.0];
        true
    }

    fn raw_position(&self) -> [f32; 2] {
        [self.cursor[0], -self.cursor[1]]
    }

    fn event(
        &mut self,
        tag: PointerTag,
        id: &[u8],
        may_send: &mut dyn FnMut(PointerTag) -> bool,
    ) -> Option<Vec<u8>> {
        if !may_send(tag) {
            return None;
        }
        let msg = messages::position(self.time_index, tag, self.raw_position(), id);
        self.time_index = self.time_index.wrapping_add(1);
        Some(msg)
    }
}

impl Slider {
    /// Move the level under the pointer; `false` when it did not change.
    fn update_level(&mut self, x: f32, y: f32, landscape: bool) -> bool {
        let (lx, _) = local_pos(x, y, &self.rect, landscape);
        let level = clamp_level(lx);
        if level == self.level {
            return false;
        }
        self.level = level;
        true
    }

    fn event(
        &mut self,
        tag: PointerTag,
        id: &[u8],
        may_send: &mut dyn FnMut(PointerTag) -> bool,
    ) -> Option<Vec<u8>> {
        if !may_send(tag) {
            return None;
        }
        let msg = messages::level(self.time_index, tag, self.level, id);
        self.time_index = self.time_index.wrapping_add(1);
        Some(msg)
    }
}

// ── Capability impls ─────────────────────────────────────────

macro_rules! impl_text_like {
    ($($ty:ty),+) => {$(
        impl TextLike for $ty {
            fn text(&self) -> &str {
                &self.text
            }
            fn set_text(&mut self, text: String) {
                self.text = text;
            }
        }
    )+};
}

impl_text_like!(Button, TextField, Label, Checkbox, RadioButton);

impl Toggleable for Checkbox {
    fn toggle_state(&self) -> bool {
        self.checked
    }
    fn set_toggle_state(&mut self, state: bool) {
        self.checked = state;
    }
}

impl Toggleable for RadioButton {
    fn toggle_state(&self) -> bool {
        self.checked
    }
    fn set_toggle_state(&mut self, state: bool) {
        self.checked = state;
    }
}

impl Pushable for Button {
    fn is_pushed(&self) -> bool {
        self.pressed
    }
}

impl Pushable for Joystick {
    fn is_pushed(&self) -> bool {
        self.pressed
    }
}

impl Pushable for Touchpad {
    fn is_pushed(&self) -> bool {
        self.cursor_down
    }
}

impl Pushable for Slider {
    fn is_pushed(&self) -> bool {
        self.cursor_down
    }
}

impl PositionLike for Joystick {
    fn position(&self) -> Option<[f32; 2]> {
        Some(self.reported())
    }
}

impl PositionLike for Touchpad {
    fn position(&self) -> Option<[f32; 2]> {
        self.cursor_down.then(|| self.raw_position())
    }
}

impl LevelLike for Slider {
    fn level(&self) -> f32 {
        self.level
    }
    fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
    }
}

impl ImageLike for ImageBox {
    fn image(&self) -> &Arc<Image> {
        &self.image
    }
    fn set_image(&mut self, image: Arc<Image>) {
        self.image = image;
    }
}
