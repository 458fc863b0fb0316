//! Per-opcode payload layouts.
//!
//! "Add control" commands carry a fixed block of geometry and style fields,
//! then an id (length-prefixed, or the rest of the packet when no text
//! follows), then text that runs to the end of the packet.  Geometry is in
//! percent of the viewport; [`crate::controls::widgets`] resolves it.
//!
//! Fixed-block sizes below are total packet lengths, header included, and
//! match the offsets documented on each variant.
//!
//! The second half of the module encodes the unsolicited events the device
//! sends when the user touches a control.

use crate::controls::widgets::{
    ButtonStyle, CheckboxStyle, ImageFit, SliderStyle, TextAlign, TouchpadStyle,
};
use crate::controls::{ControlId, control_id};

use super::codec::{Command, Reader, Writer};
use super::opcode::{Opcode, event};

/// Decoded "add control" command.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRequest {
    pub id: ControlId,
    pub landscape: bool,
    pub kind: AddKind,
}

/// Variant-specific fields of an [`AddRequest`].  Positions and sizes are
/// percentages; colors are ARGB.
#[derive(Debug, Clone, PartialEq)]
pub enum AddKind {
    Button {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: u32,
        text_color: u32,
        font_size: f32,
        style: ButtonStyle,
        text: String,
    },
    Joystick {
        x: f32,
        y: f32,
        width: f32,
        color: u32,
    },
    Touchpad {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: u32,
        style: TouchpadStyle,
    },
    Slider {
        x: f32,
        y: f32,
        width: f32,
        color: u32,
        level: f32,
        style: SliderStyle,
        readonly: bool,
    },
    ImageBox {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        readonly: bool,
        fit: ImageFit,
    },
    TextField {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: u32,
        text_color: u32,
        font_size: f32,
        align: TextAlign,
        readonly: bool,
        text: String,
    },
    Label {
        x: f32,
        y: f32,
        text_color: u32,
        font_size: f32,
        align: TextAlign,
        text: String,
    },
    Checkbox {
        x: f32,
        y: f32,
        check_color: u32,
        text_color: u32,
        font_size: f32,
        checked: bool,
        style: CheckboxStyle,
        readonly: bool,
        text: String,
    },
    RadioButton {
        x: f32,
        y: f32,
        check_color: u32,
        text_color: u32,
        font_size: f32,
        checked: bool,
        readonly: bool,
        group: ControlId,
        text: String,
    },
}

/// Minimum packet length of each add opcode.
pub fn add_min_len(op: Opcode) -> Option<usize> {
    Some(match op {
        Opcode::AddButton => 40,
        Opcode::AddJoystick => 26,
        Opcode::AddTouchpad => 31,
        Opcode::AddSlider => 32,
        Opcode::AddImageBox => 28,
        Opcode::AddTextField => 41,
        Opcode::AddLabel => 28,
        Opcode::AddCheckbox => 34,
        Opcode::AddRadioButton => 33,
        _ => return None,
    })
}

fn color(r: &mut Reader<'_>) -> Option<u32> {
    r.i32().map(|c| c as u32)
}

fn rest_id(r: &mut Reader<'_>) -> Option<ControlId> {
    control_id(r.rest())
}

fn short_id(r: &mut Reader<'_>) -> Option<ControlId> {
    control_id(r.short_bytes()?)
}

/// Decode an add command.  `None` means malformed: too short, a truncated
/// length-prefixed field, or an id over 255 bytes.
pub fn decode_add(op: Opcode, cmd: &Command<'_>) -> Option<AddRequest> {
    if cmd.len() < add_min_len(op)? {
        return None;
    }
    let mut r = cmd.fields();
    let (id, landscape, kind);
    match op {
        // x@9 y@13 w@17 h@21 color@25 textColor@29 fontSize@33 style@37
        // landscape@38 idlen@39 id text
        Opcode::AddButton => {
            let (x, y, width, height) = (r.f32()?, r.f32()?, r.f32()?, r.f32()?);
            let (color, text_color, font_size) = (color(&mut r)?, color(&mut r)?, r.f32()?);
            let style = ButtonStyle::from_u8(r.u8()?);
            landscape = r.flag()?;
            id = short_id(&mut r)?;
            kind = AddKind::Button {
                x,
                y,
                width,
                height,
                color,
                text_color,
                font_size,
                style,
                text: r.rest_text(),
            };
        }
        // x@9 y@13 w@17 color@21 landscape@25 id=rest
        Opcode::AddJoystick => {
            let (x, y, width, color) = (r.f32()?, r.f32()?, r.f32()?, color(&mut r)?);
            landscape = r.flag()?;
            id = rest_id(&mut r)?;
            kind = AddKind::Joystick { x, y, width, color };
        }
        // x y w h color@25 style@29 landscape@30 id=rest
        Opcode::AddTouchpad => {
            let (x, y, width, height) = (r.f32()?, r.f32()?, r.f32()?, r.f32()?);
            let color = color(&mut r)?;
            let style = TouchpadStyle::from_u8(r.u8()?);
            landscape = r.flag()?;
            id = rest_id(&mut r)?;
            kind = AddKind::Touchpad {
                x,
                y,
                width,
                height,
                color,
                style,
            };
        }
        // x y w color@21 level@25 style@29 landscape@30 readonly@31 id=rest
        Opcode::AddSlider => {
            let (x, y, width, color) = (r.f32()?, r.f32()?, r.f32()?, color(&mut r)?);
            let level = r.f32()?;
            let style = SliderStyle::from_u8(r.u8()?);
            landscape = r.flag()?;
            let readonly = r.flag()?;
            id = rest_id(&mut r)?;
            kind = AddKind::Slider {
                x,
                y,
                width,
                color,
                level,
                style,
                readonly,
            };
        }
        // x y w h readonly@25 landscape@26 fit@27 id=rest
        Opcode::AddImageBox => {
            let (x, y, width, height) = (r.f32()?, r.f32()?, r.f32()?, r.f32()?);
            let readonly = r.flag()?;
            landscape = r.flag()?;
            let fit = ImageFit::from_u8(r.u8()?);
            id = rest_id(&mut r)?;
            kind = AddKind::ImageBox {
                x,
                y,
                width,
                height,
                readonly,
                fit,
            };
        }
        // x y w h color@25 textColor@29 fontSize@33 align@37 readonly@38
        // landscape@39 idlen@40 id text
        Opcode::AddTextField => {
            let (x, y, width, height) = (r.f32()?, r.f32()?, r.f32()?, r.f32()?);
            let (color, text_color, font_size) = (color(&mut r)?, color(&mut r)?, r.f32()?);
            let align = TextAlign::from_u8(r.u8()?);
            let readonly = r.flag()?;
            landscape = r.flag()?;
            id = short_id(&mut r)?;
            kind = AddKind::TextField {
                x,
                y,
                width,
                height,
                color,
                text_color,
                font_size,
                align,
                readonly,
                text: r.rest_text(),
            };
        }
        // x y textColor@17 fontSize@21 align@25 landscape@26 idlen@27 id text
        Opcode::AddLabel => {
            let (x, y) = (r.f32()?, r.f32()?);
            let (text_color, font_size) = (color(&mut r)?, r.f32()?);
            let align = TextAlign::from_u8(r.u8()?);
            landscape = r.flag()?;
            id = short_id(&mut r)?;
            kind = AddKind::Label {
                x,
                y,
                text_color,
                font_size,
                align,
                text: r.rest_text(),
            };
        }
        // x y checkColor@17 textColor@21 fontSize@25 checked@29 style@30
        // landscape@31 readonly@32 idlen@33 id text
        Opcode::AddCheckbox => {
            let (x, y) = (r.f32()?, r.f32()?);
            let (check_color, text_color, font_size) =
                (color(&mut r)?, color(&mut r)?, r.f32()?);
            let checked = r.flag()?;
            let style = CheckboxStyle::from_u8(r.u8()?);
            landscape = r.flag()?;
            let readonly = r.flag()?;
            id = short_id(&mut r)?;
            kind = AddKind::Checkbox {
                x,
                y,
                check_color,
                text_color,
                font_size,
                checked,
                style,
                readonly,
                text: r.rest_text(),
            };
        }
        // x y checkColor@17 textColor@21 fontSize@25 checked@29 landscape@30
        // readonly@31 idlen@32 id grouplen group text
        Opcode::AddRadioButton => {
            let (x, y) = (r.f32()?, r.f32()?);
            let (check_color, text_color, font_size) =
                (color(&mut r)?, color(&mut r)?, r.f32()?);
            let checked = r.flag()?;
            landscape = r.flag()?;
            let readonly = r.flag()?;
            id = short_id(&mut r)?;
            let group = short_id(&mut r)?;
            kind = AddKind::RadioButton {
                x,
                y,
                check_color,
                text_color,
                font_size,
                checked,
                readonly,
                group,
                text: r.rest_text(),
            };
        }
        _ => return None,
    }
    Some(AddRequest {
        id,
        landscape,
        kind,
    })
}

// ── Outbound interaction events ──────────────────────────────

/// Phase of a pointer gesture, as sent in position and level events.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTag {
    Down = 0,
    Move = 1,
    Up = 2,
}

/// `['b', id]`: button pressed, radio selected or image box updated.
pub fn pressed(id: &[u8]) -> Vec<u8> {
    Writer::new(event::PRESSED).bytes(id).finish()
}

/// `['n', time, tag, x, y, id]`: joystick or touchpad update.
pub fn position(time_index: i32, tag: PointerTag, pos: [f32; 2], id: &[u8]) -> Vec<u8> {
    Writer::new(event::POSITION)
        .i32(time_index)
        .u8(tag as u8)
        .f32(pos[0])
        .f32(pos[1])
        .bytes(id)
        .finish()
}

/// `['d', time, tag, level, id]`: slider update.
pub fn level(time_index: i32, tag: PointerTag, level: f32, id: &[u8]) -> Vec<u8> {
    Writer::new(event::LEVEL)
        .i32(time_index)
        .u8(tag as u8)
        .f32(level)
        .bytes(id)
        .finish()
}

/// `['t', idlen, id, text]`: text field edited.
pub fn text_edited(id: &ControlId, text: &str) -> Vec<u8> {
    Writer::new(event::TEXT)
        .u8(id.len() as u8)
        .bytes(id)
        .bytes(text.as_bytes())
        .finish()
}

/// `['z', state, id]`: checkbox toggled.
pub fn toggled(state: bool, id: &[u8]) -> Vec<u8> {
    Writer::new(event::TOGGLE).flag(state).bytes(id).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::codec::{Inbound, decode_inbound, encode_command};

    fn decode(op: Opcode, fields: &[u8]) -> Option<AddRequest> {
        let packet = encode_command(op.as_u8(), 0, fields);
        let Some(Inbound::Command(cmd)) = decode_inbound(&packet) else {
            return None;
        };
        decode_add(op, &cmd)
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn button_layout() {
        let mut f = floats(&[10.0, 20.0, 30.0, 40.0]);
        f.extend_from_slice(&0xFF00_FF00u32.to_be_bytes());
        f.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        f.extend_from_slice(&1.5f32.to_be_bytes());
        f.extend_from_slice(&[3, 1, 2, b'b', b'1', b'G', b'o']);
        let req = decode(Opcode::AddButton, &f).unwrap();
        assert_eq!(&req.id[..], b"b1");
        assert!(req.landscape);
        let AddKind::Button {
            width, style, text, color, ..
        } = req.kind
        else {
            panic!("expected button");
        };
        assert_eq!(width, 30.0);
        assert_eq!(style, ButtonStyle::Circle);
        assert_eq!(text, "Go");
        assert_eq!(color, 0xFF00_FF00);
    }

    #[test]
    fn button_with_truncated_id_is_dropped() {
        let mut f = floats(&[0.0; 4]);
        f.extend_from_slice(&[0; 12]);
        f.extend_from_slice(&[0, 0, 5, b'a']); // idlen 5, one byte present
        assert!(decode(Opcode::AddButton, &f).is_none());
    }

    #[test]
    fn joystick_id_is_rest() {
        let mut f = floats(&[5.0, 5.0, 20.0]);
        f.extend_from_slice(&[0, 0, 0, 0, 0]);
        f.extend_from_slice(b"stick");
        let req = decode(Opcode::AddJoystick, &f).unwrap();
        assert_eq!(&req.id[..], b"stick");
        assert!(!req.landscape);
    }

    #[test]
    fn below_minimum_is_dropped() {
        assert!(decode(Opcode::AddJoystick, &floats(&[5.0, 5.0, 20.0])).is_none());
        assert!(decode(Opcode::AddLabel, &[]).is_none());
    }

    #[test]
    fn radio_reads_group_after_id() {
        let mut f = floats(&[1.0, 2.0]);
        f.extend_from_slice(&[0; 8]);
        f.extend_from_slice(&1.0f32.to_be_bytes());
        f.extend_from_slice(&[1, 0, 0]); // checked, landscape, readonly
        f.extend_from_slice(&[2, b'r', b'1', 1, b'g', b'A']);
        let req = decode(Opcode::AddRadioButton, &f).unwrap();
        let AddKind::RadioButton {
            group,
            text,
            checked,
            ..
        } = req.kind
        else {
            panic!("expected radio");
        };
        assert_eq!(&group[..], b"g");
        assert_eq!(text, "A");
        assert!(checked);
    }

    #[test]
    fn radio_without_group_byte_is_dropped() {
        let mut f = floats(&[1.0, 2.0]);
        f.extend_from_slice(&[0; 12]);
        f.extend_from_slice(&[0, 0, 0, 2, b'r', b'1']);
        assert!(decode(Opcode::AddRadioButton, &f).is_none());
    }

    #[test]
    fn event_layouts() {
        assert_eq!(pressed(b"ok"), vec![b'b', b'o', b'k']);
        assert_eq!(toggled(true, b"c"), vec![b'z', 1, b'c']);
        let msg = position(7, PointerTag::Move, [0.5, -0.5], b"j");
        assert_eq!(msg.len(), 1 + 4 + 1 + 4 + 4 + 1);
        assert_eq!(&msg[1..5], &7i32.to_be_bytes());
        assert_eq!(msg[5], 1);
        let id = control_id(b"tf").unwrap();
        assert_eq!(text_edited(&id, "hi"), vec![b't', 2, b't', b'f', b'h', b'i']);
    }
}
