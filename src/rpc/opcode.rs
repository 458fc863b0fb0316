//! Single-byte command discriminators.
//!
//! Inbound opcodes are ASCII letters.  Replies echo the request opcode as
//! their first content byte, so the same table serves both directions.
//! Unsolicited outbound messages (heartbeats, snapshots, local interaction
//! events) use the lowercase letters in [`event`].

/// Opcodes the dispatcher accepts.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ── Sensor reads ──────────────────────────────────────────
    Accelerometer = b'A',
    Gravity = b'G',
    LinearAcceleration = b'L',
    Gyroscope = b'Y',
    RotationVector = b'R',
    GameRotationVector = b'r',
    MagneticField = b'M',
    Sound = b'm',
    Proximity = b'P',
    StepCounter = b'S',
    Light = b'l',
    Location = b'X',
    Orientation = b'O',

    // ── Session ───────────────────────────────────────────────
    Authenticate = b'a',
    SetSensorPeriods = b'p',

    // ── Control queries / mutations ───────────────────────────
    GetImage = b'u',
    SetImage = b'i',
    SetText = b'H',
    GetText = b'h',
    GetPosition = b'J',
    GetLevel = b'E',
    SetLevel = b'e',
    IsPushed = b'V',
    GetToggleState = b'W',
    SetToggleState = b'w',

    // ── Control lifecycle ─────────────────────────────────────
    ClearControls = b'C',
    RemoveControl = b'c',
    AddButton = b'B',
    AddJoystick = b'j',
    AddTouchpad = b'N',
    AddSlider = b'D',
    AddImageBox = b'U',
    AddTextField = b'T',
    AddLabel = b'g',
    AddCheckbox = b'Z',
    AddRadioButton = b'y',
}

impl Opcode {
    /// Map a raw wire byte to an opcode, or `None` for unknown bytes.
    pub fn from_u8(byte: u8) -> Option<Self> {
        use Opcode::*;
        Some(match byte {
            b'A' => Accelerometer,
            b'G' => Gravity,
            b'L' => LinearAcceleration,
            b'Y' => Gyroscope,
            b'R' => RotationVector,
            b'r' => GameRotationVector,
            b'M' => MagneticField,
            b'm' => Sound,
            b'P' => Proximity,
            b'S' => StepCounter,
            b'l' => Light,
            b'X' => Location,
            b'O' => Orientation,
            b'a' => Authenticate,
            b'p' => SetSensorPeriods,
            b'u' => GetImage,
            b'i' => SetImage,
            b'H' => SetText,
            b'h' => GetText,
            b'J' => GetPosition,
            b'E' => GetLevel,
            b'e' => SetLevel,
            b'V' => IsPushed,
            b'W' => GetToggleState,
            b'w' => SetToggleState,
            b'C' => ClearControls,
            b'c' => RemoveControl,
            b'B' => AddButton,
            b'j' => AddJoystick,
            b'N' => AddTouchpad,
            b'D' => AddSlider,
            b'U' => AddImageBox,
            b'T' => AddTextField,
            b'g' => AddLabel,
            b'Z' => AddCheckbox,
            b'y' => AddRadioButton,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Connection pseudo-opcode: heartbeats, probes, acks and resets.
pub const CONNECTION: u8 = b'I';

/// Marker byte of an inbound connect acknowledgement (`['I', 1]`).
pub const CONNECT_ACK: u8 = 1;
/// Marker byte of an inbound server-side reset (`['I', 87]`).
pub const RESET_NOTICE: u8 = 87;
/// Marker byte of an outbound reconnect probe (`['I', 0]`).
pub const PROBE: u8 = 0;
/// Marker byte of an outbound reset request (`['I', 86]`).
pub const RESET_REQUEST: u8 = 86;

/// Opcodes of unsolicited outbound messages.
pub mod event {
    /// Full sensor snapshot.
    pub const SNAPSHOT: u8 = b'Q';
    /// Button pressed, radio selected or image box updated.
    pub const PRESSED: u8 = b'b';
    /// Joystick or touchpad pointer update.
    pub const POSITION: u8 = b'n';
    /// Slider level update.
    pub const LEVEL: u8 = b'd';
    /// Text field edited.
    pub const TEXT: u8 = b't';
    /// Checkbox toggled.
    pub const TOGGLE: u8 = b'z';
}
