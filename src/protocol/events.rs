//! X11 protocol events
//!
//! Events are sent from the server to clients to notify them of state changes,
//! user input, and other interesting occurrences. Every event is a fixed
//! 32-byte record; byte 0 classifies it and its high bit marks events that
//! another client delivered through SendEvent.
//!
//! Decoding never copies the buffer. [`RawRecord`] borrows it and every
//! field read is bounds-checked, so a short or malformed buffer produces a
//! [`DecodeError`] instead of a panic.

use super::errors::{DecodeError, ProtocolError};
use super::types::*;
use byteorder::{ByteOrder as _, LittleEndian};

/// Size of every event and error record, and of the fixed part of a reply
pub const RECORD_SIZE: usize = 32;

/// Flag in byte 0 for events generated by SendEvent
pub const SEND_EVENT_BIT: u8 = 0x80;

/// Bounds-checked view over a wire record
///
/// All multi-byte fields are little-endian: the client always opens its
/// connection in LSB-first byte order.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> RawRecord<'a> {
    /// Wrap a buffer holding at least one full 32-byte record
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_min_len(bytes, RECORD_SIZE)
    }

    /// Wrap a buffer that must hold at least `min` bytes
    pub fn with_min_len(bytes: &'a [u8], min: usize) -> Result<Self, DecodeError> {
        if bytes.len() < min {
            return Err(DecodeError::Truncated {
                needed: min,
                available: bytes.len(),
            });
        }
        Ok(RawRecord { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Borrow `width` bytes starting at `offset`
    pub fn bytes_at(&self, offset: usize, width: usize) -> Result<&'a [u8], DecodeError> {
        offset
            .checked_add(width)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(DecodeError::OutOfRange {
                offset,
                width,
                len: self.bytes.len(),
            })
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    pub fn bool_at(&self, offset: usize) -> Result<bool, DecodeError> {
        Ok(self.u8_at(offset)? != 0)
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.bytes_at(offset, 2)?))
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16, DecodeError> {
        Ok(LittleEndian::read_i16(self.bytes_at(offset, 2)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.bytes_at(offset, 4)?))
    }

    pub fn id_at(&self, offset: usize) -> Result<ResourceId, DecodeError> {
        Ok(ResourceId::new(self.u32_at(offset)?))
    }

    /// Response type with the SendEvent flag stripped
    pub fn response_type(&self) -> Result<u8, DecodeError> {
        Ok(self.u8_at(0)? & !SEND_EVENT_BIT)
    }

    pub fn sequence(&self) -> Result<u16, DecodeError> {
        self.u16_at(2)
    }
}

/// Event type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventType {
    KeyPress = 2,
    KeyRelease = 3,
    ButtonPress = 4,
    ButtonRelease = 5,
    MotionNotify = 6,
    EnterNotify = 7,
    LeaveNotify = 8,
    FocusIn = 9,
    FocusOut = 10,
    KeymapNotify = 11,
    Expose = 12,
    GraphicsExposure = 13,
    NoExposure = 14,
    VisibilityNotify = 15,
    CreateNotify = 16,
    DestroyNotify = 17,
    UnmapNotify = 18,
    MapNotify = 19,
    MapRequest = 20,
    ReparentNotify = 21,
    ConfigureNotify = 22,
    ConfigureRequest = 23,
    GravityNotify = 24,
    ResizeRequest = 25,
    CirculateNotify = 26,
    CirculateRequest = 27,
    PropertyNotify = 28,
    SelectionClear = 29,
    SelectionRequest = 30,
    SelectionNotify = 31,
    ColormapNotify = 32,
    ClientMessage = 33,
    MappingNotify = 34,
}

impl EventType {
    pub fn from_u8(code: u8) -> Option<Self> {
        use EventType::*;
        Some(match code {
            2 => KeyPress,
            3 => KeyRelease,
            4 => ButtonPress,
            5 => ButtonRelease,
            6 => MotionNotify,
            7 => EnterNotify,
            8 => LeaveNotify,
            9 => FocusIn,
            10 => FocusOut,
            11 => KeymapNotify,
            12 => Expose,
            13 => GraphicsExposure,
            14 => NoExposure,
            15 => VisibilityNotify,
            16 => CreateNotify,
            17 => DestroyNotify,
            18 => UnmapNotify,
            19 => MapNotify,
            20 => MapRequest,
            21 => ReparentNotify,
            22 => ConfigureNotify,
            23 => ConfigureRequest,
            24 => GravityNotify,
            25 => ResizeRequest,
            26 => CirculateNotify,
            27 => CirculateRequest,
            28 => PropertyNotify,
            29 => SelectionClear,
            30 => SelectionRequest,
            31 => SelectionNotify,
            32 => ColormapNotify,
            33 => ClientMessage,
            34 => MappingNotify,
            _ => return None,
        })
    }
}

/// Classification of a decoded event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyPress,
    KeyRelease,
    ButtonPress,
    ButtonRelease,
    Motion,
    Expose,
    ConfigureNotify,
    Error,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::KeyPress => "key-press",
            EventKind::KeyRelease => "key-release",
            EventKind::ButtonPress => "button-press",
            EventKind::ButtonRelease => "button-release",
            EventKind::Motion => "motion",
            EventKind::Expose => "expose",
            EventKind::ConfigureNotify => "configure-notify",
            EventKind::Error => "error",
            EventKind::Unknown => "unknown",
        }
    }
}

/// Key, button and motion events share one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub detail: u8, // Keycode, button, or motion hint
    pub sequence: u16,
    pub time: u32,
    pub root: ResourceId,
    pub event: ResourceId,
    pub child: ResourceId,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub state: u16, // Modifier mask
    pub same_screen: bool,
    pub send_event: bool,
}

impl InputEvent {
    fn decode(record: &RawRecord<'_>, send_event: bool) -> Result<Self, DecodeError> {
        Ok(InputEvent {
            detail: record.u8_at(1)?,
            sequence: record.sequence()?,
            time: record.u32_at(4)?,
            root: record.id_at(8)?,
            event: record.id_at(12)?,
            child: record.id_at(16)?,
            root_x: record.i16_at(20)?,
            root_y: record.i16_at(22)?,
            event_x: record.i16_at(24)?,
            event_y: record.i16_at(26)?,
            state: record.u16_at(28)?,
            same_screen: record.bool_at(30)?,
            send_event,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposeEvent {
    pub sequence: u16,
    pub window: ResourceId,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// Number of Expose events still to follow for this window
    pub count: u16,
    pub send_event: bool,
}

impl ExposeEvent {
    fn decode(record: &RawRecord<'_>, send_event: bool) -> Result<Self, DecodeError> {
        Ok(ExposeEvent {
            sequence: record.sequence()?,
            window: record.id_at(4)?,
            x: record.u16_at(8)?,
            y: record.u16_at(10)?,
            width: record.u16_at(12)?,
            height: record.u16_at(14)?,
            count: record.u16_at(16)?,
            send_event,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureNotifyEvent {
    pub sequence: u16,
    pub event: ResourceId,
    pub window: ResourceId,
    pub above_sibling: ResourceId,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub override_redirect: bool,
    pub send_event: bool,
}

impl ConfigureNotifyEvent {
    fn decode(record: &RawRecord<'_>, send_event: bool) -> Result<Self, DecodeError> {
        Ok(ConfigureNotifyEvent {
            sequence: record.sequence()?,
            event: record.id_at(4)?,
            window: record.id_at(8)?,
            above_sibling: record.id_at(12)?,
            x: record.i16_at(16)?,
            y: record.i16_at(18)?,
            width: record.u16_at(20)?,
            height: record.u16_at(22)?,
            border_width: record.u16_at(24)?,
            override_redirect: record.bool_at(26)?,
            send_event,
        })
    }
}

/// Decoded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    KeyPress(InputEvent),
    KeyRelease(InputEvent),
    ButtonPress(InputEvent),
    ButtonRelease(InputEvent),
    Motion(InputEvent),
    Expose(ExposeEvent),
    ConfigureNotify(ConfigureNotifyEvent),
    /// Asynchronous error for a request that did not wait for a reply
    Error(ProtocolError),
    /// Any other response type; fields are left uninterpreted
    Unknown {
        code: u8,
        sequence: u16,
        send_event: bool,
    },
}

impl Event {
    /// Decode one 32-byte record
    pub fn decode(bytes: &[u8]) -> Result<Event, DecodeError> {
        Self::from_record(&RawRecord::new(bytes)?)
    }

    pub fn from_record(record: &RawRecord<'_>) -> Result<Event, DecodeError> {
        let send_event = record.u8_at(0)? & SEND_EVENT_BIT != 0;
        let code = record.response_type()?;

        if code == 0 {
            return Ok(Event::Error(ProtocolError::decode(record)?));
        }

        let event = match EventType::from_u8(code) {
            Some(EventType::KeyPress) => Event::KeyPress(InputEvent::decode(record, send_event)?),
            Some(EventType::KeyRelease) => {
                Event::KeyRelease(InputEvent::decode(record, send_event)?)
            }
            Some(EventType::ButtonPress) => {
                Event::ButtonPress(InputEvent::decode(record, send_event)?)
            }
            Some(EventType::ButtonRelease) => {
                Event::ButtonRelease(InputEvent::decode(record, send_event)?)
            }
            Some(EventType::MotionNotify) => Event::Motion(InputEvent::decode(record, send_event)?),
            Some(EventType::Expose) => Event::Expose(ExposeEvent::decode(record, send_event)?),
            Some(EventType::ConfigureNotify) => {
                Event::ConfigureNotify(ConfigureNotifyEvent::decode(record, send_event)?)
            }
            _ => Event::Unknown {
                code,
                sequence: record.sequence()?,
                send_event,
            },
        };
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::KeyPress(_) => EventKind::KeyPress,
            Event::KeyRelease(_) => EventKind::KeyRelease,
            Event::ButtonPress(_) => EventKind::ButtonPress,
            Event::ButtonRelease(_) => EventKind::ButtonRelease,
            Event::Motion(_) => EventKind::Motion,
            Event::Expose(_) => EventKind::Expose,
            Event::ConfigureNotify(_) => EventKind::ConfigureNotify,
            Event::Error(_) => EventKind::Error,
            Event::Unknown { .. } => EventKind::Unknown,
        }
    }

    fn input(&self) -> Option<&InputEvent> {
        match self {
            Event::KeyPress(e)
            | Event::KeyRelease(e)
            | Event::ButtonPress(e)
            | Event::ButtonRelease(e)
            | Event::Motion(e) => Some(e),
            _ => None,
        }
    }

    pub fn sequence(&self) -> u16 {
        match self {
            Event::KeyPress(e)
            | Event::KeyRelease(e)
            | Event::ButtonPress(e)
            | Event::ButtonRelease(e)
            | Event::Motion(e) => e.sequence,
            Event::Expose(e) => e.sequence,
            Event::ConfigureNotify(e) => e.sequence,
            Event::Error(e) => e.sequence,
            Event::Unknown { sequence, .. } => *sequence,
        }
    }

    /// Whether the event was delivered through SendEvent
    pub fn sent_event(&self) -> bool {
        match self {
            Event::KeyPress(e)
            | Event::KeyRelease(e)
            | Event::ButtonPress(e)
            | Event::ButtonRelease(e)
            | Event::Motion(e) => e.send_event,
            Event::Expose(e) => e.send_event,
            Event::ConfigureNotify(e) => e.send_event,
            Event::Error(_) => false,
            Event::Unknown { send_event, .. } => *send_event,
        }
    }

    pub fn keycode(&self) -> Option<u8> {
        match self {
            Event::KeyPress(e) | Event::KeyRelease(e) => Some(e.detail),
            _ => None,
        }
    }

    pub fn button(&self) -> Option<u8> {
        match self {
            Event::ButtonPress(e) | Event::ButtonRelease(e) => Some(e.detail),
            _ => None,
        }
    }

    /// Window-relative position (input events), or the origin of the
    /// exposed / configured area
    pub fn position(&self) -> Option<Point> {
        match self {
            Event::Expose(e) => Some(Point::new(clamp_coord(e.x), clamp_coord(e.y))),
            Event::ConfigureNotify(e) => Some(Point::new(e.x, e.y)),
            _ => self.input().map(|e| Point::new(e.event_x, e.event_y)),
        }
    }

    pub fn root_position(&self) -> Option<Point> {
        self.input().map(|e| Point::new(e.root_x, e.root_y))
    }

    /// Modifier and button state at the time of an input event
    pub fn state(&self) -> Option<u16> {
        self.input().map(|e| e.state)
    }

    pub fn time(&self) -> Option<u32> {
        self.input().map(|e| e.time)
    }

    /// Window the event is reported against
    pub fn window(&self) -> Option<ResourceId> {
        match self {
            Event::Expose(e) => Some(e.window),
            Event::ConfigureNotify(e) => Some(e.window),
            _ => self.input().map(|e| e.event),
        }
    }

    /// Damaged area and remaining count of an Expose event
    pub fn expose_rect(&self) -> Option<(Rectangle, u16)> {
        match self {
            Event::Expose(e) => Some((
                Rectangle::new(clamp_coord(e.x), clamp_coord(e.y), e.width, e.height),
                e.count,
            )),
            _ => None,
        }
    }
}

// Expose carries unsigned coordinates; points are signed
fn clamp_coord(v: u16) -> i16 {
    i16::try_from(v).unwrap_or(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: u8) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[0] = code;
        buf
    }

    #[test]
    fn test_button_press_scenario() {
        let mut buf = record(4);
        buf[1] = 1;
        buf[24..26].copy_from_slice(&150u16.to_le_bytes());
        buf[26..28].copy_from_slice(&80u16.to_le_bytes());

        let event = Event::decode(&buf).unwrap();
        assert_eq!(event.kind(), EventKind::ButtonPress);
        assert_eq!(event.button(), Some(1));
        assert_eq!(event.position(), Some(Point::new(150, 80)));
        assert_eq!(event.keycode(), None);
    }

    #[test]
    fn test_unknown_code() {
        let event = Event::decode(&record(99)).unwrap();
        assert_eq!(event.kind(), EventKind::Unknown);
        assert_eq!(event.window(), None);
    }

    #[test]
    fn test_every_type_byte_decodes() {
        for code in 0..=255u8 {
            let buf = record(code);
            assert!(Event::decode(&buf).is_ok(), "type byte {} failed", code);
        }
    }

    #[test]
    fn test_send_event_bit_is_stripped() {
        let mut buf = record(2 | SEND_EVENT_BIT);
        buf[1] = 38;
        let event = Event::decode(&buf).unwrap();
        assert_eq!(event.kind(), EventKind::KeyPress);
        assert_eq!(event.keycode(), Some(38));
        assert!(event.sent_event());
    }

    #[test]
    fn test_expose_fields() {
        let mut buf = record(12);
        buf[2..4].copy_from_slice(&9u16.to_le_bytes());
        buf[4..8].copy_from_slice(&0x0020_0001u32.to_le_bytes());
        buf[8..10].copy_from_slice(&10u16.to_le_bytes());
        buf[10..12].copy_from_slice(&20u16.to_le_bytes());
        buf[12..14].copy_from_slice(&300u16.to_le_bytes());
        buf[14..16].copy_from_slice(&200u16.to_le_bytes());
        buf[16..18].copy_from_slice(&2u16.to_le_bytes());

        let event = Event::decode(&buf).unwrap();
        assert_eq!(event.sequence(), 9);
        assert_eq!(event.window(), Some(ResourceId::new(0x0020_0001)));
        assert_eq!(
            event.expose_rect(),
            Some((Rectangle::new(10, 20, 300, 200), 2))
        );
    }

    #[test]
    fn test_expose_far_corner_saturates() {
        let mut buf = record(12);
        buf[8..10].copy_from_slice(&40000u16.to_le_bytes());
        buf[10..12].copy_from_slice(&32767u16.to_le_bytes());
        buf[12..14].copy_from_slice(&5u16.to_le_bytes());
        buf[14..16].copy_from_slice(&5u16.to_le_bytes());

        let event = Event::decode(&buf).unwrap();
        assert_eq!(event.position(), Some(Point::new(i16::MAX, 32767)));
        let (rect, _) = event.expose_rect().unwrap();
        assert_eq!((rect.x, rect.y), (i16::MAX, i16::MAX));
    }

    #[test]
    fn test_input_event_window_and_root_position() {
        let mut buf = record(6);
        buf[12..16].copy_from_slice(&0x0020_0003u32.to_le_bytes());
        buf[20..22].copy_from_slice(&(-5i16).to_le_bytes());
        buf[22..24].copy_from_slice(&700i16.to_le_bytes());
        buf[28..30].copy_from_slice(&0x0100u16.to_le_bytes());

        let event = Event::decode(&buf).unwrap();
        assert_eq!(event.kind(), EventKind::Motion);
        assert_eq!(event.window(), Some(ResourceId::new(0x0020_0003)));
        assert_eq!(event.root_position(), Some(Point::new(-5, 700)));
        assert_eq!(event.state(), Some(modifier_mask::BUTTON1));
    }

    #[test]
    fn test_configure_notify() {
        let mut buf = record(22);
        buf[8..12].copy_from_slice(&0x0020_0001u32.to_le_bytes());
        buf[20..22].copy_from_slice(&640u16.to_le_bytes());
        buf[22..24].copy_from_slice(&480u16.to_le_bytes());

        match Event::decode(&buf).unwrap() {
            Event::ConfigureNotify(e) => {
                assert_eq!(e.window, ResourceId::new(0x0020_0001));
                assert_eq!((e.width, e.height), (640, 480));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let buf = [4u8; 31];
        assert_eq!(
            Event::decode(&buf),
            Err(DecodeError::Truncated {
                needed: 32,
                available: 31
            })
        );
        assert!(Event::decode(&[]).is_err());
    }

    #[test]
    fn test_accessor_bounds() {
        let buf = [0u8; 4];
        let record = RawRecord::with_min_len(&buf, 0).unwrap();
        assert!(record.u16_at(2).is_ok());
        assert!(record.u32_at(2).is_err());
        assert!(record.u8_at(usize::MAX).is_err());
    }
}
