//! X11 protocol error codes and error packet decoding

use super::events::RawRecord;
use super::types::*;
use std::fmt;

/// X11 error codes as defined in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Request = 1,
    Value = 2,
    Window = 3,
    Pixmap = 4,
    Atom = 5,
    Cursor = 6,
    Font = 7,
    Match = 8,
    Drawable = 9,
    Access = 10,
    Alloc = 11,
    Colormap = 12,
    GContext = 13,
    IDChoice = 14,
    Name = 15,
    Length = 16,
    Implementation = 17,
}

impl ErrorCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(ErrorCode::Request),
            2 => Some(ErrorCode::Value),
            3 => Some(ErrorCode::Window),
            4 => Some(ErrorCode::Pixmap),
            5 => Some(ErrorCode::Atom),
            6 => Some(ErrorCode::Cursor),
            7 => Some(ErrorCode::Font),
            8 => Some(ErrorCode::Match),
            9 => Some(ErrorCode::Drawable),
            10 => Some(ErrorCode::Access),
            11 => Some(ErrorCode::Alloc),
            12 => Some(ErrorCode::Colormap),
            13 => Some(ErrorCode::GContext),
            14 => Some(ErrorCode::IDChoice),
            15 => Some(ErrorCode::Name),
            16 => Some(ErrorCode::Length),
            17 => Some(ErrorCode::Implementation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Request => "Request: bad request code",
            ErrorCode::Value => "Value: integer parameter out of range",
            ErrorCode::Window => "Window: invalid Window parameter",
            ErrorCode::Pixmap => "Pixmap: invalid Pixmap parameter",
            ErrorCode::Atom => "Atom: invalid Atom parameter",
            ErrorCode::Cursor => "Cursor: invalid Cursor parameter",
            ErrorCode::Font => "Font: invalid Font parameter",
            ErrorCode::Match => "Match: parameter mismatch",
            ErrorCode::Drawable => "Drawable: invalid Drawable parameter",
            ErrorCode::Access => "Access: attempt to access private resource",
            ErrorCode::Alloc => "Alloc: insufficient resources",
            ErrorCode::Colormap => "Colormap: invalid Colormap parameter",
            ErrorCode::GContext => "GContext: invalid GC parameter",
            ErrorCode::IDChoice => "IDChoice: invalid resource ID for this connection",
            ErrorCode::Name => "Name: font or color name doesn't exist",
            ErrorCode::Length => "Length: request length incorrect",
            ErrorCode::Implementation => "Implementation: server implementation error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// X11 error packet as received from the server
///
/// `code` is kept raw: extensions may report codes above 127 which have no
/// [`ErrorCode`] variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub code: u8,
    pub sequence: u16,
    pub bad_value: u32,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

impl ProtocolError {
    pub fn new(
        code: ErrorCode,
        sequence: u16,
        bad_value: u32,
        minor_opcode: u16,
        major_opcode: u8,
    ) -> Self {
        ProtocolError {
            code: code as u8,
            sequence,
            bad_value,
            minor_opcode,
            major_opcode,
        }
    }

    /// Decode an error packet (response type 0)
    pub fn decode(record: &RawRecord<'_>) -> Result<Self, DecodeError> {
        Ok(ProtocolError {
            code: record.u8_at(1)?,
            sequence: record.u16_at(2)?,
            bad_value: record.u32_at(4)?,
            minor_opcode: record.u16_at(8)?,
            major_opcode: record.u8_at(10)?,
        })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u8(self.code)
    }

    /// Offending resource id, for the error codes where `bad_value` names one
    pub fn bad_resource(&self) -> Option<ResourceId> {
        match self.error_code()? {
            ErrorCode::Window
            | ErrorCode::Pixmap
            | ErrorCode::Cursor
            | ErrorCode::Font
            | ErrorCode::Drawable
            | ErrorCode::Colormap
            | ErrorCode::GContext
            | ErrorCode::IDChoice => Some(ResourceId::new(self.bad_value)),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_code() {
            Some(code) => write!(f, "X11 Error: {}", code)?,
            None => write!(f, "X11 Error: code {}", self.code)?,
        }
        write!(
            f,
            " (sequence: {}, value: 0x{:08x}, major: {}, minor: {})",
            self.sequence, self.bad_value, self.major_opcode, self.minor_opcode
        )
    }
}

/// Failure to interpret a wire record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the fixed record size
    Truncated { needed: usize, available: usize },
    /// Field read past the end of the buffer
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },
    /// Reply decoder handed something that is not a reply
    NotAReply { response_type: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { needed, available } => write!(
                f,
                "record truncated: need {} bytes, have {}",
                needed, available
            ),
            DecodeError::OutOfRange { offset, width, len } => write!(
                f,
                "field at offset {} ({} bytes) outside {}-byte record",
                offset, width, len
            ),
            DecodeError::NotAReply { response_type } => {
                write!(f, "expected reply, got response type {}", response_type)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_packet() {
        let mut buf = [0u8; 32];
        buf[0] = 0;
        buf[1] = ErrorCode::Window as u8;
        buf[2..4].copy_from_slice(&7u16.to_le_bytes());
        buf[4..8].copy_from_slice(&0x0040_0001u32.to_le_bytes());
        buf[8..10].copy_from_slice(&0u16.to_le_bytes());
        buf[10] = 8; // MapWindow

        let record = RawRecord::new(&buf).unwrap();
        let err = ProtocolError::decode(&record).unwrap();
        assert_eq!(err.error_code(), Some(ErrorCode::Window));
        assert_eq!(err.sequence, 7);
        assert_eq!(err.major_opcode, 8);
        assert_eq!(err.bad_resource(), Some(ResourceId::new(0x0040_0001)));
    }

    #[test]
    fn test_extension_error_code_is_kept() {
        let err = ProtocolError {
            code: 150,
            sequence: 1,
            bad_value: 0,
            minor_opcode: 3,
            major_opcode: 130,
        };
        assert_eq!(err.error_code(), None);
        assert!(err.to_string().contains("code 150"));
    }
}
