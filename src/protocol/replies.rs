//! Decoders for the replies the client waits on
//!
//! A reply starts with response type 1, a data byte, the sequence number and
//! the count of 4-byte words following the 32-byte fixed part.

use super::errors::DecodeError;
use super::events::{RawRecord, RECORD_SIZE};
use super::types::*;

const REPLY: u8 = 1;

fn reply_record(bytes: &[u8], min: usize) -> Result<RawRecord<'_>, DecodeError> {
    let record = RawRecord::with_min_len(bytes, min.max(RECORD_SIZE))?;
    let response_type = record.u8_at(0)?;
    if response_type != REPLY {
        return Err(DecodeError::NotAReply { response_type });
    }
    Ok(record)
}

/// Per-character metrics as carried in a QueryFont reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharInfo {
    pub left_side_bearing: i16,
    pub right_side_bearing: i16,
    pub character_width: i16,
    pub ascent: i16,
    pub descent: i16,
    pub attributes: u16,
}

impl CharInfo {
    fn decode(record: &RawRecord<'_>, offset: usize) -> Result<Self, DecodeError> {
        Ok(CharInfo {
            left_side_bearing: record.i16_at(offset)?,
            right_side_bearing: record.i16_at(offset + 2)?,
            character_width: record.i16_at(offset + 4)?,
            ascent: record.i16_at(offset + 6)?,
            descent: record.i16_at(offset + 8)?,
            attributes: record.u16_at(offset + 10)?,
        })
    }
}

/// QueryFont reply (fixed part; properties and per-char infos are skipped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFontReply {
    pub min_bounds: CharInfo,
    pub max_bounds: CharInfo,
    pub min_char_or_byte2: u16,
    pub max_char_or_byte2: u16,
    pub default_char: u16,
    pub draw_direction: u8,
    pub all_chars_exist: bool,
    pub font_ascent: i16,
    pub font_descent: i16,
}

impl QueryFontReply {
    pub const FIXED_LEN: usize = 60;

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, Self::FIXED_LEN)?;
        Ok(QueryFontReply {
            min_bounds: CharInfo::decode(&r, 8)?,
            max_bounds: CharInfo::decode(&r, 24)?,
            min_char_or_byte2: r.u16_at(40)?,
            max_char_or_byte2: r.u16_at(42)?,
            default_char: r.u16_at(44)?,
            draw_direction: r.u8_at(48)?,
            all_chars_exist: r.bool_at(51)?,
            font_ascent: r.i16_at(52)?,
            font_descent: r.i16_at(54)?,
        })
    }
}

/// QueryPointer reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPointerReply {
    pub same_screen: bool,
    pub root: ResourceId,
    pub child: ResourceId,
    pub root_x: i16,
    pub root_y: i16,
    pub win_x: i16,
    pub win_y: i16,
    pub mask: u16,
}

impl QueryPointerReply {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, RECORD_SIZE)?;
        Ok(QueryPointerReply {
            same_screen: r.bool_at(1)?,
            root: r.id_at(8)?,
            child: r.id_at(12)?,
            root_x: r.i16_at(16)?,
            root_y: r.i16_at(18)?,
            win_x: r.i16_at(20)?,
            win_y: r.i16_at(22)?,
            mask: r.u16_at(24)?,
        })
    }
}

/// AllocColor reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocColorReply {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub pixel: u32,
}

impl AllocColorReply {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, RECORD_SIZE)?;
        Ok(AllocColorReply {
            red: r.u16_at(8)?,
            green: r.u16_at(10)?,
            blue: r.u16_at(12)?,
            pixel: r.u32_at(16)?,
        })
    }
}

/// AllocNamedColor reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocNamedColorReply {
    pub pixel: u32,
    pub exact: Rgb,
    pub visual: Rgb,
}

impl AllocNamedColorReply {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, RECORD_SIZE)?;
        Ok(AllocNamedColorReply {
            pixel: r.u32_at(8)?,
            exact: Rgb::new(r.u16_at(12)?, r.u16_at(14)?, r.u16_at(16)?),
            visual: Rgb::new(r.u16_at(18)?, r.u16_at(20)?, r.u16_at(22)?),
        })
    }
}

/// InternAtom reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternAtomReply {
    pub atom: Atom,
}

impl InternAtomReply {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, RECORD_SIZE)?;
        Ok(InternAtomReply {
            atom: Atom::new(r.u32_at(8)?),
        })
    }
}

/// Outcome of GrabPointer / GrabKeyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    Success = 0,
    AlreadyGrabbed = 1,
    InvalidTime = 2,
    NotViewable = 3,
    Frozen = 4,
}

impl GrabStatus {
    pub fn from_u8(status: u8) -> Option<Self> {
        match status {
            0 => Some(GrabStatus::Success),
            1 => Some(GrabStatus::AlreadyGrabbed),
            2 => Some(GrabStatus::InvalidTime),
            3 => Some(GrabStatus::NotViewable),
            4 => Some(GrabStatus::Frozen),
            _ => None,
        }
    }

    /// Decode the status carried in byte 1 of a grab reply
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let r = reply_record(bytes, RECORD_SIZE)?;
        let status = r.u8_at(1)?;
        // Unknown statuses are treated as a refused grab
        Ok(Self::from_u8(status).unwrap_or(GrabStatus::Frozen))
    }
}
