//! Cursor handle

use super::{Font, HandleCore, Pixmap, ResourceKind, ResourceRef};
use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::*;

/// Glyph cursors from the standard "cursor" font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Arrow,
    Crosshair,
    Hand,
    Watch,
    Text,
}

impl CursorShape {
    /// Index of the shape's glyph in the cursor font
    pub fn glyph(self) -> u16 {
        match self {
            CursorShape::Arrow => 2,
            CursorShape::Crosshair => 34,
            CursorShape::Hand => 58,
            CursorShape::Watch => 150,
            CursorShape::Text => 152,
        }
    }
}

#[derive(Debug)]
pub struct Cursor {
    core: HandleCore,
}

impl Cursor {
    pub fn standard(conn: &Connection, shape: CursorShape) -> Result<Cursor> {
        Self::from_glyph(conn, shape.glyph())
    }

    /// Black-on-white cursor from a glyph of the cursor font; the mask is
    /// the glyph that follows it
    pub fn from_glyph(conn: &Connection, glyph: u16) -> Result<Cursor> {
        let shared = conn.shared();
        let font = Font::open_on(shared, "cursor")?;
        let core = HandleCore::create(shared, ResourceKind::Cursor, |cid| {
            Request::CreateGlyphCursor {
                cid,
                source_font: font.id(),
                mask_font: font.id(),
                source_char: glyph,
                mask_char: glyph.saturating_add(1),
                fore: Rgb::BLACK,
                back: Rgb::WHITE,
            }
        });
        // The cursor keeps its own reference to the glyphs
        font.release()?;
        Ok(Cursor { core: core? })
    }

    /// Cursor from a 1-bit source pixmap and optional mask
    pub fn from_pixmap(
        conn: &Connection,
        source: &Pixmap,
        mask: Option<&Pixmap>,
        fore: Rgb,
        back: Rgb,
        hotspot: (u16, u16),
    ) -> Result<Cursor> {
        let core = HandleCore::create(conn.shared(), ResourceKind::Cursor, |cid| {
            Request::CreateCursor {
                cid,
                source: source.id(),
                mask: mask.map_or(ResourceId::NONE, |m| m.id()),
                fore,
                back,
                x: hotspot.0,
                y: hotspot.1,
            }
        })?;
        Ok(Cursor { core })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    pub fn resource_ref(&self) -> ResourceRef {
        self.core.resource_ref()
    }

    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }

    pub fn release(&self) -> Result<()> {
        self.core.release()
    }
}
