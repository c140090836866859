//! Font handle

use super::{HandleCore, ResourceKind, ResourceRef};
use crate::connection::{Connection, Shared};
use crate::error::Result;
use crate::protocol::*;
use std::cell::Cell;
use std::rc::Rc;

/// Vertical extent and widest glyph of a font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub ascent: u16,
    pub descent: u16,
    pub max_char_width: u16,
}

impl FontMetrics {
    pub fn height(&self) -> u16 {
        self.ascent.saturating_add(self.descent)
    }

    /// Width of `text` assuming every glyph is as wide as the widest one
    pub fn text_width(&self, text: &str) -> u32 {
        u32::try_from(text.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(u32::from(self.max_char_width))
    }

    fn from_reply(reply: &QueryFontReply) -> Self {
        // Negative values only appear in broken fonts
        let clamp = |v: i16| v.max(0) as u16;
        FontMetrics {
            ascent: clamp(reply.font_ascent),
            descent: clamp(reply.font_descent),
            max_char_width: clamp(reply.max_bounds.character_width),
        }
    }
}

#[derive(Debug)]
pub struct Font {
    core: HandleCore,
    name: String,
    metrics: Cell<Option<FontMetrics>>,
}

impl Font {
    /// Open a font by name (core font names or XLFD patterns)
    pub fn open(conn: &Connection, name: &str) -> Result<Font> {
        Self::open_on(conn.shared(), name)
    }

    pub(crate) fn open_on(shared: &Rc<Shared>, name: &str) -> Result<Font> {
        let core = HandleCore::create(shared, ResourceKind::Font, |fid| Request::OpenFont {
            fid,
            name: name.to_string(),
        })?;
        Ok(Font {
            core,
            name: name.to_string(),
            metrics: Cell::new(None),
        })
    }

    /// The server's default fixed-width font
    pub fn fixed(conn: &Connection) -> Result<Font> {
        Self::open(conn, "fixed")
    }

    /// Fixed-width font with the given pixel size
    pub fn with_size(conn: &Connection, pixels: u16) -> Result<Font> {
        Self::open(conn, &fixed_font_name(pixels))
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    pub fn name(&self) -> &str {
        &self.name
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

    /// Ask the server for the font's metrics; cached after the first call
    pub fn query_metrics(&self) -> Result<FontMetrics> {
        let shared = self.core.conn()?;
        if let Some(metrics) = self.metrics.get() {
            return Ok(metrics);
        }
        let reply = shared.round_trip(&Request::QueryFont { font: self.id() })?;
        let metrics = FontMetrics::from_reply(&QueryFontReply::decode(&reply)?);
        log::debug!("Metrics for font {:?}: {:?}", self.name, metrics);
        self.metrics.set(Some(metrics));
        Ok(metrics)
    }

    /// Line height: ascent plus descent
    pub fn height(&self) -> Result<u16> {
        Ok(self.query_metrics()?.height())
    }

    /// Width of `text` assuming every glyph is as wide as the widest one
    pub fn text_width(&self, text: &str) -> Result<u32> {
        Ok(self.query_metrics()?.text_width(text))
    }
}

/// XLFD name of the misc-fixed font at `pixels` size
pub fn fixed_font_name(pixels: u16) -> String {
    format!("-misc-fixed-medium-r-normal--{}-*-*-*-*-*-iso8859-1", pixels)
}
