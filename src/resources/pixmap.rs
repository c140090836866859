//! Pixmap handle

use super::{GcOptions, GraphicsContext, HandleCore, ResourceKind, ResourceRef};
use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::*;

/// Off-screen drawable
#[derive(Debug)]
pub struct Pixmap {
    core: HandleCore,
    width: u16,
    height: u16,
    depth: u8,
}

impl Pixmap {
    /// Create a pixmap on the screen of `drawable`; `depth` defaults to the
    /// screen's root depth
    pub fn create(
        conn: &Connection,
        drawable: Drawable,
        width: u16,
        height: u16,
        depth: Option<u8>,
    ) -> Result<Pixmap> {
        let depth = depth.unwrap_or(conn.screen_info().root_depth);
        let core = HandleCore::create(conn.shared(), ResourceKind::Pixmap, |pid| {
            Request::CreatePixmap {
                depth,
                pid,
                drawable: drawable.id(),
                width,
                height,
            }
        })?;
        Ok(Pixmap {
            core,
            width,
            height,
            depth,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    pub fn drawable(&self) -> Drawable {
        Drawable::Pixmap(self.id())
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn depth(&self) -> u8 {
        self.depth
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

    pub fn create_graphics_context(&self, options: &GcOptions) -> Result<GraphicsContext> {
        GraphicsContext::create_on(&self.core.conn()?, self.drawable(), options)
    }
}
