//! Colormap handle

use super::{HandleCore, ResourceKind, ResourceRef};
use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::*;

#[derive(Debug)]
pub struct Colormap {
    core: HandleCore,
}

impl Colormap {
    /// Create a colormap for `visual` on the connection's screen
    pub fn create(conn: &Connection, visual: VisualId) -> Result<Colormap> {
        let root = conn.root();
        let core = HandleCore::create(conn.shared(), ResourceKind::Colormap, |mid| {
            Request::CreateColormap {
                alloc_all: false,
                mid,
                window: root,
                visual,
            }
        })?;
        Ok(Colormap { core })
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

    /// Allocate the closest color to the 16-bit channels; returns the pixel
    pub fn alloc_color(&self, red: u16, green: u16, blue: u16) -> Result<u32> {
        let reply = self.core.conn()?.round_trip(&Request::AllocColor {
            cmap: self.id(),
            color: Rgb::new(red, green, blue),
        })?;
        Ok(AllocColorReply::decode(&reply)?.pixel)
    }

    /// Allocate a color by name from the server's color database
    pub fn alloc_named_color(&self, name: &str) -> Result<u32> {
        let reply = self.core.conn()?.round_trip(&Request::AllocNamedColor {
            cmap: self.id(),
            name: name.to_string(),
        })?;
        Ok(AllocNamedColorReply::decode(&reply)?.pixel)
    }
}
