//! Graphics context handle and drawing

use super::{Font, HandleCore, ResourceKind, ResourceRef};
use crate::attributes::{AttrValue, Color, GcAttr, GcAttributes};
use crate::connection::{Connection, Shared};
use crate::error::{Error, Result};
use crate::protocol::*;
use std::cell::Cell;
use std::rc::Rc;

/// Parameters for [`GraphicsContext::create`]
#[derive(Debug, Clone)]
pub struct GcOptions {
    pub foreground: Color,
    pub background: Color,
    pub font: Option<ResourceId>,
    pub line_width: Option<u16>,
    /// Further fields sent with CreateGC
    pub attributes: GcAttributes,
}

impl Default for GcOptions {
    fn default() -> Self {
        GcOptions {
            foreground: Color::Black,
            background: Color::White,
            font: None,
            line_width: None,
            attributes: GcAttributes::new(),
        }
    }
}

impl GcOptions {
    fn to_attributes(&self) -> GcAttributes {
        let mut attributes = self
            .attributes
            .clone()
            .set(GcAttr::Foreground, self.foreground)
            .set(GcAttr::Background, self.background);
        if let Some(font) = self.font {
            attributes.insert(GcAttr::Font, ResourceRef::Font(font));
        }
        if let Some(width) = self.line_width {
            attributes.insert(GcAttr::LineWidth, width);
        }
        attributes
    }
}

/// Graphics context bound to the drawable it was created for
///
/// All drawing methods target that drawable.
#[derive(Debug)]
pub struct GraphicsContext {
    core: HandleCore,
    drawable: Drawable,
    font: Cell<Option<ResourceId>>,
}

impl GraphicsContext {
    pub fn create(conn: &Connection, drawable: Drawable, options: &GcOptions) -> Result<Self> {
        Self::create_on(conn.shared(), drawable, options)
    }

    pub(crate) fn create_on(
        shared: &Rc<Shared>,
        drawable: Drawable,
        options: &GcOptions,
    ) -> Result<Self> {
        let attributes = options.to_attributes();
        let font = bound_font(&attributes);
        let values = attributes.build(shared.screen());
        let core = HandleCore::create(shared, ResourceKind::GraphicsContext, |cid| {
            Request::CreateGC {
                cid,
                drawable: drawable.id(),
                values,
            }
        })?;
        Ok(GraphicsContext {
            core,
            drawable,
            font: Cell::new(font),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    pub fn drawable(&self) -> Drawable {
        self.drawable
    }

    pub fn font(&self) -> Option<ResourceId> {
        self.font.get()
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

    /// Reissue ChangeGC with the given fields
    pub fn change(&self, attributes: &GcAttributes) -> Result<()> {
        let shared = self.core.conn()?;
        shared.send(&Request::ChangeGC {
            gc: self.id(),
            values: attributes.build(shared.screen()),
        })?;
        if let Some(font) = bound_font(attributes) {
            self.font.set(Some(font));
        }
        Ok(())
    }

    pub fn set_foreground(&self, color: Color) -> Result<()> {
        self.change(&GcAttributes::new().set(GcAttr::Foreground, color))
    }

    pub fn set_background(&self, color: Color) -> Result<()> {
        self.change(&GcAttributes::new().set(GcAttr::Background, color))
    }

    pub fn set_font(&self, font: &Font) -> Result<()> {
        self.change(&GcAttributes::new().set(GcAttr::Font, font.resource_ref()))
    }

    pub fn set_line_width(&self, width: u16) -> Result<()> {
        self.change(&GcAttributes::new().set(GcAttr::LineWidth, width))
    }

    pub fn set_function(&self, function: GCFunction) -> Result<()> {
        self.change(&GcAttributes::new().set(GcAttr::Function, function))
    }

    pub fn draw_point(&self, x: i16, y: i16) -> Result<()> {
        self.draw_points(&[Point::new(x, y)])
    }

    pub fn draw_points(&self, points: &[Point]) -> Result<()> {
        self.core.send(&Request::PolyPoint {
            coordinate_mode: CoordMode::Origin,
            drawable: self.drawable.id(),
            gc: self.id(),
            points: points.to_vec(),
        })
    }

    pub fn draw_line(&self, x1: i16, y1: i16, x2: i16, y2: i16) -> Result<()> {
        self.draw_lines(&[Point::new(x1, y1), Point::new(x2, y2)])
    }

    /// Connected line through all points
    pub fn draw_lines(&self, points: &[Point]) -> Result<()> {
        self.core.send(&Request::PolyLine {
            coordinate_mode: CoordMode::Origin,
            drawable: self.drawable.id(),
            gc: self.id(),
            points: points.to_vec(),
        })
    }

    pub fn draw_rectangle(&self, rect: Rectangle) -> Result<()> {
        self.core.send(&Request::PolyRectangle {
            drawable: self.drawable.id(),
            gc: self.id(),
            rectangles: vec![rect],
        })
    }

    pub fn fill_rectangle(&self, rect: Rectangle) -> Result<()> {
        self.core.send(&Request::PolyFillRectangle {
            drawable: self.drawable.id(),
            gc: self.id(),
            rectangles: vec![rect],
        })
    }

    pub fn draw_arc(&self, arc: Arc) -> Result<()> {
        self.core.send(&Request::PolyArc {
            drawable: self.drawable.id(),
            gc: self.id(),
            arcs: vec![arc],
        })
    }

    pub fn fill_arc(&self, arc: Arc) -> Result<()> {
        self.core.send(&Request::PolyFillArc {
            drawable: self.drawable.id(),
            gc: self.id(),
            arcs: vec![arc],
        })
    }

    /// Draw text with the bound font; the baseline starts at (x, y)
    ///
    /// ImageText8 carries at most 255 bytes; longer text fails with
    /// [`Error::Encode`] and nothing is drawn.
    pub fn draw_text(&self, x: i16, y: i16, text: &str) -> Result<()> {
        // Checked first so a released or lost handle reports that instead
        self.core.conn()?;
        if self.font.get().is_none() {
            return Err(Error::FontNotSet);
        }
        self.core.send(&Request::ImageText8 {
            drawable: self.drawable.id(),
            gc: self.id(),
            x,
            y,
            text: text.as_bytes().to_vec(),
        })
    }

    /// Copy a region of `src` into this context's drawable
    #[allow(clippy::too_many_arguments)]
    pub fn copy_area(
        &self,
        src: Drawable,
        src_x: i16,
        src_y: i16,
        width: u16,
        height: u16,
        dst_x: i16,
        dst_y: i16,
    ) -> Result<()> {
        self.core.send(&Request::CopyArea {
            src: src.id(),
            dst: self.drawable.id(),
            gc: self.id(),
            src_x,
            src_y,
            dst_x,
            dst_y,
            width,
            height,
        })
    }
}

fn bound_font(attributes: &GcAttributes) -> Option<ResourceId> {
    match attributes.get(GcAttr::Font)? {
        AttrValue::Resource(resource) => Some(resource.id()),
        AttrValue::Card(id) => Some(ResourceId::new(*id)),
        _ => None,
    }
}
