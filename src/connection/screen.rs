//! Screen snapshot taken from the setup data at connect time

use crate::protocol::{ResourceId, Screen, VisualId};

/// Read-only description of the screen a connection was opened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenInfo {
    pub number: usize,
    pub width: u16,
    pub height: u16,
    pub width_mm: u16,
    pub height_mm: u16,
    pub root: ResourceId,
    pub root_depth: u8,
    pub root_visual: VisualId,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub default_colormap: ResourceId,
}

impl ScreenInfo {
    pub fn from_screen(number: usize, screen: &Screen) -> Self {
        ScreenInfo {
            number,
            width: screen.width_in_pixels,
            height: screen.height_in_pixels,
            width_mm: screen.width_in_millimeters,
            height_mm: screen.height_in_millimeters,
            root: screen.root,
            root_depth: screen.root_depth,
            root_visual: screen.root_visual,
            white_pixel: screen.white_pixel,
            black_pixel: screen.black_pixel,
            default_colormap: screen.default_colormap,
        }
    }

    /// Screen resolution in dots per inch, horizontally and vertically
    pub fn dpi(&self) -> (f64, f64) {
        let per_inch = |pixels: u16, mm: u16| {
            if mm == 0 {
                0.0
            } else {
                f64::from(pixels) * 25.4 / f64::from(mm)
            }
        };
        (
            per_inch(self.width, self.width_mm),
            per_inch(self.height, self.height_mm),
        )
    }
}
