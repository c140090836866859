//! X11 protocol requests
//!
//! This module defines the request opcodes the client issues and encodes each
//! request into its little-endian wire form.

use super::pad;
use super::types::*;
use byteorder::{ByteOrder as _, LittleEndian};
use std::fmt;

/// X11 request opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestOpcode {
    CreateWindow = 1,
    ChangeWindowAttributes = 2,
    DestroyWindow = 4,
    MapWindow = 8,
    UnmapWindow = 10,
    ConfigureWindow = 12,
    InternAtom = 16,
    ChangeProperty = 18,
    GrabPointer = 26,
    UngrabPointer = 27,
    GrabKeyboard = 31,
    UngrabKeyboard = 32,
    QueryPointer = 38,
    OpenFont = 45,
    CloseFont = 46,
    QueryFont = 47,
    CreatePixmap = 53,
    FreePixmap = 54,
    CreateGC = 55,
    ChangeGC = 56,
    FreeGC = 60,
    ClearArea = 61,
    CopyArea = 62,
    PolyPoint = 64,
    PolyLine = 65,
    PolyRectangle = 67,
    PolyArc = 68,
    PolyFillRectangle = 70,
    PolyFillArc = 71,
    ImageText8 = 76,
    CreateColormap = 78,
    FreeColormap = 79,
    AllocColor = 84,
    AllocNamedColor = 85,
    CreateCursor = 93,
    CreateGlyphCursor = 94,
    FreeCursor = 95,
}

/// Value-list payload: a bitmask naming the optional fields present,
/// followed by one 32-bit value per set bit in ascending bit order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueList {
    pub mask: u32,
    pub values: Vec<u32>,
}

impl ValueList {
    pub fn empty() -> Self {
        ValueList::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

/// Time argument meaning "the server's current time"
pub const CURRENT_TIME: u32 = 0;

/// Requests the client issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateWindow {
        depth: u8,
        wid: ResourceId,
        parent: ResourceId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
        class: WindowClass,
        visual: VisualId,
        values: ValueList,
    },
    ChangeWindowAttributes {
        window: ResourceId,
        values: ValueList,
    },
    DestroyWindow {
        window: ResourceId,
    },
    MapWindow {
        window: ResourceId,
    },
    UnmapWindow {
        window: ResourceId,
    },
    ConfigureWindow {
        window: ResourceId,
        values: ValueList,
    },
    InternAtom {
        only_if_exists: bool,
        name: String,
    },
    ChangeProperty {
        mode: PropMode,
        window: ResourceId,
        property: Atom,
        type_: Atom,
        format: u8,
        data: Vec<u8>,
    },
    GrabPointer {
        owner_events: bool,
        grab_window: ResourceId,
        event_mask: u16,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
        confine_to: ResourceId,
        cursor: ResourceId,
        time: u32,
    },
    UngrabPointer {
        time: u32,
    },
    GrabKeyboard {
        owner_events: bool,
        grab_window: ResourceId,
        time: u32,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
    },
    UngrabKeyboard {
        time: u32,
    },
    QueryPointer {
        window: ResourceId,
    },
    OpenFont {
        fid: ResourceId,
        name: String,
    },
    CloseFont {
        font: ResourceId,
    },
    QueryFont {
        font: ResourceId,
    },
    CreatePixmap {
        depth: u8,
        pid: ResourceId,
        drawable: ResourceId,
        width: u16,
        height: u16,
    },
    FreePixmap {
        pixmap: ResourceId,
    },
    CreateGC {
        cid: ResourceId,
        drawable: ResourceId,
        values: ValueList,
    },
    ChangeGC {
        gc: ResourceId,
        values: ValueList,
    },
    FreeGC {
        gc: ResourceId,
    },
    ClearArea {
        exposures: bool,
        window: ResourceId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
    },
    CopyArea {
        src: ResourceId,
        dst: ResourceId,
        gc: ResourceId,
        src_x: i16,
        src_y: i16,
        dst_x: i16,
        dst_y: i16,
        width: u16,
        height: u16,
    },
    PolyPoint {
        coordinate_mode: CoordMode,
        drawable: ResourceId,
        gc: ResourceId,
        points: Vec<Point>,
    },
    PolyLine {
        coordinate_mode: CoordMode,
        drawable: ResourceId,
        gc: ResourceId,
        points: Vec<Point>,
    },
    PolyRectangle {
        drawable: ResourceId,
        gc: ResourceId,
        rectangles: Vec<Rectangle>,
    },
    PolyArc {
        drawable: ResourceId,
        gc: ResourceId,
        arcs: Vec<Arc>,
    },
    PolyFillRectangle {
        drawable: ResourceId,
        gc: ResourceId,
        rectangles: Vec<Rectangle>,
    },
    PolyFillArc {
        drawable: ResourceId,
        gc: ResourceId,
        arcs: Vec<Arc>,
    },
    ImageText8 {
        drawable: ResourceId,
        gc: ResourceId,
        x: i16,
        y: i16,
        text: Vec<u8>,
    },
    CreateColormap {
        alloc_all: bool,
        mid: ResourceId,
        window: ResourceId,
        visual: VisualId,
    },
    FreeColormap {
        cmap: ResourceId,
    },
    AllocColor {
        cmap: ResourceId,
        color: Rgb,
    },
    AllocNamedColor {
        cmap: ResourceId,
        name: String,
    },
    CreateCursor {
        cid: ResourceId,
        source: ResourceId,
        mask: ResourceId,
        fore: Rgb,
        back: Rgb,
        x: u16,
        y: u16,
    },
    CreateGlyphCursor {
        cid: ResourceId,
        source_font: ResourceId,
        mask_font: ResourceId,
        source_char: u16,
        mask_char: u16,
        fore: Rgb,
        back: Rgb,
    },
    FreeCursor {
        cursor: ResourceId,
    },
}

/// Request, or one of its counted strings, too long for its length field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    pub opcode: RequestOpcode,
    pub bytes: usize,
    pub limit: usize,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} request: {} bytes exceed the limit of {}",
            self.opcode, self.bytes, self.limit
        )
    }
}

// Length of a counted string, checked against the width of its field
fn counted<T>(opcode: RequestOpcode, data: &[u8]) -> Result<T, EncodeError>
where
    T: TryFrom<usize> + Bounded,
{
    T::try_from(data.len()).map_err(|_| EncodeError {
        opcode,
        bytes: data.len(),
        limit: T::MAX_USIZE,
    })
}

trait Bounded {
    const MAX_USIZE: usize;
}

impl Bounded for u8 {
    const MAX_USIZE: usize = u8::MAX as usize;
}

impl Bounded for u16 {
    const MAX_USIZE: usize = u16::MAX as usize;
}

impl std::error::Error for EncodeError {}

/// Largest request expressible without BIG-REQUESTS
pub const MAX_REQUEST_BYTES: usize = u16::MAX as usize * 4;

// Accumulates one request; the length field is patched in by finish()
struct RequestWriter {
    opcode: RequestOpcode,
    buf: Vec<u8>,
}

impl RequestWriter {
    fn new(opcode: RequestOpcode, data: u8) -> Self {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(&[opcode as u8, data, 0, 0]);
        RequestWriter { opcode, buf }
    }

    fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    fn unused(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    fn i16(&mut self, value: i16) -> &mut Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    fn u32(&mut self, value: u32) -> &mut Self {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    fn id(&mut self, id: ResourceId) -> &mut Self {
        self.u32(id.get())
    }

    fn rgb(&mut self, color: Rgb) -> &mut Self {
        self.u16(color.red).u16(color.green).u16(color.blue)
    }

    /// Raw bytes followed by padding to a 4-byte boundary
    fn padded(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self.unused(pad(data.len()))
    }

    fn values(&mut self, values: &ValueList) -> &mut Self {
        for value in &values.values {
            self.u32(*value);
        }
        self
    }

    fn points(&mut self, points: &[Point]) -> &mut Self {
        for p in points {
            self.i16(p.x).i16(p.y);
        }
        self
    }

    fn rectangles(&mut self, rectangles: &[Rectangle]) -> &mut Self {
        for r in rectangles {
            self.i16(r.x).i16(r.y).u16(r.width).u16(r.height);
        }
        self
    }

    fn arcs(&mut self, arcs: &[Arc]) -> &mut Self {
        for a in arcs {
            self.i16(a.x)
                .i16(a.y)
                .u16(a.width)
                .u16(a.height)
                .i16(a.angle1)
                .i16(a.angle2);
        }
        self
    }

    fn finish(&mut self) -> Result<Vec<u8>, EncodeError> {
        let tail = pad(self.buf.len());
        self.unused(tail);
        if self.buf.len() > MAX_REQUEST_BYTES {
            return Err(EncodeError {
                opcode: self.opcode,
                bytes: self.buf.len(),
                limit: MAX_REQUEST_BYTES,
            });
        }
        let words = (self.buf.len() / 4) as u16;
        LittleEndian::write_u16(&mut self.buf[2..4], words);
        Ok(std::mem::take(&mut self.buf))
    }
}

impl Request {
    pub fn opcode(&self) -> RequestOpcode {
        use RequestOpcode as Op;
        match self {
            Request::CreateWindow { .. } => Op::CreateWindow,
            Request::ChangeWindowAttributes { .. } => Op::ChangeWindowAttributes,
            Request::DestroyWindow { .. } => Op::DestroyWindow,
            Request::MapWindow { .. } => Op::MapWindow,
            Request::UnmapWindow { .. } => Op::UnmapWindow,
            Request::ConfigureWindow { .. } => Op::ConfigureWindow,
            Request::InternAtom { .. } => Op::InternAtom,
            Request::ChangeProperty { .. } => Op::ChangeProperty,
            Request::GrabPointer { .. } => Op::GrabPointer,
            Request::UngrabPointer { .. } => Op::UngrabPointer,
            Request::GrabKeyboard { .. } => Op::GrabKeyboard,
            Request::UngrabKeyboard { .. } => Op::UngrabKeyboard,
            Request::QueryPointer { .. } => Op::QueryPointer,
            Request::OpenFont { .. } => Op::OpenFont,
            Request::CloseFont { .. } => Op::CloseFont,
            Request::QueryFont { .. } => Op::QueryFont,
            Request::CreatePixmap { .. } => Op::CreatePixmap,
            Request::FreePixmap { .. } => Op::FreePixmap,
            Request::CreateGC { .. } => Op::CreateGC,
            Request::ChangeGC { .. } => Op::ChangeGC,
            Request::FreeGC { .. } => Op::FreeGC,
            Request::ClearArea { .. } => Op::ClearArea,
            Request::CopyArea { .. } => Op::CopyArea,
            Request::PolyPoint { .. } => Op::PolyPoint,
            Request::PolyLine { .. } => Op::PolyLine,
            Request::PolyRectangle { .. } => Op::PolyRectangle,
            Request::PolyArc { .. } => Op::PolyArc,
            Request::PolyFillRectangle { .. } => Op::PolyFillRectangle,
            Request::PolyFillArc { .. } => Op::PolyFillArc,
            Request::ImageText8 { .. } => Op::ImageText8,
            Request::CreateColormap { .. } => Op::CreateColormap,
            Request::FreeColormap { .. } => Op::FreeColormap,
            Request::AllocColor { .. } => Op::AllocColor,
            Request::AllocNamedColor { .. } => Op::AllocNamedColor,
            Request::CreateCursor { .. } => Op::CreateCursor,
            Request::CreateGlyphCursor { .. } => Op::CreateGlyphCursor,
            Request::FreeCursor { .. } => Op::FreeCursor,
        }
    }

    /// Whether the server answers this request with a reply
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Request::InternAtom { .. }
                | Request::GrabPointer { .. }
                | Request::GrabKeyboard { .. }
                | Request::QueryPointer { .. }
                | Request::QueryFont { .. }
                | Request::AllocColor { .. }
                | Request::AllocNamedColor { .. }
        )
    }

    /// Encode request to wire format
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let op = self.opcode();
        match self {
            Request::CreateWindow {
                depth,
                wid,
                parent,
                x,
                y,
                width,
                height,
                border_width,
                class,
                visual,
                values,
            } => RequestWriter::new(op, *depth)
                .id(*wid)
                .id(*parent)
                .i16(*x)
                .i16(*y)
                .u16(*width)
                .u16(*height)
                .u16(*border_width)
                .u16(*class as u16)
                .u32(visual.get())
                .u32(values.mask)
                .values(values)
                .finish(),
            Request::ChangeWindowAttributes { window, values } => RequestWriter::new(op, 0)
                .id(*window)
                .u32(values.mask)
                .values(values)
                .finish(),
            Request::ConfigureWindow { window, values } => RequestWriter::new(op, 0)
                .id(*window)
                .u16(values.mask as u16)
                .unused(2)
                .values(values)
                .finish(),
            Request::DestroyWindow { window: id }
            | Request::MapWindow { window: id }
            | Request::UnmapWindow { window: id }
            | Request::QueryPointer { window: id }
            | Request::CloseFont { font: id }
            | Request::QueryFont { font: id }
            | Request::FreePixmap { pixmap: id }
            | Request::FreeGC { gc: id }
            | Request::FreeColormap { cmap: id }
            | Request::FreeCursor { cursor: id } => RequestWriter::new(op, 0).id(*id).finish(),
            Request::InternAtom {
                only_if_exists,
                name,
            } => RequestWriter::new(op, *only_if_exists as u8)
                .u16(counted(op, name.as_bytes())?)
                .unused(2)
                .padded(name.as_bytes())
                .finish(),
            Request::ChangeProperty {
                mode,
                window,
                property,
                type_,
                format,
                data,
            } => {
                let unit = (*format as usize / 8).max(1);
                RequestWriter::new(op, *mode as u8)
                    .id(*window)
                    .u32(property.get())
                    .u32(type_.get())
                    .u8(*format)
                    .unused(3)
                    .u32((data.len() / unit) as u32)
                    .padded(data)
                    .finish()
            }
            Request::GrabPointer {
                owner_events,
                grab_window,
                event_mask,
                pointer_mode,
                keyboard_mode,
                confine_to,
                cursor,
                time,
            } => RequestWriter::new(op, *owner_events as u8)
                .id(*grab_window)
                .u16(*event_mask)
                .u8(*pointer_mode as u8)
                .u8(*keyboard_mode as u8)
                .id(*confine_to)
                .id(*cursor)
                .u32(*time)
                .finish(),
            Request::UngrabPointer { time } | Request::UngrabKeyboard { time } => {
                RequestWriter::new(op, 0).u32(*time).finish()
            }
            Request::GrabKeyboard {
                owner_events,
                grab_window,
                time,
                pointer_mode,
                keyboard_mode,
            } => RequestWriter::new(op, *owner_events as u8)
                .id(*grab_window)
                .u32(*time)
                .u8(*pointer_mode as u8)
                .u8(*keyboard_mode as u8)
                .unused(2)
                .finish(),
            Request::OpenFont { fid, name } => RequestWriter::new(op, 0)
                .id(*fid)
                .u16(counted(op, name.as_bytes())?)
                .unused(2)
                .padded(name.as_bytes())
                .finish(),
            Request::CreatePixmap {
                depth,
                pid,
                drawable,
                width,
                height,
            } => RequestWriter::new(op, *depth)
                .id(*pid)
                .id(*drawable)
                .u16(*width)
                .u16(*height)
                .finish(),
            Request::CreateGC {
                cid,
                drawable,
                values,
            } => RequestWriter::new(op, 0)
                .id(*cid)
                .id(*drawable)
                .u32(values.mask)
                .values(values)
                .finish(),
            Request::ChangeGC { gc, values } => RequestWriter::new(op, 0)
                .id(*gc)
                .u32(values.mask)
                .values(values)
                .finish(),
            Request::ClearArea {
                exposures,
                window,
                x,
                y,
                width,
                height,
            } => RequestWriter::new(op, *exposures as u8)
                .id(*window)
                .i16(*x)
                .i16(*y)
                .u16(*width)
                .u16(*height)
                .finish(),
            Request::CopyArea {
                src,
                dst,
                gc,
                src_x,
                src_y,
                dst_x,
                dst_y,
                width,
                height,
            } => RequestWriter::new(op, 0)
                .id(*src)
                .id(*dst)
                .id(*gc)
                .i16(*src_x)
                .i16(*src_y)
                .i16(*dst_x)
                .i16(*dst_y)
                .u16(*width)
                .u16(*height)
                .finish(),
            Request::PolyPoint {
                coordinate_mode,
                drawable,
                gc,
                points,
            }
            | Request::PolyLine {
                coordinate_mode,
                drawable,
                gc,
                points,
            } => RequestWriter::new(op, *coordinate_mode as u8)
                .id(*drawable)
                .id(*gc)
                .points(points)
                .finish(),
            Request::PolyRectangle {
                drawable,
                gc,
                rectangles,
            }
            | Request::PolyFillRectangle {
                drawable,
                gc,
                rectangles,
            } => RequestWriter::new(op, 0)
                .id(*drawable)
                .id(*gc)
                .rectangles(rectangles)
                .finish(),
            Request::PolyArc { drawable, gc, arcs } | Request::PolyFillArc { drawable, gc, arcs } => {
                RequestWriter::new(op, 0)
                    .id(*drawable)
                    .id(*gc)
                    .arcs(arcs)
                    .finish()
            }
            Request::ImageText8 {
                drawable,
                gc,
                x,
                y,
                text,
            } => {
                // String length travels in the data byte
                RequestWriter::new(op, counted(op, text)?)
                    .id(*drawable)
                    .id(*gc)
                    .i16(*x)
                    .i16(*y)
                    .padded(text)
                    .finish()
            }
            Request::CreateColormap {
                alloc_all,
                mid,
                window,
                visual,
            } => RequestWriter::new(op, *alloc_all as u8)
                .id(*mid)
                .id(*window)
                .u32(visual.get())
                .finish(),
            Request::AllocColor { cmap, color } => RequestWriter::new(op, 0)
                .id(*cmap)
                .rgb(*color)
                .unused(2)
                .finish(),
            Request::AllocNamedColor { cmap, name } => RequestWriter::new(op, 0)
                .id(*cmap)
                .u16(counted(op, name.as_bytes())?)
                .unused(2)
                .padded(name.as_bytes())
                .finish(),
            Request::CreateCursor {
                cid,
                source,
                mask,
                fore,
                back,
                x,
                y,
            } => RequestWriter::new(op, 0)
                .id(*cid)
                .id(*source)
                .id(*mask)
                .rgb(*fore)
                .rgb(*back)
                .u16(*x)
                .u16(*y)
                .finish(),
            Request::CreateGlyphCursor {
                cid,
                source_font,
                mask_font,
                source_char,
                mask_char,
                fore,
                back,
            } => RequestWriter::new(op, 0)
                .id(*cid)
                .id(*source_font)
                .id(*mask_font)
                .u16(*source_char)
                .u16(*mask_char)
                .rgb(*fore)
                .rgb(*back)
                .finish(),
        }
    }
}

/// Event-mask subset accepted by GrabPointer (16 bits on the wire)
pub fn pointer_event_mask(mask: u32) -> u16 {
    (mask & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le16(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    fn le32(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn test_create_window_encoding() {
        let req = Request::CreateWindow {
            depth: 0,
            wid: ResourceId::new(0x0400_0001),
            parent: ResourceId::new(0x0000_0100),
            x: 10,
            y: -20,
            width: 400,
            height: 300,
            border_width: 1,
            class: WindowClass::InputOutput,
            visual: VisualId::new(0x21),
            values: ValueList {
                mask: 0x802,
                values: vec![0x00FF_FFFF, 0x0000_8001],
            },
        };
        let buf = req.encode().unwrap();
        assert_eq!(buf.len(), 40);
        assert_eq!(buf[0], 1);
        assert_eq!(le16(&buf, 2), 10);
        assert_eq!(le32(&buf, 4), 0x0400_0001);
        assert_eq!(le16(&buf, 14), (-20i16) as u16);
        assert_eq!(le16(&buf, 22), 1);
        assert_eq!(le32(&buf, 28), 0x802);
        assert_eq!(le32(&buf, 32), 0x00FF_FFFF);
        assert_eq!(le32(&buf, 36), 0x0000_8001);
    }

    #[test]
    fn test_free_requests_are_two_words() {
        let id = ResourceId::new(0x0400_0002);
        for req in [
            Request::DestroyWindow { window: id },
            Request::FreeGC { gc: id },
            Request::CloseFont { font: id },
            Request::FreeCursor { cursor: id },
            Request::FreeColormap { cmap: id },
            Request::FreePixmap { pixmap: id },
        ] {
            let buf = req.encode().unwrap();
            assert_eq!(buf.len(), 8);
            assert_eq!(buf[0], req.opcode() as u8);
            assert_eq!(le16(&buf, 2), 2);
            assert_eq!(le32(&buf, 4), 0x0400_0002);
        }
    }

    #[test]
    fn test_change_property_title() {
        let req = Request::ChangeProperty {
            mode: PropMode::Replace,
            window: ResourceId::new(7),
            property: Atom::WM_NAME,
            type_: Atom::STRING,
            format: 8,
            data: b"Hello".to_vec(),
        };
        let buf = req.encode().unwrap();
        assert_eq!(buf[0], 18);
        assert_eq!(buf.len(), 24 + 8);
        assert_eq!(le32(&buf, 8), 39);
        assert_eq!(le32(&buf, 12), 31);
        assert_eq!(buf[16], 8);
        assert_eq!(le32(&buf, 20), 5);
        assert_eq!(&buf[24..29], b"Hello");
        assert_eq!(le16(&buf, 2) as usize * 4, buf.len());
    }

    #[test]
    fn test_configure_window_mask_is_16_bits() {
        let req = Request::ConfigureWindow {
            window: ResourceId::new(7),
            values: ValueList {
                mask: 0x3,
                values: vec![5, 6],
            },
        };
        let buf = req.encode().unwrap();
        assert_eq!(buf.len(), 20);
        assert_eq!(le16(&buf, 8), 3);
        assert_eq!(le32(&buf, 12), 5);
        assert_eq!(le32(&buf, 16), 6);
    }

    #[test]
    fn test_image_text_length_in_data_byte() {
        let req = Request::ImageText8 {
            drawable: ResourceId::new(1),
            gc: ResourceId::new(2),
            x: 10,
            y: 20,
            text: b"abc".to_vec(),
        };
        let buf = req.encode().unwrap();
        assert_eq!(buf[1], 3);
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn test_glyph_cursor_layout() {
        let req = Request::CreateGlyphCursor {
            cid: ResourceId::new(1),
            source_font: ResourceId::new(2),
            mask_font: ResourceId::new(2),
            source_char: 34,
            mask_char: 35,
            fore: Rgb::BLACK,
            back: Rgb::WHITE,
        };
        let buf = req.encode().unwrap();
        assert_eq!(buf.len(), 32);
        assert_eq!(le16(&buf, 16), 34);
        assert_eq!(le16(&buf, 18), 35);
        assert_eq!(le16(&buf, 26), 0xFFFF);
    }

    #[test]
    fn test_oversized_request_rejected() {
        let req = Request::PolyPoint {
            coordinate_mode: CoordMode::Origin,
            drawable: ResourceId::new(1),
            gc: ResourceId::new(2),
            points: vec![Point::new(0, 0); MAX_REQUEST_BYTES / 4],
        };
        assert!(req.encode().is_err());
    }

    #[test]
    fn test_image_text_over_255_bytes_rejected() {
        let text = |len: usize| Request::ImageText8 {
            drawable: ResourceId::new(1),
            gc: ResourceId::new(2),
            x: 0,
            y: 0,
            text: vec![b'x'; len],
        };
        let buf = text(255).encode().unwrap();
        assert_eq!(buf[1], 255);

        let err = text(300).encode().unwrap_err();
        assert_eq!(err.opcode, RequestOpcode::ImageText8);
        assert_eq!((err.bytes, err.limit), (300, 255));
    }

    #[test]
    fn test_counted_names_over_16_bits_rejected() {
        // Fits inside MAX_REQUEST_BYTES but not in the name length field
        let name = "a".repeat(70_000);
        let requests = [
            Request::InternAtom {
                only_if_exists: false,
                name: name.clone(),
            },
            Request::OpenFont {
                fid: ResourceId::new(1),
                name: name.clone(),
            },
            Request::AllocNamedColor {
                cmap: ResourceId::new(1),
                name,
            },
        ];
        for req in &requests {
            let err = req.encode().unwrap_err();
            assert_eq!(err.opcode, req.opcode());
            assert_eq!((err.bytes, err.limit), (70_000, u16::MAX as usize));
        }

        let buf = Request::InternAtom {
            only_if_exists: true,
            name: "a".repeat(u16::MAX as usize),
        }
        .encode()
        .unwrap();
        assert_eq!(le16(&buf, 4), u16::MAX);
    }
}
