//! Core X11 protocol types
//!
//! These types represent the fundamental data types used in the X11 protocol.
//! They are kept minimal and close to the wire protocol for efficiency.

use std::fmt;

/// Server-side resource identifier (window, pixmap, GC, font, cursor, colormap).
/// In X11, all objects are identified by 29-bit IDs allocated by the client
/// from the range handed out in the connection setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub const NONE: ResourceId = ResourceId(0);

    pub fn new(id: u32) -> Self {
        ResourceId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Target of drawing requests: a window or a pixmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drawable {
    Window(ResourceId),
    Pixmap(ResourceId),
}

impl Drawable {
    pub fn id(&self) -> ResourceId {
        match self {
            Drawable::Window(id) | Drawable::Pixmap(id) => *id,
        }
    }
}

/// Atom - interned string identifier
///
/// Only the predefined atoms the client touches are listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(pub u32);

impl Atom {
    pub const NONE: Atom = Atom(0);
    pub const CARDINAL: Atom = Atom(6);
    pub const STRING: Atom = Atom(31);
    pub const WINDOW: Atom = Atom(33);
    pub const WM_ICON_NAME: Atom = Atom(37);
    pub const WM_NAME: Atom = Atom(39);
    pub const WM_CLASS: Atom = Atom(67);

    pub fn new(id: u32) -> Self {
        Atom(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Visual ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId(pub u32);

impl VisualId {
    /// CopyFromParent
    pub const COPY_FROM_PARENT: VisualId = VisualId(0);

    pub fn new(id: u32) -> Self {
        VisualId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Point (x, y coordinate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Point { x, y }
    }
}

/// Rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }
}

/// Arc (for drawing arcs and ellipses)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub angle1: i16, // Start angle in 1/64 degrees
    pub angle2: i16, // Arc angle in 1/64 degrees
}

impl Arc {
    /// Full ellipse inscribed in the given bounding box
    pub fn ellipse(x: i16, y: i16, width: u16, height: u16) -> Self {
        Arc {
            x,
            y,
            width,
            height,
            angle1: 0,
            angle2: 360 * 64,
        }
    }
}

/// RGB triple with 16 bits per channel, as used by color and cursor requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        red: 0,
        green: 0,
        blue: 0,
    };
    pub const WHITE: Rgb = Rgb {
        red: 0xFFFF,
        green: 0xFFFF,
        blue: 0xFFFF,
    };

    pub fn new(red: u16, green: u16, blue: u16) -> Self {
        Rgb { red, green, blue }
    }

    /// Scale 8-bit channels to the protocol's 16-bit range
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Rgb {
            red: red as u16 * 257,
            green: green as u16 * 257,
            blue: blue as u16 * 257,
        }
    }

    /// Packed 0xRRGGBB value for a 24-bit TrueColor visual
    pub fn to_pixel24(&self) -> u32 {
        ((self.red as u32 >> 8) << 16) | ((self.green as u32 >> 8) << 8) | (self.blue as u32 >> 8)
    }
}

/// Window class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    CopyFromParent = 0,
    InputOutput = 1,
    InputOnly = 2,
}

/// Stack mode for ConfigureWindow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMode {
    Above = 0,
    Below = 1,
    TopIf = 2,
    BottomIf = 3,
    Opposite = 4,
}

/// Coordinate mode for PolyPoint / PolyLine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordMode {
    Origin = 0,
    Previous = 1,
}

/// Property change mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropMode {
    Replace = 0,
    Prepend = 1,
    Append = 2,
}

/// Pointer/keyboard grab mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    Sync = 0,
    Async = 1,
}

/// Event masks
pub mod event_mask {
    pub const NO_EVENT: u32 = 0;
    pub const KEY_PRESS: u32 = 1 << 0;
    pub const KEY_RELEASE: u32 = 1 << 1;
    pub const BUTTON_PRESS: u32 = 1 << 2;
    pub const BUTTON_RELEASE: u32 = 1 << 3;
    pub const ENTER_WINDOW: u32 = 1 << 4;
    pub const LEAVE_WINDOW: u32 = 1 << 5;
    pub const POINTER_MOTION: u32 = 1 << 6;
    pub const BUTTON_MOTION: u32 = 1 << 13;
    pub const EXPOSURE: u32 = 1 << 15;
    pub const VISIBILITY_CHANGE: u32 = 1 << 16;
    pub const STRUCTURE_NOTIFY: u32 = 1 << 17;
    pub const FOCUS_CHANGE: u32 = 1 << 21;
    pub const PROPERTY_CHANGE: u32 = 1 << 22;
}

/// Keyboard/pointer modifier masks
pub mod modifier_mask {
    pub const SHIFT: u16 = 1 << 0;
    pub const LOCK: u16 = 1 << 1;
    pub const CONTROL: u16 = 1 << 2;
    pub const MOD1: u16 = 1 << 3;
    pub const BUTTON1: u16 = 1 << 8;
    pub const BUTTON2: u16 = 1 << 9;
    pub const BUTTON3: u16 = 1 << 10;
}

/// GC function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GCFunction {
    Clear = 0,
    And = 1,
    Copy = 3,
    NoOp = 5,
    Xor = 6,
    Or = 7,
    Invert = 10,
    Set = 15,
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid = 0,
    OnOffDash = 1,
    DoubleDash = 2,
}

/// Cap style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapStyle {
    NotLast = 0,
    Butt = 1,
    Round = 2,
    Projecting = 3,
}

/// Join style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

/// Fill style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStyle {
    Solid = 0,
    Tiled = 1,
    Stippled = 2,
    OpaqueStippled = 3,
}

/// Byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LSBFirst = 0,
    MSBFirst = 1,
}

impl ByteOrder {
    /// Byte sent as the first octet of the setup request
    pub fn setup_byte(&self) -> u8 {
        match self {
            ByteOrder::LSBFirst => b'l',
            ByteOrder::MSBFirst => b'B',
        }
    }
}
