//! Attribute value lists
//!
//! Several requests (CreateWindow, ChangeWindowAttributes, CreateGC,
//! ChangeGC, ConfigureWindow) carry optional fields as a bitmask followed by
//! one 32-bit value per set bit, in ascending bit order. Callers describe
//! those fields symbolically with an [`AttributeList`]; [`AttributeList::build`]
//! resolves colors against the screen and produces the wire [`ValueList`].
//!
//! ```ignore
//! let attrs = WindowAttributes::new()
//!     .set(WindowAttr::BackgroundPixel, Color::White)
//!     .set(WindowAttr::EventMask, vec![EventInterest::Exposure, EventInterest::KeyPress]);
//! let list = attrs.build(conn.screen_info());
//! assert_eq!(list.mask, 0x802);
//! ```

use crate::connection::ScreenInfo;
use crate::protocol::*;
use crate::resources::ResourceRef;
use std::collections::BTreeMap;
use std::fmt;

/// A closed set of value-list fields with fixed bit positions
pub trait AttributeKey: Copy + Eq + fmt::Debug + 'static {
    /// Every key of the set, in bit order
    const ALL: &'static [Self];

    fn bit(self) -> u32;

    /// Symbolic name used in configuration (`"background"`, `"event-mask"`)
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }

    fn mask(self) -> u32 {
        1 << self.bit()
    }
}

/// Window attribute fields (CreateWindow / ChangeWindowAttributes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowAttr {
    BackgroundPixmap,
    BackgroundPixel,
    BorderPixel,
    BitGravity,
    WinGravity,
    OverrideRedirect,
    SaveUnder,
    EventMask,
    DoNotPropagateMask,
    Colormap,
    Cursor,
}

impl AttributeKey for WindowAttr {
    const ALL: &'static [Self] = &[
        WindowAttr::BackgroundPixmap,
        WindowAttr::BackgroundPixel,
        WindowAttr::BorderPixel,
        WindowAttr::BitGravity,
        WindowAttr::WinGravity,
        WindowAttr::OverrideRedirect,
        WindowAttr::SaveUnder,
        WindowAttr::EventMask,
        WindowAttr::DoNotPropagateMask,
        WindowAttr::Colormap,
        WindowAttr::Cursor,
    ];

    fn bit(self) -> u32 {
        match self {
            WindowAttr::BackgroundPixmap => 0,
            WindowAttr::BackgroundPixel => 1,
            WindowAttr::BorderPixel => 3,
            WindowAttr::BitGravity => 4,
            WindowAttr::WinGravity => 5,
            WindowAttr::OverrideRedirect => 9,
            WindowAttr::SaveUnder => 10,
            WindowAttr::EventMask => 11,
            WindowAttr::DoNotPropagateMask => 12,
            WindowAttr::Colormap => 13,
            WindowAttr::Cursor => 14,
        }
    }

    fn name(self) -> &'static str {
        match self {
            WindowAttr::BackgroundPixmap => "background-pixmap",
            WindowAttr::BackgroundPixel => "background",
            WindowAttr::BorderPixel => "border",
            WindowAttr::BitGravity => "bit-gravity",
            WindowAttr::WinGravity => "win-gravity",
            WindowAttr::OverrideRedirect => "override-redirect",
            WindowAttr::SaveUnder => "save-under",
            WindowAttr::EventMask => "event-mask",
            WindowAttr::DoNotPropagateMask => "do-not-propagate-mask",
            WindowAttr::Colormap => "colormap",
            WindowAttr::Cursor => "cursor",
        }
    }
}

/// Graphics context fields (CreateGC / ChangeGC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcAttr {
    Function,
    PlaneMask,
    Foreground,
    Background,
    LineWidth,
    LineStyle,
    CapStyle,
    JoinStyle,
    FillStyle,
    Font,
    GraphicsExposures,
}

impl AttributeKey for GcAttr {
    const ALL: &'static [Self] = &[
        GcAttr::Function,
        GcAttr::PlaneMask,
        GcAttr::Foreground,
        GcAttr::Background,
        GcAttr::LineWidth,
        GcAttr::LineStyle,
        GcAttr::CapStyle,
        GcAttr::JoinStyle,
        GcAttr::FillStyle,
        GcAttr::Font,
        GcAttr::GraphicsExposures,
    ];

    fn bit(self) -> u32 {
        match self {
            GcAttr::Function => 0,
            GcAttr::PlaneMask => 1,
            GcAttr::Foreground => 2,
            GcAttr::Background => 3,
            GcAttr::LineWidth => 4,
            GcAttr::LineStyle => 5,
            GcAttr::CapStyle => 6,
            GcAttr::JoinStyle => 7,
            GcAttr::FillStyle => 8,
            GcAttr::Font => 14,
            GcAttr::GraphicsExposures => 16,
        }
    }

    fn name(self) -> &'static str {
        match self {
            GcAttr::Function => "function",
            GcAttr::PlaneMask => "plane-mask",
            GcAttr::Foreground => "foreground",
            GcAttr::Background => "background",
            GcAttr::LineWidth => "line-width",
            GcAttr::LineStyle => "line-style",
            GcAttr::CapStyle => "cap-style",
            GcAttr::JoinStyle => "join-style",
            GcAttr::FillStyle => "fill-style",
            GcAttr::Font => "font",
            GcAttr::GraphicsExposures => "graphics-exposures",
        }
    }
}

/// ConfigureWindow fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigAttr {
    X,
    Y,
    Width,
    Height,
    BorderWidth,
    Sibling,
    StackMode,
}

impl AttributeKey for ConfigAttr {
    const ALL: &'static [Self] = &[
        ConfigAttr::X,
        ConfigAttr::Y,
        ConfigAttr::Width,
        ConfigAttr::Height,
        ConfigAttr::BorderWidth,
        ConfigAttr::Sibling,
        ConfigAttr::StackMode,
    ];

    fn bit(self) -> u32 {
        match self {
            ConfigAttr::X => 0,
            ConfigAttr::Y => 1,
            ConfigAttr::Width => 2,
            ConfigAttr::Height => 3,
            ConfigAttr::BorderWidth => 4,
            ConfigAttr::Sibling => 5,
            ConfigAttr::StackMode => 6,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigAttr::X => "x",
            ConfigAttr::Y => "y",
            ConfigAttr::Width => "width",
            ConfigAttr::Height => "height",
            ConfigAttr::BorderWidth => "border-width",
            ConfigAttr::Sibling => "sibling",
            ConfigAttr::StackMode => "stack-mode",
        }
    }
}

/// Symbolic color, resolved to a pixel when the list is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
    Red,
    Green,
    Blue,
    Pixel(u32),
}

impl Color {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            _ => None,
        }
    }

    pub fn pixel(self, screen: &ScreenInfo) -> u32 {
        match self {
            Color::White => screen.white_pixel,
            Color::Black => screen.black_pixel,
            Color::Red => 0xFF0000,
            Color::Green => 0x00FF00,
            Color::Blue => 0x0000FF,
            Color::Pixel(pixel) => pixel,
        }
    }
}

/// Event categories a window can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventInterest {
    KeyPress,
    KeyRelease,
    ButtonPress,
    ButtonRelease,
    EnterWindow,
    LeaveWindow,
    PointerMotion,
    ButtonMotion,
    Exposure,
    VisibilityChange,
    StructureNotify,
    FocusChange,
    PropertyChange,
}

impl EventInterest {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "key-press" => EventInterest::KeyPress,
            "key-release" => EventInterest::KeyRelease,
            "button-press" => EventInterest::ButtonPress,
            "button-release" => EventInterest::ButtonRelease,
            "enter-window" => EventInterest::EnterWindow,
            "leave-window" => EventInterest::LeaveWindow,
            "pointer-motion" => EventInterest::PointerMotion,
            "button-motion" => EventInterest::ButtonMotion,
            "exposure" => EventInterest::Exposure,
            "visibility-change" => EventInterest::VisibilityChange,
            "structure-notify" => EventInterest::StructureNotify,
            "focus-change" => EventInterest::FocusChange,
            "property-change" => EventInterest::PropertyChange,
            _ => return None,
        })
    }

    pub fn mask(self) -> u32 {
        match self {
            EventInterest::KeyPress => event_mask::KEY_PRESS,
            EventInterest::KeyRelease => event_mask::KEY_RELEASE,
            EventInterest::ButtonPress => event_mask::BUTTON_PRESS,
            EventInterest::ButtonRelease => event_mask::BUTTON_RELEASE,
            EventInterest::EnterWindow => event_mask::ENTER_WINDOW,
            EventInterest::LeaveWindow => event_mask::LEAVE_WINDOW,
            EventInterest::PointerMotion => event_mask::POINTER_MOTION,
            EventInterest::ButtonMotion => event_mask::BUTTON_MOTION,
            EventInterest::Exposure => event_mask::EXPOSURE,
            EventInterest::VisibilityChange => event_mask::VISIBILITY_CHANGE,
            EventInterest::StructureNotify => event_mask::STRUCTURE_NOTIFY,
            EventInterest::FocusChange => event_mask::FOCUS_CHANGE,
            EventInterest::PropertyChange => event_mask::PROPERTY_CHANGE,
        }
    }

    pub fn combine(interests: &[EventInterest]) -> u32 {
        interests.iter().fold(0, |mask, interest| mask | interest.mask())
    }
}

/// One attribute value before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Color(Color),
    Resource(ResourceRef),
    Events(Vec<EventInterest>),
    Card(u32),
    /// Signed values are sign-extended to 32 bits
    Int(i32),
    Bool(bool),
}

impl AttrValue {
    /// Event list from symbolic names; unknown names contribute nothing
    pub fn from_event_names(names: &[&str]) -> Self {
        let events = names
            .iter()
            .filter_map(|name| {
                let interest = EventInterest::from_name(name);
                if interest.is_none() {
                    log::warn!("Ignoring unknown event name {:?}", name);
                }
                interest
            })
            .collect();
        AttrValue::Events(events)
    }

    pub fn resolve(&self, screen: &ScreenInfo) -> u32 {
        match self {
            AttrValue::Color(color) => color.pixel(screen),
            AttrValue::Resource(resource) => resource.id().get(),
            AttrValue::Events(events) => EventInterest::combine(events),
            AttrValue::Card(value) => *value,
            AttrValue::Int(value) => *value as u32,
            AttrValue::Bool(value) => *value as u32,
        }
    }
}

impl From<Color> for AttrValue {
    fn from(color: Color) -> Self {
        AttrValue::Color(color)
    }
}

impl From<ResourceRef> for AttrValue {
    fn from(resource: ResourceRef) -> Self {
        AttrValue::Resource(resource)
    }
}

impl From<Vec<EventInterest>> for AttrValue {
    fn from(events: Vec<EventInterest>) -> Self {
        AttrValue::Events(events)
    }
}

impl From<&[EventInterest]> for AttrValue {
    fn from(events: &[EventInterest]) -> Self {
        AttrValue::Events(events.to_vec())
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Card(value)
    }
}

impl From<u16> for AttrValue {
    fn from(value: u16) -> Self {
        AttrValue::Card(value.into())
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i16> for AttrValue {
    fn from(value: i16) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<GCFunction> for AttrValue {
    fn from(value: GCFunction) -> Self {
        AttrValue::Card(value as u32)
    }
}

impl From<LineStyle> for AttrValue {
    fn from(value: LineStyle) -> Self {
        AttrValue::Card(value as u32)
    }
}

impl From<CapStyle> for AttrValue {
    fn from(value: CapStyle) -> Self {
        AttrValue::Card(value as u32)
    }
}

impl From<JoinStyle> for AttrValue {
    fn from(value: JoinStyle) -> Self {
        AttrValue::Card(value as u32)
    }
}

impl From<FillStyle> for AttrValue {
    fn from(value: FillStyle) -> Self {
        AttrValue::Card(value as u32)
    }
}

impl From<StackMode> for AttrValue {
    fn from(value: StackMode) -> Self {
        AttrValue::Card(value as u32)
    }
}

/// Symbolic attribute set over one key family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeList<K: AttributeKey> {
    // Keyed by bit number so iteration is already in wire order
    entries: BTreeMap<u32, (K, AttrValue)>,
}

pub type WindowAttributes = AttributeList<WindowAttr>;
pub type GcAttributes = AttributeList<GcAttr>;
pub type WindowChanges = AttributeList<ConfigAttr>;

impl<K: AttributeKey> Default for AttributeList<K> {
    fn default() -> Self {
        AttributeList {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: AttributeKey> AttributeList<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any earlier value
    pub fn set(mut self, key: K, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: K, value: impl Into<AttrValue>) {
        self.entries.insert(key.bit(), (key, value.into()));
    }

    /// Set a key given by its symbolic name; unknown names are logged and
    /// ignored
    pub fn set_named(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        match K::from_name(name) {
            Some(key) => self.insert(key, value),
            None => log::warn!("Ignoring unsupported attribute {:?}", name),
        }
        self
    }

    pub fn get(&self, key: K) -> Option<&AttrValue> {
        self.entries.get(&key.bit()).map(|(_, value)| value)
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key.bit())
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.values().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every value and produce the wire form
    pub fn build(&self, screen: &ScreenInfo) -> ValueList {
        let mut list = ValueList::empty();
        for (bit, (_, value)) in &self.entries {
            list.mask |= 1 << bit;
            list.values.push(value.resolve(screen));
        }
        list
    }
}
