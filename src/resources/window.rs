//! Window handle

use super::{Cursor, GcOptions, GraphicsContext, HandleCore, ResourceKind, ResourceRef};
use crate::attributes::{
    AttrValue, Color, ConfigAttr, EventInterest, WindowAttr, WindowAttributes, WindowChanges,
};
use crate::connection::{Connection, Shared};
use crate::dispatch::{EventDispatcher, Flow, Scope};
use crate::error::Result;
use crate::protocol::*;
use std::cell::Cell;
use std::rc::Rc;

/// Parameters for [`Window::create`]
#[derive(Debug, Clone)]
pub struct WindowOptions {
    /// Parent window; the screen's root when `None`
    pub parent: Option<ResourceId>,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub class: WindowClass,
    pub background: Color,
    pub border: Option<Color>,
    pub events: Vec<EventInterest>,
    pub title: Option<String>,
    /// Further attributes sent with CreateWindow
    pub attributes: WindowAttributes,
}

impl Default for WindowOptions {
    fn default() -> Self {
        WindowOptions {
            parent: None,
            x: 0,
            y: 0,
            width: 400,
            height: 300,
            border_width: 1,
            class: WindowClass::InputOutput,
            background: Color::White,
            border: None,
            events: vec![EventInterest::Exposure, EventInterest::KeyPress],
            title: None,
            attributes: WindowAttributes::new(),
        }
    }
}

#[derive(Debug)]
pub struct Window {
    core: HandleCore,
    geometry: Cell<Rectangle>,
}

impl Window {
    pub fn create(conn: &Connection, options: &WindowOptions) -> Result<Window> {
        let shared = conn.shared();
        let screen = shared.screen();

        let mut attributes = options
            .attributes
            .clone()
            .set(WindowAttr::BackgroundPixel, options.background)
            .set(WindowAttr::EventMask, options.events.clone());
        if let Some(border) = options.border {
            attributes.insert(WindowAttr::BorderPixel, border);
        }
        let values = attributes.build(screen);
        let parent = options.parent.unwrap_or(screen.root);

        let core = HandleCore::create(shared, ResourceKind::Window, |wid| Request::CreateWindow {
            depth: 0, // CopyFromParent
            wid,
            parent,
            x: options.x,
            y: options.y,
            width: options.width,
            height: options.height,
            border_width: options.border_width,
            class: options.class,
            visual: VisualId::COPY_FROM_PARENT,
            values,
        })?;

        let window = Window {
            core,
            geometry: Cell::new(Rectangle::new(
                options.x,
                options.y,
                options.width,
                options.height,
            )),
        };
        if let Some(title) = &options.title {
            window.set_title(title)?;
        }
        Ok(window)
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    pub fn drawable(&self) -> Drawable {
        Drawable::Window(self.id())
    }

    pub fn resource_ref(&self) -> ResourceRef {
        self.core.resource_ref()
    }

    /// Last geometry requested by this client
    pub fn geometry(&self) -> Rectangle {
        self.geometry.get()
    }

    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }

    /// Destroy the window; later calls do nothing
    pub fn release(&self) -> Result<()> {
        self.core.release()
    }

    pub fn show(&self) -> Result<()> {
        self.core.send(&Request::MapWindow { window: self.id() })
    }

    pub fn hide(&self) -> Result<()> {
        self.core.send(&Request::UnmapWindow { window: self.id() })
    }

    pub fn move_to(&self, x: i16, y: i16) -> Result<()> {
        self.configure(
            &WindowChanges::new()
                .set(ConfigAttr::X, x)
                .set(ConfigAttr::Y, y),
        )
    }

    pub fn resize(&self, width: u16, height: u16) -> Result<()> {
        self.configure(
            &WindowChanges::new()
                .set(ConfigAttr::Width, width)
                .set(ConfigAttr::Height, height),
        )
    }

    pub fn raise(&self) -> Result<()> {
        self.configure(&WindowChanges::new().set(ConfigAttr::StackMode, StackMode::Above))
    }

    pub fn configure(&self, changes: &WindowChanges) -> Result<()> {
        let shared = self.core.conn()?;
        shared.send(&Request::ConfigureWindow {
            window: self.id(),
            values: changes.build(shared.screen()),
        })?;

        let mut geometry = self.geometry.get();
        let field = |key| changes.get(key).and_then(numeric);
        if let Some(x) = field(ConfigAttr::X) {
            geometry.x = x as i16;
        }
        if let Some(y) = field(ConfigAttr::Y) {
            geometry.y = y as i16;
        }
        if let Some(width) = field(ConfigAttr::Width) {
            geometry.width = width as u16;
        }
        if let Some(height) = field(ConfigAttr::Height) {
            geometry.height = height as u16;
        }
        self.geometry.set(geometry);
        Ok(())
    }

    pub fn change_attributes(&self, attributes: &WindowAttributes) -> Result<()> {
        let shared = self.core.conn()?;
        shared.send(&Request::ChangeWindowAttributes {
            window: self.id(),
            values: attributes.build(shared.screen()),
        })?;
        Ok(())
    }

    pub fn select_events(&self, events: &[EventInterest]) -> Result<()> {
        self.change_attributes(&WindowAttributes::new().set(WindowAttr::EventMask, events))
    }

    pub fn set_cursor(&self, cursor: &Cursor) -> Result<()> {
        self.change_attributes(&WindowAttributes::new().set(WindowAttr::Cursor, cursor.resource_ref()))
    }

    fn set_string_property(&self, property: Atom, data: Vec<u8>) -> Result<()> {
        self.core.send(&Request::ChangeProperty {
            mode: PropMode::Replace,
            window: self.id(),
            property,
            type_: Atom::STRING,
            format: 8,
            data,
        })
    }

    /// Set WM_NAME
    pub fn set_title(&self, title: &str) -> Result<()> {
        self.set_string_property(Atom::WM_NAME, title.as_bytes().to_vec())
    }

    /// Set WM_CLASS to the instance and class names
    pub fn set_class(&self, instance: &str, class: &str) -> Result<()> {
        let mut data = Vec::with_capacity(instance.len() + class.len() + 2);
        data.extend_from_slice(instance.as_bytes());
        data.push(0);
        data.extend_from_slice(class.as_bytes());
        data.push(0);
        self.set_string_property(Atom::WM_CLASS, data)
    }

    /// Clear the whole window to its background
    pub fn clear(&self) -> Result<()> {
        self.clear_area(Rectangle::new(0, 0, 0, 0), false)
    }

    /// Clear an area; zero width or height extends to the window edge
    pub fn clear_area(&self, area: Rectangle, exposures: bool) -> Result<()> {
        self.core.send(&Request::ClearArea {
            exposures,
            window: self.id(),
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height,
        })
    }

    pub fn create_graphics_context(&self, options: &GcOptions) -> Result<GraphicsContext> {
        GraphicsContext::create_on(&self.core.conn()?, self.drawable(), options)
    }

    pub fn query_pointer(&self) -> Result<QueryPointerReply> {
        let reply = self
            .core
            .conn()?
            .round_trip(&Request::QueryPointer { window: self.id() })?;
        Ok(QueryPointerReply::decode(&reply)?)
    }

    pub fn grab_pointer(
        &self,
        events: &[EventInterest],
        confine: bool,
        cursor: Option<&Cursor>,
    ) -> Result<GrabStatus> {
        let reply = self.core.conn()?.round_trip(&Request::GrabPointer {
            owner_events: false,
            grab_window: self.id(),
            event_mask: pointer_event_mask(EventInterest::combine(events)),
            pointer_mode: GrabMode::Async,
            keyboard_mode: GrabMode::Async,
            confine_to: if confine { self.id() } else { ResourceId::NONE },
            cursor: cursor.map_or(ResourceId::NONE, |c| c.id()),
            time: CURRENT_TIME,
        })?;
        Ok(GrabStatus::decode(&reply)?)
    }

    pub fn ungrab_pointer(&self) -> Result<()> {
        self.core.send(&Request::UngrabPointer { time: CURRENT_TIME })
    }

    pub fn grab_keyboard(&self) -> Result<GrabStatus> {
        let reply = self.core.conn()?.round_trip(&Request::GrabKeyboard {
            owner_events: false,
            grab_window: self.id(),
            time: CURRENT_TIME,
            pointer_mode: GrabMode::Async,
            keyboard_mode: GrabMode::Async,
        })?;
        Ok(GrabStatus::decode(&reply)?)
    }

    pub fn ungrab_keyboard(&self) -> Result<()> {
        self.core.send(&Request::UngrabKeyboard { time: CURRENT_TIME })
    }

    /// Run a dispatch loop over this window's events
    ///
    /// Ends when the handler returns [`Flow::Stop`], the window is
    /// released, or the event stream ends.
    pub fn event_loop<F>(&self, handler: F) -> Result<usize>
    where
        F: FnMut(&Event) -> Flow,
    {
        let shared: Rc<Shared> = self.core.conn()?;
        EventDispatcher::new(&*shared, Scope::Window(self.id())).run(handler)
    }
}

fn numeric(value: &AttrValue) -> Option<i64> {
    match value {
        AttrValue::Card(v) => Some(i64::from(*v)),
        AttrValue::Int(v) => Some(i64::from(*v)),
        _ => None,
    }
}
