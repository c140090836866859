//! Connection layer
//!
//! A [`Connection`] owns one transport, the screen snapshot taken at connect
//! time and the registry of every resource created through it. Handles keep
//! only a weak link back, so dropping the connection never waits on them:
//! closing releases whatever is still live, newest first, and then
//! disconnects the transport.

pub mod screen;

pub use screen::ScreenInfo;

use crate::attributes::Color;
use crate::dispatch::{EventDispatcher, EventSource, Scope};
use crate::error::{Error, Result};
use crate::protocol::*;
use crate::resources::{
    Colormap, Cursor, CursorShape, Font, GcOptions, GraphicsContext, Pixmap, ReleaseFailure,
    ResourceRef, ResourceRegistry, ResourceSlot, Window, WindowOptions,
};
use crate::transport::{Cookie, RawEvent, SocketTransport, Transport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Outcome of closing a connection
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Resources freed during teardown, in the order they were freed
    pub released: Vec<ResourceRef>,
    pub failures: Vec<ReleaseFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Connection state shared with the handles
pub(crate) struct Shared {
    transport: RefCell<Box<dyn Transport>>,
    registry: RefCell<ResourceRegistry>,
    screen: ScreenInfo,
    closed: Cell<bool>,
}

impl Shared {
    pub(crate) fn screen(&self) -> &ScreenInfo {
        &self.screen
    }

    fn is_lost(&self) -> bool {
        self.closed.get() || self.transport.borrow().has_error()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_lost() {
            return Err(Error::ConnectionLost);
        }
        Ok(())
    }

    pub(crate) fn generate_id(&self) -> Result<ResourceId> {
        self.ensure_open()?;
        self.transport.borrow_mut().generate_id()
    }

    pub(crate) fn send(&self, request: &Request) -> Result<Cookie> {
        self.ensure_open()?;
        log::debug!("Sending {:?}", request.opcode());
        self.transport.borrow_mut().send(request).map_err(lost_on_io)
    }

    /// Send a request and block for its reply
    pub(crate) fn round_trip(&self, request: &Request) -> Result<Vec<u8>> {
        let cookie = self.send(request)?;
        self.transport
            .borrow_mut()
            .wait_for_reply(cookie)
            .map_err(lost_on_io)
    }

    pub(crate) fn register(&self, slot: Rc<ResourceSlot>) {
        self.registry.borrow_mut().register(slot);
    }

    /// Free one resource ahead of teardown
    pub(crate) fn release_slot(&self, slot: &ResourceSlot) -> Result<()> {
        if !slot.mark_released() {
            return Ok(());
        }
        self.registry.borrow_mut().deregister(slot.id());
        if self.is_lost() {
            // The server reclaims everything of a dead client
            log::debug!("Marking {} {} released on lost connection", slot.kind(), slot.id());
            return Ok(());
        }
        log::debug!("Releasing {} {}", slot.kind(), slot.id());
        self.transport
            .borrow_mut()
            .send(&slot.kind().free_request(slot.id()))
            .map(|_| ())
            .map_err(lost_on_io)
    }

    fn flush(&self) -> Result<()> {
        self.ensure_open()?;
        self.transport.borrow_mut().flush().map_err(lost_on_io)
    }

    fn decode(&self, raw: Option<RawEvent>) -> Result<Option<Event>> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let event = Event::decode(&raw)?;
        match &event {
            Event::Error(err) => log::warn!("{}", err),
            other => log::trace!("Received {:?}", other),
        }
        Ok(Some(event))
    }

    fn wait_for_event(&self) -> Result<Option<Event>> {
        if self.closed.get() {
            return Err(Error::ConnectionLost);
        }
        if !self.transport.borrow().has_error() {
            self.flush()?;
        }
        let raw = self.transport.borrow_mut().wait_for_event().map_err(lost_on_io)?;
        self.decode(raw)
    }

    fn poll_for_event(&self) -> Result<Option<Event>> {
        if self.closed.get() {
            return Err(Error::ConnectionLost);
        }
        if !self.transport.borrow().has_error() {
            self.flush()?;
        }
        let raw = self.transport.borrow_mut().poll_for_event().map_err(lost_on_io)?;
        self.decode(raw)
    }

    fn close(&self) -> TeardownReport {
        if self.closed.get() {
            return TeardownReport::default();
        }

        // Take the ledger out so handle releases cannot re-enter it
        let mut registry = std::mem::take(&mut *self.registry.borrow_mut());
        let lost = self.transport.borrow().has_error();
        let mut released = Vec::new();
        let failures = registry.release_all(|slot| {
            released.push(slot.resource_ref());
            if lost {
                return Ok(());
            }
            self.transport
                .borrow_mut()
                .send(&slot.kind().free_request(slot.id()))
                .map(|_| ())
        });

        let mut transport = self.transport.borrow_mut();
        if !lost {
            if let Err(e) = transport.flush() {
                log::warn!("Flush during close failed: {}", e);
            }
        }
        transport.disconnect();
        self.closed.set(true);

        log::info!(
            "Closed connection to {} ({} resources released, {} failures)",
            transport.describe(),
            released.len(),
            failures.len()
        );
        for failure in &failures {
            log::warn!(
                "Failed to release {} {}: {}",
                failure.kind,
                failure.id,
                failure.error
            );
        }
        TeardownReport { released, failures }
    }
}

// A dead socket is reported the same way whichever call noticed it
fn lost_on_io(err: Error) -> Error {
    match err {
        Error::Io(e) => {
            log::warn!("Transport failed: {}", e);
            Error::ConnectionLost
        }
        other => other,
    }
}

impl EventSource for Shared {
    fn next_event(&self) -> Result<Option<Event>> {
        self.wait_for_event()
    }

    fn next_pending(&self) -> Result<Option<Event>> {
        self.poll_for_event()
    }

    fn owns_window(&self, window: ResourceId) -> bool {
        self.registry.borrow().is_live_window(window)
    }
}

/// A client connection to one screen of an X server
pub struct Connection {
    shared: Rc<Shared>,
}

impl Connection {
    /// Connect to `display` (or `$DISPLAY`); `screen` defaults to the one
    /// named in the display string
    pub fn connect(display: Option<&str>, screen: Option<usize>) -> Result<Self> {
        let transport = SocketTransport::connect(display)?;
        let screen = screen.unwrap_or(usize::from(transport.display().screen));
        Self::with_transport(transport, screen)
    }

    /// Wrap an already established transport
    pub fn with_transport<T: Transport + 'static>(transport: T, screen_number: usize) -> Result<Self> {
        let setup = transport.setup();
        let screen = setup.roots.get(screen_number).ok_or_else(|| {
            Error::ConnectFailed(format!(
                "Screen {} not available (server has {})",
                screen_number,
                setup.roots.len()
            ))
        })?;
        let screen = ScreenInfo::from_screen(screen_number, screen);

        log::info!(
            "Connected to {}, screen {}: {}x{} depth {}",
            transport.describe(),
            screen_number,
            screen.width,
            screen.height,
            screen.root_depth
        );

        Ok(Connection {
            shared: Rc::new(Shared {
                transport: RefCell::new(Box::new(transport)),
                registry: RefCell::new(ResourceRegistry::new()),
                screen,
                closed: Cell::new(false),
            }),
        })
    }

    /// Run `f` with a fresh connection that is always closed afterwards
    pub fn with_connection<T, F>(display: Option<&str>, screen: Option<usize>, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = Connection::connect(display, screen)?;
        let result = f(&conn);
        conn.close();
        result
    }

    pub(crate) fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }

    pub fn screen_info(&self) -> &ScreenInfo {
        self.shared.screen()
    }

    pub fn root(&self) -> ResourceId {
        self.shared.screen().root
    }

    /// Allocate an id without creating anything with it
    pub fn new_resource_id(&self) -> Result<ResourceId> {
        self.shared.generate_id()
    }

    pub fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    /// Block for the next event; `None` once the server ended the stream
    pub fn wait_for_event(&self) -> Result<Option<Event>> {
        self.shared.wait_for_event()
    }

    /// Next queued event, without blocking
    pub fn poll_for_event(&self) -> Result<Option<Event>> {
        self.shared.poll_for_event()
    }

    /// Release every live resource, newest first, then disconnect
    ///
    /// Calling this again is a no-op returning an empty report.
    pub fn close(&self) -> TeardownReport {
        self.shared.close()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    /// Whether the transport failed or the connection was closed
    pub fn has_error(&self) -> bool {
        self.shared.is_lost()
    }

    /// Live resources in creation order
    pub fn live_resources(&self) -> Vec<ResourceRef> {
        self.shared.registry.borrow().live()
    }

    pub fn intern_atom(&self, name: &str, only_if_exists: bool) -> Result<Atom> {
        let reply = self.shared.round_trip(&Request::InternAtom {
            only_if_exists,
            name: name.to_string(),
        })?;
        Ok(InternAtomReply::decode(&reply)?.atom)
    }

    /// Pixel value for a symbolic color on this screen
    pub fn pixel(&self, color: Color) -> u32 {
        color.pixel(self.shared.screen())
    }

    pub fn create_window(&self, options: &WindowOptions) -> Result<Window> {
        Window::create(self, options)
    }

    pub fn create_gc(&self, drawable: Drawable, options: &GcOptions) -> Result<GraphicsContext> {
        GraphicsContext::create(self, drawable, options)
    }

    pub fn open_font(&self, name: &str) -> Result<Font> {
        Font::open(self, name)
    }

    pub fn create_pixmap(&self, drawable: Drawable, width: u16, height: u16) -> Result<Pixmap> {
        Pixmap::create(self, drawable, width, height, None)
    }

    pub fn create_colormap(&self, visual: VisualId) -> Result<Colormap> {
        Colormap::create(self, visual)
    }

    pub fn standard_cursor(&self, shape: CursorShape) -> Result<Cursor> {
        Cursor::standard(self, shape)
    }

    pub fn dispatcher(&self, scope: Scope) -> EventDispatcher<'_, Connection> {
        EventDispatcher::new(self, scope)
    }
}

impl EventSource for Connection {
    fn next_event(&self) -> Result<Option<Event>> {
        self.wait_for_event()
    }

    fn next_pending(&self) -> Result<Option<Event>> {
        self.poll_for_event()
    }

    fn owns_window(&self, window: ResourceId) -> bool {
        self.shared.owns_window(window)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
