//! Server-side resources owned by a connection
//!
//! Every window, graphics context, font, cursor, colormap and pixmap the
//! client creates is represented by exactly one handle and one slot in the
//! connection's [`ResourceRegistry`]. The handle frees the resource when it
//! is released or dropped; whatever is still live when the connection
//! closes is freed by the registry, newest first.

pub mod colormap;
pub mod cursor;
pub mod font;
pub mod gc;
pub mod pixmap;
pub mod window;

pub use colormap::Colormap;
pub use cursor::{Cursor, CursorShape};
pub use font::{Font, FontMetrics};
pub use gc::{GcOptions, GraphicsContext};
pub use pixmap::Pixmap;
pub use window::{Window, WindowOptions};

use crate::connection::Shared;
use crate::error::{Error, Result};
use crate::protocol::*;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// The six kinds of resource the client can own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Window,
    GraphicsContext,
    Font,
    Cursor,
    Colormap,
    Pixmap,
}

impl ResourceKind {
    /// Request that frees a resource of this kind
    pub fn free_request(self, id: ResourceId) -> Request {
        match self {
            ResourceKind::Window => Request::DestroyWindow { window: id },
            ResourceKind::GraphicsContext => Request::FreeGC { gc: id },
            ResourceKind::Font => Request::CloseFont { font: id },
            ResourceKind::Cursor => Request::FreeCursor { cursor: id },
            ResourceKind::Colormap => Request::FreeColormap { cmap: id },
            ResourceKind::Pixmap => Request::FreePixmap { pixmap: id },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Window => "Window",
            ResourceKind::GraphicsContext => "GraphicsContext",
            ResourceKind::Font => "Font",
            ResourceKind::Cursor => "Cursor",
            ResourceKind::Colormap => "Colormap",
            ResourceKind::Pixmap => "Pixmap",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a resource of any kind, as used in attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Window(ResourceId),
    GraphicsContext(ResourceId),
    Font(ResourceId),
    Cursor(ResourceId),
    Colormap(ResourceId),
    Pixmap(ResourceId),
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: ResourceId) -> Self {
        match kind {
            ResourceKind::Window => ResourceRef::Window(id),
            ResourceKind::GraphicsContext => ResourceRef::GraphicsContext(id),
            ResourceKind::Font => ResourceRef::Font(id),
            ResourceKind::Cursor => ResourceRef::Cursor(id),
            ResourceKind::Colormap => ResourceRef::Colormap(id),
            ResourceKind::Pixmap => ResourceRef::Pixmap(id),
        }
    }

    pub fn id(&self) -> ResourceId {
        match self {
            ResourceRef::Window(id)
            | ResourceRef::GraphicsContext(id)
            | ResourceRef::Font(id)
            | ResourceRef::Cursor(id)
            | ResourceRef::Colormap(id)
            | ResourceRef::Pixmap(id) => *id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Window(_) => ResourceKind::Window,
            ResourceRef::GraphicsContext(_) => ResourceKind::GraphicsContext,
            ResourceRef::Font(_) => ResourceKind::Font,
            ResourceRef::Cursor(_) => ResourceKind::Cursor,
            ResourceRef::Colormap(_) => ResourceKind::Colormap,
            ResourceRef::Pixmap(_) => ResourceKind::Pixmap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Live,
    Released,
}

/// Registry entry shared between a handle and the registry
#[derive(Debug)]
pub struct ResourceSlot {
    id: ResourceId,
    kind: ResourceKind,
    state: Cell<SlotState>,
}

impl ResourceSlot {
    pub fn new(id: ResourceId, kind: ResourceKind) -> Self {
        ResourceSlot {
            id,
            kind,
            state: Cell::new(SlotState::Live),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn state(&self) -> SlotState {
        self.state.get()
    }

    pub fn is_live(&self) -> bool {
        self.state.get() == SlotState::Live
    }

    /// Move to `Released`; returns whether the slot was live
    pub fn mark_released(&self) -> bool {
        self.state.replace(SlotState::Released) == SlotState::Live
    }

    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.id)
    }
}

/// A resource the registry could not free during teardown
#[derive(Debug)]
pub struct ReleaseFailure {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub error: Error,
}

/// Ordered ledger of the live resources of one connection
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    slots: Vec<Rc<ResourceSlot>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, slot: Rc<ResourceSlot>) {
        self.slots.push(slot);
    }

    /// Drop the slot for `id`; returns whether it was present
    pub fn deregister(&mut self, id: ResourceId) -> bool {
        match self.slots.iter().rposition(|slot| slot.id == id) {
            Some(index) => {
                self.slots.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.slots.iter().any(|slot| slot.id == id && slot.is_live())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live resources in creation order
    pub fn live(&self) -> Vec<ResourceRef> {
        self.slots
            .iter()
            .filter(|slot| slot.is_live())
            .map(|slot| slot.resource_ref())
            .collect()
    }

    pub fn is_live_window(&self, id: ResourceId) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.id == id && slot.kind == ResourceKind::Window && slot.is_live())
    }

    /// Free every live slot, newest first
    ///
    /// Each slot ends up `Released` whether or not `release` succeeded;
    /// failures are collected and the registry is left empty.
    pub fn release_all<F>(&mut self, mut release: F) -> Vec<ReleaseFailure>
    where
        F: FnMut(&ResourceSlot) -> Result<()>,
    {
        let mut failures = Vec::new();
        for slot in self.slots.iter().rev() {
            if !slot.is_live() {
                continue;
            }
            let result = release(slot);
            slot.mark_released();
            if let Err(error) = result {
                failures.push(ReleaseFailure {
                    id: slot.id,
                    kind: slot.kind,
                    error,
                });
            }
        }
        self.slots.clear();
        failures
    }
}

/// State common to every handle: its slot and a weak link to the connection
pub(crate) struct HandleCore {
    conn: Weak<Shared>,
    slot: Rc<ResourceSlot>,
}

impl HandleCore {
    /// Allocate an id, send the creating request and register the slot
    pub(crate) fn create<F>(shared: &Rc<Shared>, kind: ResourceKind, build: F) -> Result<Self>
    where
        F: FnOnce(ResourceId) -> Request,
    {
        shared.ensure_open()?;
        let id = shared.generate_id()?;
        shared.send(&build(id))?;
        let slot = Rc::new(ResourceSlot::new(id, kind));
        shared.register(Rc::clone(&slot));
        log::debug!("Created {} {}", kind, id);
        Ok(HandleCore {
            conn: Rc::downgrade(shared),
            slot,
        })
    }

    pub(crate) fn id(&self) -> ResourceId {
        self.slot.id
    }

    pub(crate) fn is_released(&self) -> bool {
        !self.slot.is_live()
    }

    pub(crate) fn resource_ref(&self) -> ResourceRef {
        self.slot.resource_ref()
    }

    /// The owning connection, if this handle and the connection are usable
    pub(crate) fn conn(&self) -> Result<Rc<Shared>> {
        let shared = self.conn.upgrade().ok_or(Error::ConnectionLost)?;
        shared.ensure_open()?;
        if self.is_released() {
            return Err(Error::Released {
                kind: self.slot.kind,
                id: self.slot.id,
            });
        }
        Ok(shared)
    }

    /// Send one request on behalf of this handle
    pub(crate) fn send(&self, request: &Request) -> Result<()> {
        self.conn()?.send(request).map(|_| ())
    }

    pub(crate) fn release(&self) -> Result<()> {
        if !self.slot.is_live() {
            return Ok(());
        }
        match self.conn.upgrade() {
            Some(shared) => shared.release_slot(&self.slot),
            None => {
                self.slot.mark_released();
                Ok(())
            }
        }
    }
}

impl Drop for HandleCore {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release {} {}: {}", self.slot.kind, self.slot.id, e);
        }
    }
}

impl fmt::Debug for HandleCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleCore")
            .field("id", &self.slot.id)
            .field("kind", &self.slot.kind)
            .field("state", &self.slot.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(n: u32) -> (ResourceRegistry, Vec<Rc<ResourceSlot>>) {
        let kinds = [
            ResourceKind::Window,
            ResourceKind::GraphicsContext,
            ResourceKind::Font,
            ResourceKind::Cursor,
            ResourceKind::Colormap,
            ResourceKind::Pixmap,
        ];
        let mut registry = ResourceRegistry::new();
        let mut slots = Vec::new();
        for i in 0..n {
            let slot = Rc::new(ResourceSlot::new(
                ResourceId::new(0x100 + i),
                kinds[i as usize % kinds.len()],
            ));
            registry.register(Rc::clone(&slot));
            slots.push(slot);
        }
        (registry, slots)
    }

    #[test]
    fn test_release_all_in_reverse_order() {
        let (mut registry, slots) = registry_with(10);
        let mut order = Vec::new();
        let failures = registry.release_all(|slot| {
            order.push(slot.id().get());
            Ok(())
        });

        assert!(failures.is_empty());
        let expected: Vec<u32> = (0..10).rev().map(|i| 0x100 + i).collect();
        assert_eq!(order, expected);
        assert!(registry.is_empty());
        assert!(slots.iter().all(|slot| slot.state() == SlotState::Released));
    }

    #[test]
    fn test_release_all_skips_released_slots() {
        let (mut registry, slots) = registry_with(4);
        slots[1].mark_released();
        let mut order = Vec::new();
        registry.release_all(|slot| {
            order.push(slot.id().get());
            Ok(())
        });
        assert_eq!(order, vec![0x103, 0x102, 0x100]);
    }

    #[test]
    fn test_release_failures_are_collected() {
        let (mut registry, slots) = registry_with(3);
        let failures = registry.release_all(|slot| {
            if slot.id().get() == 0x101 {
                Err(Error::ConnectionLost)
            } else {
                Ok(())
            }
        });
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, ResourceId::new(0x101));
        assert_eq!(failures[0].kind, ResourceKind::GraphicsContext);
        // Failed slots still end up released
        assert!(!slots[1].is_live());
    }

    #[test]
    fn test_second_release_all_is_a_no_op() {
        let (mut registry, _slots) = registry_with(3);
        registry.release_all(|_| Ok(()));
        let mut calls = 0;
        registry.release_all(|_| {
            calls += 1;
            Ok(())
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_deregister_and_lookup() {
        let (mut registry, _slots) = registry_with(6);
        assert!(registry.is_live_window(ResourceId::new(0x100)));
        assert!(!registry.is_live_window(ResourceId::new(0x101)));
        assert!(registry.deregister(ResourceId::new(0x100)));
        assert!(!registry.deregister(ResourceId::new(0x100)));
        assert!(!registry.contains(ResourceId::new(0x100)));
        assert_eq!(registry.live().len(), 5);
    }

    #[test]
    fn test_mark_released_is_one_way() {
        let slot = ResourceSlot::new(ResourceId::new(1), ResourceKind::Font);
        assert!(slot.mark_released());
        assert!(!slot.mark_released());
        assert_eq!(slot.state(), SlotState::Released);
    }

    #[test]
    fn test_free_requests() {
        let id = ResourceId::new(0x42);
        assert_eq!(
            ResourceKind::GraphicsContext.free_request(id).opcode(),
            RequestOpcode::FreeGC
        );
        assert_eq!(ResourceKind::Font.free_request(id).opcode(), RequestOpcode::CloseFont);
        assert_eq!(
            ResourceKind::Window.free_request(id),
            Request::DestroyWindow { window: id }
        );
    }
}
