//! Event dispatch loops
//!
//! An [`EventDispatcher`] pulls decoded events from an [`EventSource`],
//! filters them by [`Scope`] and hands each one to a handler until the
//! handler returns [`Flow::Stop`] or the stream ends.

use crate::error::Result;
use crate::protocol::{Event, ResourceId};

/// Where events come from
pub trait EventSource {
    /// Block for the next event; `None` when the stream has ended
    fn next_event(&self) -> Result<Option<Event>>;

    /// Next event if one is already queued
    fn next_pending(&self) -> Result<Option<Event>>;

    /// Whether `window` is a live window created through this source
    fn owns_window(&self, window: ResourceId) -> bool;
}

/// Which events a dispatcher delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything, including events and errors that name no window
    All,
    /// Events targeting any live window of the connection
    Owned,
    /// Events targeting one live window
    Window(ResourceId),
}

/// Handler verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct EventDispatcher<'a, S: EventSource + ?Sized> {
    source: &'a S,
    scope: Scope,
}

impl<'a, S: EventSource + ?Sized> EventDispatcher<'a, S> {
    pub fn new(source: &'a S, scope: Scope) -> Self {
        EventDispatcher { source, scope }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether `event` falls inside this dispatcher's scope
    pub fn accepts(&self, event: &Event) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Owned => event
                .window()
                .map_or(false, |window| self.source.owns_window(window)),
            Scope::Window(id) => event.window() == Some(id) && self.source.owns_window(id),
        }
    }

    // A window-scoped loop has nothing left to wait for once its window is gone
    fn target_gone(&self) -> bool {
        match self.scope {
            Scope::Window(id) => !self.source.owns_window(id),
            _ => false,
        }
    }

    /// Block on events until the handler stops or the stream ends
    ///
    /// Returns how many events were handed to the handler.
    pub fn run<F>(&self, mut handler: F) -> Result<usize>
    where
        F: FnMut(&Event) -> Flow,
    {
        let mut dispatched = 0;
        while !self.target_gone() {
            let Some(event) = self.source.next_event()? else {
                log::debug!("Event stream ended after {} events", dispatched);
                break;
            };
            if !self.accepts(&event) {
                continue;
            }
            dispatched += 1;
            if handler(&event) == Flow::Stop {
                break;
            }
        }
        Ok(dispatched)
    }

    /// Handle everything already queued, without blocking
    pub fn dispatch_pending<F>(&self, mut handler: F) -> Result<Flow>
    where
        F: FnMut(&Event) -> Flow,
    {
        while let Some(event) = self.source.next_pending()? {
            if self.accepts(&event) && handler(&event) == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RECORD_SIZE;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Script {
        events: RefCell<VecDeque<Event>>,
        windows: Vec<ResourceId>,
    }

    impl Script {
        fn new(windows: &[u32], events: Vec<Event>) -> Self {
            Script {
                events: RefCell::new(events.into()),
                windows: windows.iter().map(|id| ResourceId::new(*id)).collect(),
            }
        }
    }

    impl EventSource for Script {
        fn next_event(&self) -> Result<Option<Event>> {
            Ok(self.events.borrow_mut().pop_front())
        }

        fn next_pending(&self) -> Result<Option<Event>> {
            Ok(self.events.borrow_mut().pop_front())
        }

        fn owns_window(&self, window: ResourceId) -> bool {
            self.windows.contains(&window)
        }
    }

    fn expose(window: u32) -> Event {
        let mut raw = [0u8; RECORD_SIZE];
        raw[0] = 12;
        raw[4..8].copy_from_slice(&window.to_le_bytes());
        Event::decode(&raw).unwrap()
    }

    fn error_event() -> Event {
        let mut raw = [0u8; RECORD_SIZE];
        raw[1] = 3;
        Event::decode(&raw).unwrap()
    }

    #[test]
    fn test_window_scope_filters() {
        let script = Script::new(&[0x10, 0x20], vec![expose(0x10), expose(0x20), expose(0x10)]);
        let mut seen = Vec::new();
        let count = EventDispatcher::new(&script, Scope::Window(ResourceId::new(0x10)))
            .run(|event| {
                seen.push(event.window());
                Flow::Continue
            })
            .unwrap();
        assert_eq!(count, 2);
        assert!(seen.iter().all(|w| *w == Some(ResourceId::new(0x10))));
    }

    #[test]
    fn test_owned_scope_skips_foreign_and_windowless() {
        let script = Script::new(&[0x10], vec![expose(0x99), error_event(), expose(0x10)]);
        let count = EventDispatcher::new(&script, Scope::Owned)
            .run(|_| Flow::Continue)
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_all_scope_includes_errors() {
        let script = Script::new(&[], vec![expose(0x99), error_event()]);
        let count = EventDispatcher::new(&script, Scope::All)
            .run(|_| Flow::Continue)
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_stop_ends_run() {
        let script = Script::new(&[0x10], vec![expose(0x10), expose(0x10), expose(0x10)]);
        let count = EventDispatcher::new(&script, Scope::All)
            .run(|_| Flow::Stop)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(script.events.borrow().len(), 2);
    }

    #[test]
    fn test_window_scope_without_live_window() {
        let script = Script::new(&[], vec![expose(0x10)]);
        let count = EventDispatcher::new(&script, Scope::Window(ResourceId::new(0x10)))
            .run(|_| Flow::Continue)
            .unwrap();
        assert_eq!(count, 0);
        // Nothing was read
        assert_eq!(script.events.borrow().len(), 1);
    }

    #[test]
    fn test_dispatch_pending() {
        let script = Script::new(&[0x10], vec![expose(0x10), expose(0x10)]);
        let dispatcher = EventDispatcher::new(&script, Scope::Owned);
        let mut calls = 0;
        let flow = dispatcher
            .dispatch_pending(|_| {
                calls += 1;
                Flow::Continue
            })
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(calls, 2);

        let flow = dispatcher.dispatch_pending(|_| Flow::Stop).unwrap();
        assert_eq!(flow, Flow::Continue);
    }
}
