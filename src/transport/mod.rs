//! Transport layer
//!
//! A transport owns the byte stream to the server. It hands out resource
//! ids, numbers and queues outgoing requests, and separates incoming
//! packets into replies (matched to the request that asked for them) and
//! 32-byte event records.
//!
//! Two implementations are provided:
//! - `SocketTransport`: a real client connection over a Unix or TCP socket
//! - `NullTransport`: records requests and answers round trips with canned
//!   replies, for tests and headless runs

pub mod display;
pub mod null;
pub mod socket;

pub use display::{AuthEntry, DisplayName};
pub use null::{NullControl, NullTransport};
pub use socket::SocketTransport;

use crate::error::Result;
use crate::protocol::{Request, ResourceId, SetupSuccess, RECORD_SIZE};

/// One event or error record exactly as read from the wire
pub type RawEvent = [u8; RECORD_SIZE];

/// Handle to a sent request, used to collect its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cookie {
    sequence: u64,
}

impl Cookie {
    pub fn new(sequence: u64) -> Self {
        Cookie { sequence }
    }

    /// Full request count since connect
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Sequence number as it appears in replies and events
    pub fn wire_sequence(&self) -> u16 {
        self.sequence as u16
    }
}

/// Interface the connection needs from a transport
pub trait Transport {
    /// Setup data the server sent when the connection was opened
    fn setup(&self) -> &SetupSuccess;

    /// Allocate a fresh resource id from the client's range
    fn generate_id(&mut self) -> Result<ResourceId>;

    /// Queue a request; does not wait for the server
    fn send(&mut self, request: &Request) -> Result<Cookie>;

    /// Write out everything queued so far
    fn flush(&mut self) -> Result<()>;

    /// Block until the reply (or error) for `cookie` arrives
    fn wait_for_reply(&mut self, cookie: Cookie) -> Result<Vec<u8>>;

    /// Block for the next event; `None` once the server closed the stream
    fn wait_for_event(&mut self) -> Result<Option<RawEvent>>;

    /// Next queued event without blocking; `None` when nothing is pending
    fn poll_for_event(&mut self) -> Result<Option<RawEvent>>;

    /// Whether the connection failed or was shut down by the server
    fn has_error(&self) -> bool;

    /// Close the stream; further calls fail with `ConnectionLost`
    fn disconnect(&mut self);

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Resource id generator over the base/mask pair from the setup reply
#[derive(Debug, Clone)]
pub struct IdAllocator {
    base: u32,
    mask: u32,
    inc: u32,
    last: u32,
}

impl IdAllocator {
    pub fn new(base: u32, mask: u32) -> Self {
        IdAllocator {
            base,
            mask,
            // Lowest set bit of the mask
            inc: mask & mask.wrapping_neg(),
            last: 0,
        }
    }

    pub fn next_id(&mut self) -> Option<ResourceId> {
        if self.inc == 0 {
            return None;
        }
        let next = self.last.checked_add(self.inc)?;
        if next > self.mask {
            return None;
        }
        self.last = next;
        Some(ResourceId::new(self.base | next))
    }
}
