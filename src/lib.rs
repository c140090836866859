//! x11kit - a resource-owning client façade for the X11 core protocol
//!
//! A [`Connection`] owns the transport and every server-side resource
//! created through it. Handles ([`Window`], [`GraphicsContext`], [`Font`],
//! [`Cursor`], [`Colormap`], [`Pixmap`]) free their resource when released
//! or dropped, and closing the connection frees whatever is left in reverse
//! creation order. Optional request fields are described with typed
//! [`attributes`] lists, and incoming records decode into [`Event`] values
//! that an [`EventDispatcher`] routes to handlers.

pub mod attributes;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod resources;
pub mod transport;

pub use attributes::{
    AttrValue, AttributeKey, AttributeList, Color, ConfigAttr, EventInterest, GcAttr,
    GcAttributes, WindowAttr, WindowAttributes, WindowChanges,
};
pub use connection::{Connection, ScreenInfo, TeardownReport};
pub use dispatch::{EventDispatcher, EventSource, Flow, Scope};
pub use error::{Error, Result};
pub use protocol::{Arc, Drawable, Event, EventKind, Point, Rectangle, ResourceId, Rgb};
pub use resources::{
    Colormap, Cursor, CursorShape, Font, FontMetrics, GcOptions, GraphicsContext, Pixmap,
    ResourceKind, ResourceRef, Window, WindowOptions,
};
pub use transport::{NullControl, NullTransport, SocketTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
