//! Null transport - headless stand-in for an X server
//!
//! Accepts every request without rendering anything. Requests are recorded
//! so tests can inspect exactly what went out, round trips are answered
//! with canned replies, and events are whatever the test pushes through the
//! paired [`NullControl`].

use super::{Cookie, IdAllocator, RawEvent, Transport};
use crate::error::{Error, Result};
use crate::protocol::*;
use byteorder::{ByteOrder as _, LittleEndian};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

const ROOT_WINDOW: u32 = 0x100;
const DEFAULT_COLORMAP: u32 = 0x20;
const ROOT_VISUAL: u32 = 0x21;
const ID_BASE: u32 = 0x0020_0000;
const ID_MASK: u32 = 0x001F_FFFF;
const FIRST_CLIENT_ATOM: u32 = 0x100;

const PREDEFINED_ATOMS: &[(&str, u32)] = &[
    ("PRIMARY", 1),
    ("SECONDARY", 2),
    ("ATOM", 4),
    ("CARDINAL", 6),
    ("STRING", 31),
    ("WINDOW", 33),
    ("WM_ICON_NAME", 37),
    ("WM_NAME", 39),
    ("WM_CLASS", 67),
];

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xFFFFFF),
    ("red", 0xFF0000),
    ("green", 0x00FF00),
    ("blue", 0x0000FF),
    ("yellow", 0xFFFF00),
    ("cyan", 0x00FFFF),
    ("magenta", 0xFF00FF),
    ("gray", 0xBEBEBE),
    ("grey", 0xBEBEBE),
];

#[derive(Default)]
struct NullState {
    requests: RefCell<Vec<Request>>,
    events: RefCell<VecDeque<RawEvent>>,
    broken: Cell<bool>,
    pointer: Cell<(i16, i16)>,
}

/// Test-side handle onto a [`NullTransport`]
///
/// Stays usable after the transport has been moved into a connection.
#[derive(Clone)]
pub struct NullControl {
    state: Rc<NullState>,
}

impl NullControl {
    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.borrow().clone()
    }

    pub fn opcodes(&self) -> Vec<RequestOpcode> {
        self.state
            .requests
            .borrow()
            .iter()
            .map(Request::opcode)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests.borrow_mut().clear();
    }

    /// Queue a raw record for the client to read
    pub fn push_event(&self, event: RawEvent) {
        self.state.events.borrow_mut().push_back(event);
    }

    /// Simulate the server going away; sends fail from now on
    pub fn break_connection(&self) {
        self.state.broken.set(true);
    }

    /// Pointer position reported by QueryPointer
    pub fn set_pointer(&self, x: i16, y: i16) {
        self.state.pointer.set((x, y));
    }
}

pub struct NullTransport {
    state: Rc<NullState>,
    setup: SetupSuccess,
    ids: IdAllocator,
    sequence: u64,
    replies: HashMap<u64, std::result::Result<Vec<u8>, ProtocolError>>,
    fonts: HashMap<ResourceId, String>,
    atoms: HashMap<String, Atom>,
    next_atom: u32,
    disconnected: bool,
}

impl NullTransport {
    pub fn new() -> Self {
        let atoms = PREDEFINED_ATOMS
            .iter()
            .map(|(name, id)| (name.to_string(), Atom::new(*id)))
            .collect();

        NullTransport {
            state: Rc::new(NullState::default()),
            setup: null_setup(),
            ids: IdAllocator::new(ID_BASE, ID_MASK),
            sequence: 0,
            replies: HashMap::new(),
            fonts: HashMap::new(),
            atoms,
            next_atom: FIRST_CLIENT_ATOM,
            disconnected: false,
        }
    }

    pub fn control(&self) -> NullControl {
        NullControl {
            state: Rc::clone(&self.state),
        }
    }

    fn answer(&mut self, request: &Request) -> Option<std::result::Result<Vec<u8>, ProtocolError>> {
        let sequence = self.sequence as u16;
        let error = |code, bad_value| {
            Err(ProtocolError::new(
                code,
                sequence,
                bad_value,
                0,
                request.opcode() as u8,
            ))
        };

        let reply = match request {
            Request::OpenFont { fid, name } => {
                self.fonts.insert(*fid, name.clone());
                return None;
            }
            Request::CloseFont { font } => {
                self.fonts.remove(font);
                return None;
            }
            Request::QueryFont { font } => match self.fonts.get(font) {
                Some(name) => Ok(font_reply(sequence, name)),
                None => error(ErrorCode::Font, font.get()),
            },
            Request::QueryPointer { .. } => {
                let (x, y) = self.state.pointer.get();
                let mut buf = reply_buffer(sequence, 0);
                buf[1] = 1;
                LittleEndian::write_u32(&mut buf[8..12], ROOT_WINDOW);
                LittleEndian::write_i16(&mut buf[16..18], x);
                LittleEndian::write_i16(&mut buf[18..20], y);
                LittleEndian::write_i16(&mut buf[20..22], x);
                LittleEndian::write_i16(&mut buf[22..24], y);
                Ok(buf)
            }
            Request::AllocColor { color, .. } => {
                let mut buf = reply_buffer(sequence, 0);
                LittleEndian::write_u16(&mut buf[8..10], color.red);
                LittleEndian::write_u16(&mut buf[10..12], color.green);
                LittleEndian::write_u16(&mut buf[12..14], color.blue);
                LittleEndian::write_u32(&mut buf[16..20], color.to_pixel24());
                Ok(buf)
            }
            Request::AllocNamedColor { name, .. } => {
                let lower = name.to_ascii_lowercase();
                match NAMED_COLORS.iter().find(|(n, _)| *n == lower) {
                    Some((_, pixel)) => {
                        let rgb = Rgb::from_rgb8((pixel >> 16) as u8, (pixel >> 8) as u8, *pixel as u8);
                        let mut buf = reply_buffer(sequence, 0);
                        LittleEndian::write_u32(&mut buf[8..12], *pixel);
                        for base in [12, 18] {
                            LittleEndian::write_u16(&mut buf[base..base + 2], rgb.red);
                            LittleEndian::write_u16(&mut buf[base + 2..base + 4], rgb.green);
                            LittleEndian::write_u16(&mut buf[base + 4..base + 6], rgb.blue);
                        }
                        Ok(buf)
                    }
                    None => error(ErrorCode::Name, 0),
                }
            }
            Request::InternAtom {
                only_if_exists,
                name,
            } => {
                let atom = match self.atoms.get(name) {
                    Some(atom) => *atom,
                    None if *only_if_exists => Atom::NONE,
                    None => {
                        let atom = Atom::new(self.next_atom);
                        self.next_atom += 1;
                        self.atoms.insert(name.clone(), atom);
                        atom
                    }
                };
                let mut buf = reply_buffer(sequence, 0);
                LittleEndian::write_u32(&mut buf[8..12], atom.get());
                Ok(buf)
            }
            Request::GrabPointer { .. } | Request::GrabKeyboard { .. } => {
                let mut buf = reply_buffer(sequence, 0);
                buf[1] = GrabStatus::Success as u8;
                Ok(buf)
            }
            _ => return None,
        };
        Some(reply)
    }
}

impl Default for NullTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn reply_buffer(sequence: u16, extra_words: u32) -> Vec<u8> {
    let mut buf = vec![0u8; RECORD_SIZE + extra_words as usize * 4];
    buf[0] = 1;
    LittleEndian::write_u16(&mut buf[2..4], sequence);
    LittleEndian::write_u32(&mut buf[4..8], extra_words);
    buf
}

/// Character cell (width, height) implied by a font name
fn font_cell(name: &str) -> (i16, i16) {
    if let Some((w, h)) = name.split_once('x') {
        if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
            return (w, h);
        }
    }
    // XLFD: the pixel size is the seventh field
    if name.starts_with('-') {
        if let Some(Ok(size)) = name.split('-').nth(7).map(str::parse::<i16>) {
            return ((size / 2).max(1), size);
        }
    }
    (6, 13)
}

fn font_reply(sequence: u16, name: &str) -> Vec<u8> {
    let (width, height) = font_cell(name);
    // Summed in i32; the quotient always fits in i16
    let descent = ((i32::from(height) + 4) / 7) as i16;
    let ascent = height.saturating_sub(descent);

    let mut buf = reply_buffer(sequence, ((QueryFontReply::FIXED_LEN - RECORD_SIZE) / 4) as u32);
    for base in [8, 24] {
        LittleEndian::write_i16(&mut buf[base + 2..base + 4], width);
        LittleEndian::write_i16(&mut buf[base + 4..base + 6], width);
        LittleEndian::write_i16(&mut buf[base + 6..base + 8], ascent);
        LittleEndian::write_i16(&mut buf[base + 8..base + 10], descent);
    }
    LittleEndian::write_u16(&mut buf[40..42], 0x20);
    LittleEndian::write_u16(&mut buf[42..44], 0xFF);
    buf[51] = 1;
    LittleEndian::write_i16(&mut buf[52..54], ascent);
    LittleEndian::write_i16(&mut buf[54..56], descent);
    buf
}

fn null_setup() -> SetupSuccess {
    let visual = VisualType {
        visual_id: VisualId::new(ROOT_VISUAL),
        class: 4, // TrueColor
        bits_per_rgb_value: 8,
        colormap_entries: 256,
        red_mask: 0xFF0000,
        green_mask: 0x00FF00,
        blue_mask: 0x0000FF,
    };

    SetupSuccess {
        protocol_major_version: PROTOCOL_MAJOR_VERSION,
        protocol_minor_version: PROTOCOL_MINOR_VERSION,
        release_number: 1,
        resource_id_base: ID_BASE,
        resource_id_mask: ID_MASK,
        motion_buffer_size: 0,
        maximum_request_length: u16::MAX,
        image_byte_order: ByteOrder::LSBFirst,
        bitmap_format_bit_order: ByteOrder::LSBFirst,
        min_keycode: 8,
        max_keycode: 255,
        vendor: "x11kit null transport".to_string(),
        pixmap_formats: vec![Format {
            depth: 24,
            bits_per_pixel: 32,
            scanline_pad: 32,
        }],
        roots: vec![Screen {
            root: ResourceId::new(ROOT_WINDOW),
            default_colormap: ResourceId::new(DEFAULT_COLORMAP),
            white_pixel: 0xFFFFFF,
            black_pixel: 0x000000,
            current_input_masks: 0,
            width_in_pixels: 1920,
            height_in_pixels: 1080,
            width_in_millimeters: 508,
            height_in_millimeters: 285,
            min_installed_maps: 1,
            max_installed_maps: 1,
            root_visual: VisualId::new(ROOT_VISUAL),
            backing_stores: 0,
            save_unders: false,
            root_depth: 24,
            allowed_depths: vec![Depth {
                depth: 24,
                visuals: vec![visual],
            }],
        }],
    }
}

impl Transport for NullTransport {
    fn setup(&self) -> &SetupSuccess {
        &self.setup
    }

    fn generate_id(&mut self) -> Result<ResourceId> {
        self.ids.next_id().ok_or(Error::IdsExhausted)
    }

    fn send(&mut self, request: &Request) -> Result<Cookie> {
        if self.disconnected || self.state.broken.get() {
            return Err(Error::ConnectionLost);
        }
        // Encode anyway so oversized requests fail like on a real socket
        request.encode()?;
        self.sequence += 1;
        log::trace!("null transport: {:?}", request.opcode());
        self.state.requests.borrow_mut().push(request.clone());
        if let Some(reply) = self.answer(request) {
            self.replies.insert(self.sequence, reply);
        }
        Ok(Cookie::new(self.sequence))
    }

    fn flush(&mut self) -> Result<()> {
        if self.disconnected || self.state.broken.get() {
            return Err(Error::ConnectionLost);
        }
        Ok(())
    }

    fn wait_for_reply(&mut self, cookie: Cookie) -> Result<Vec<u8>> {
        match self.replies.remove(&cookie.sequence()) {
            Some(reply) => reply.map_err(Error::Protocol),
            None if self.has_error() => Err(Error::ConnectionLost),
            None => Err(Error::Decode(DecodeError::Truncated {
                needed: RECORD_SIZE,
                available: 0,
            })),
        }
    }

    fn wait_for_event(&mut self) -> Result<Option<RawEvent>> {
        // Nothing will ever arrive once the queue is empty
        Ok(self.state.events.borrow_mut().pop_front())
    }

    fn poll_for_event(&mut self) -> Result<Option<RawEvent>> {
        Ok(self.state.events.borrow_mut().pop_front())
    }

    fn has_error(&self) -> bool {
        self.disconnected || self.state.broken.get()
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
    }

    fn describe(&self) -> String {
        "null transport".to_string()
    }
}
