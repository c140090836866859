//! Socket transport - a real client connection to an X server
//!
//! Connects over the Linux abstract socket, the filesystem socket in
//! `/tmp/.X11-unix`, or TCP for remote displays, performs the LSB-first
//! setup handshake, and then multiplexes requests, replies and events over
//! the one stream.

use super::display::{read_xauthority, DisplayName};
use super::{Cookie, IdAllocator, RawEvent, Transport};
use crate::error::{Error, Result};
use crate::protocol::*;
use byteorder::{ByteOrder as _, LittleEndian};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Outgoing bytes are written once this much is queued
const FLUSH_THRESHOLD: usize = 16 * 1024;

/// Response type of XGE events, which carry a length like replies
const GENERIC_EVENT: u8 = 35;

/// Underlying byte stream
enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.set_nonblocking(nonblocking),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.flush(),
        }
    }
}

pub struct SocketTransport {
    stream: Stream,
    display: DisplayName,
    setup: SetupSuccess,
    ids: IdAllocator,
    last_sequence: u64,
    outgoing: Vec<u8>,
    incoming: Vec<u8>,
    nonblocking: bool,
    events: VecDeque<RawEvent>,
    // Replies and errors for requests that asked for a reply, by wire sequence
    replies: HashMap<u16, std::result::Result<Vec<u8>, ProtocolError>>,
    awaiting: HashSet<u16>,
    failed: bool,
    closed: bool,
}

impl SocketTransport {
    /// Connect to `display_name`, or to `$DISPLAY` when none is given
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let display = DisplayName::from_env_or(display_name)?;
        let mut stream = Self::open_stream(&display)?;
        log::debug!("Connected to display {}", display);

        let setup = Self::handshake(&mut stream, &display)?;
        log::debug!("Setup successful:");
        log::debug!("  Resource ID base: 0x{:08x}", setup.resource_id_base);
        log::debug!("  Resource ID mask: 0x{:08x}", setup.resource_id_mask);
        log::debug!("  Vendor: {}", setup.vendor);
        log::debug!("  Screens: {}", setup.roots.len());

        Ok(SocketTransport {
            stream,
            ids: IdAllocator::new(setup.resource_id_base, setup.resource_id_mask),
            display,
            setup,
            last_sequence: 0,
            outgoing: Vec::with_capacity(FLUSH_THRESHOLD),
            incoming: Vec::new(),
            nonblocking: false,
            events: VecDeque::new(),
            replies: HashMap::new(),
            awaiting: HashSet::new(),
            failed: false,
            closed: false,
        })
    }

    pub fn display(&self) -> &DisplayName {
        &self.display
    }

    fn open_stream(display: &DisplayName) -> Result<Stream> {
        let failed = |e: io::Error| {
            Error::ConnectFailed(format!("Failed to connect to display {}: {}", display, e))
        };

        #[cfg(unix)]
        {
            if display.socket_path.is_some() {
                return UnixStream::connect(display.unix_socket_path())
                    .map(Stream::Unix)
                    .map_err(failed);
            }

            if display.is_local() {
                #[cfg(target_os = "linux")]
                match connect_abstract(display.display) {
                    Ok(stream) => return Ok(Stream::Unix(stream)),
                    Err(e) => log::debug!("Abstract socket unavailable: {}", e),
                }

                match UnixStream::connect(display.unix_socket_path()) {
                    Ok(stream) => return Ok(Stream::Unix(stream)),
                    Err(e) if display.protocol.as_deref() == Some("unix") => return Err(failed(e)),
                    Err(e) => log::debug!("Unix socket unavailable: {}", e),
                }
            }
        }

        let host = if display.host.is_empty() {
            "localhost"
        } else {
            display.host.as_str()
        };
        let stream = TcpStream::connect((host, display.tcp_port())).map_err(failed)?;
        stream.set_nodelay(true).map_err(failed)?;
        Ok(Stream::Tcp(stream))
    }

    fn handshake(stream: &mut Stream, display: &DisplayName) -> Result<SetupSuccess> {
        let (auth_name, auth_data) = read_xauthority(display)
            .map(|auth| (auth.name, auth.data))
            .unwrap_or_default();

        let request = SetupRequest::new(auth_name, auth_data);
        stream
            .write_all(&request.encode())
            .map_err(|e| Error::ConnectFailed(format!("Failed to send setup: {}", e)))?;

        let mut header = [0u8; SetupHeader::LEN];
        stream
            .read_exact(&mut header)
            .map_err(|e| Error::ConnectFailed(format!("Failed to read setup reply: {}", e)))?;
        let header = SetupHeader::parse(&header)?;

        let mut data = vec![0u8; header.data_len()];
        stream
            .read_exact(&mut data)
            .map_err(|e| Error::ConnectFailed(format!("Failed to read setup data: {}", e)))?;

        if header.protocol_major_version != PROTOCOL_MAJOR_VERSION {
            return Err(Error::ProtocolVersionMismatch {
                major: header.protocol_major_version,
                minor: header.protocol_minor_version,
            });
        }

        match SetupStatus::from_u8(header.status) {
            Some(SetupStatus::Success) => Ok(SetupSuccess::parse(&header, &data)?),
            Some(_) => Err(Error::ConnectFailed(format!(
                "X server rejected connection: {}",
                header.reason(&data)
            ))),
            None => Err(Error::ConnectFailed(format!(
                "Unexpected setup status {}",
                header.status
            ))),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.failed || self.closed {
            return Err(Error::ConnectionLost);
        }
        Ok(())
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        if self.nonblocking != nonblocking {
            self.stream.set_nonblocking(nonblocking)?;
            self.nonblocking = nonblocking;
        }
        Ok(())
    }

    /// Read whatever is available; returns false when nothing arrived
    fn read_more(&mut self, blocking: bool) -> Result<bool> {
        self.set_nonblocking(!blocking)?;
        let mut chunk = [0u8; 4096];
        match self.stream.read(&mut chunk) {
            Ok(0) => {
                log::info!("X server closed the connection");
                self.closed = true;
                Ok(false)
            }
            Ok(n) => {
                self.incoming.extend_from_slice(&chunk[..n]);
                self.take_packets()?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(true),
            Err(e) => {
                self.failed = true;
                Err(e.into())
            }
        }
    }

    /// Move complete packets from the read buffer to the reply map or the
    /// event queue
    fn take_packets(&mut self) -> Result<()> {
        while self.incoming.len() >= RECORD_SIZE {
            let response_type = self.incoming[0] & !SEND_EVENT_BIT;
            let extra = match response_type {
                1 | GENERIC_EVENT => LittleEndian::read_u32(&self.incoming[4..8]) as usize * 4,
                _ => 0,
            };
            let total = RECORD_SIZE + extra;
            if self.incoming.len() < total {
                break;
            }

            let packet: Vec<u8> = self.incoming.drain(..total).collect();
            let sequence = LittleEndian::read_u16(&packet[2..4]);
            match response_type {
                1 => {
                    self.replies.insert(sequence, Ok(packet));
                }
                0 if self.awaiting.contains(&sequence) => {
                    let error = ProtocolError::decode(&RawRecord::new(&packet)?)?;
                    self.replies.insert(sequence, Err(error));
                }
                _ => {
                    let mut raw = [0u8; RECORD_SIZE];
                    raw.copy_from_slice(&packet[..RECORD_SIZE]);
                    self.events.push_back(raw);
                }
            }
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn connect_abstract(display: u16) -> io::Result<UnixStream> {
    use nix::sys::socket::{connect, socket, AddressFamily, SockFlag, SockType, UnixAddr};
    use std::os::fd::AsRawFd;

    let fd = socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::SOCK_CLOEXEC,
        None,
    )?;
    let abstract_name = format!("/tmp/.X11-unix/X{}", display);
    let addr = UnixAddr::new_abstract(abstract_name.as_bytes())?;
    connect(fd.as_raw_fd(), &addr)?;
    Ok(UnixStream::from(fd))
}

impl Transport for SocketTransport {
    fn setup(&self) -> &SetupSuccess {
        &self.setup
    }

    fn generate_id(&mut self) -> Result<ResourceId> {
        self.ids.next_id().ok_or(Error::IdsExhausted)
    }

    fn send(&mut self, request: &Request) -> Result<Cookie> {
        self.ensure_open()?;
        let bytes = request.encode()?;
        self.last_sequence += 1;
        let cookie = Cookie::new(self.last_sequence);
        if request.expects_reply() {
            self.awaiting.insert(cookie.wire_sequence());
        }
        self.outgoing.extend_from_slice(&bytes);
        if self.outgoing.len() >= FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(cookie)
    }

    fn flush(&mut self) -> Result<()> {
        if self.outgoing.is_empty() {
            return Ok(());
        }
        self.ensure_open()?;
        self.set_nonblocking(false)?;
        let result = self
            .stream
            .write_all(&self.outgoing)
            .and_then(|_| self.stream.flush());
        self.outgoing.clear();
        if let Err(e) = result {
            self.failed = true;
            return Err(e.into());
        }
        Ok(())
    }

    fn wait_for_reply(&mut self, cookie: Cookie) -> Result<Vec<u8>> {
        let sequence = cookie.wire_sequence();
        self.flush()?;
        loop {
            if let Some(reply) = self.replies.remove(&sequence) {
                self.awaiting.remove(&sequence);
                return reply.map_err(Error::Protocol);
            }
            if self.closed {
                return Err(Error::ConnectionLost);
            }
            self.read_more(true)?;
        }
    }

    fn wait_for_event(&mut self) -> Result<Option<RawEvent>> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }
            if self.closed {
                return Ok(None);
            }
            self.flush()?;
            self.read_more(true)?;
        }
    }

    fn poll_for_event(&mut self) -> Result<Option<RawEvent>> {
        while self.events.is_empty() && !self.closed && self.read_more(false)? {}
        Ok(self.events.pop_front())
    }

    fn has_error(&self) -> bool {
        self.failed || self.closed
    }

    fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            log::debug!("Flush before disconnect failed: {}", e);
        }
        if let Err(e) = self.stream.shutdown() {
            log::debug!("Shutdown failed: {}", e);
        }
        self.closed = true;
        log::debug!("Disconnected from {}", self.display);
    }

    fn describe(&self) -> String {
        format!("display {} ({})", self.display, self.setup.vendor)
    }
}
