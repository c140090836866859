//! Display names and Xauthority lookup

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder as _};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Xauthority address families
const FAMILY_INTERNET: u16 = 0x0000;
const FAMILY_LOCAL: u16 = 0x0100;
const FAMILY_WILD: u16 = 0xFFFF;

/// Parsed display name: `[protocol/][host]:display[.screen]`, or an
/// absolute socket path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    pub protocol: Option<String>,
    pub host: String,
    pub display: u16,
    pub screen: u16,
    pub socket_path: Option<PathBuf>,
}

impl DisplayName {
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || Error::ConnectFailed(format!("Invalid display name: {:?}", name));

        if name.starts_with('/') {
            // Socket path, optionally suffixed with :display[.screen]
            if let Some((path, suffix)) = name.rsplit_once(':') {
                if let Ok((display, screen)) = parse_number(suffix) {
                    return Ok(DisplayName {
                        protocol: Some("unix".to_string()),
                        host: String::new(),
                        display,
                        screen,
                        socket_path: Some(PathBuf::from(path)),
                    });
                }
            }
            return Ok(DisplayName {
                protocol: Some("unix".to_string()),
                host: String::new(),
                display: 0,
                screen: 0,
                socket_path: Some(PathBuf::from(name)),
            });
        }

        let (protocol, rest) = match name.split_once('/') {
            Some((proto, rest)) => (Some(proto.to_string()), rest),
            None => (None, name),
        };
        let (host, number) = rest.rsplit_once(':').ok_or_else(invalid)?;
        let (display, screen) = parse_number(number).map_err(|_| invalid())?;

        // "unix:0" names the local socket, not a host called unix
        let (protocol, host) = if protocol.is_none() && host == "unix" {
            (Some("unix".to_string()), String::new())
        } else {
            (protocol, host.to_string())
        };

        Ok(DisplayName {
            protocol,
            host,
            display,
            screen,
            socket_path: None,
        })
    }

    /// Parse `name`, or `$DISPLAY` when none is given
    pub fn from_env_or(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => Self::parse(name),
            None => {
                let env = std::env::var("DISPLAY").map_err(|_| {
                    Error::ConnectFailed("No display name given and DISPLAY is not set".to_string())
                })?;
                Self::parse(&env)
            }
        }
    }

    /// Whether the server is reached through a local socket
    pub fn is_local(&self) -> bool {
        match self.protocol.as_deref() {
            Some("unix") => true,
            Some(_) => false,
            None => self.host.is_empty(),
        }
    }

    pub fn unix_socket_path(&self) -> PathBuf {
        match &self.socket_path {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("/tmp/.X11-unix/X{}", self.display)),
        }
    }

    pub fn tcp_port(&self) -> u16 {
        6000u16.saturating_add(self.display)
    }
}

fn parse_number(text: &str) -> std::result::Result<(u16, u16), std::num::ParseIntError> {
    match text.split_once('.') {
        Some((display, screen)) => Ok((display.parse()?, screen.parse()?)),
        None => Ok((text.parse()?, 0)),
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.socket_path {
            return write!(f, "{}", path.display());
        }
        if let Some(proto) = &self.protocol {
            write!(f, "{}/", proto)?;
        }
        write!(f, "{}:{}.{}", self.host, self.display, self.screen)
    }
}

/// One authorization entry: protocol name and opaque data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEntry {
    pub name: String,
    pub data: Vec<u8>,
}

fn xauthority_path() -> Option<PathBuf> {
    // Get .Xauthority path from env or use default
    std::env::var("XAUTHORITY")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".Xauthority"))
        })
}

/// Credentials for `display` from `$XAUTHORITY` or `~/.Xauthority`
pub fn read_xauthority(display: &DisplayName) -> Option<AuthEntry> {
    let path = xauthority_path()?;
    log::debug!("Reading auth from: {:?}", path);

    let mut data = Vec::new();
    let read = std::fs::File::open(&path).and_then(|mut file| file.read_to_end(&mut data));
    if let Err(e) = read {
        log::debug!("Could not read {:?}: {}", path, e);
        return None;
    }

    let entry = find_auth_entry(&data, display.display);
    match &entry {
        Some(auth) => log::debug!("Found auth: {} ({} bytes)", auth.name, auth.data.len()),
        None => log::debug!("No auth entry found for display {}", display.display),
    }
    entry
}

// Length-prefixed (big-endian u16) field
fn counted<'a>(data: &'a [u8], offset: &mut usize) -> Option<&'a [u8]> {
    let len = BigEndian::read_u16(data.get(*offset..*offset + 2)?) as usize;
    *offset += 2;
    let field = data.get(*offset..*offset + len)?;
    *offset += len;
    Some(field)
}

/// Scan Xauthority file contents for the first entry matching `display`
pub fn find_auth_entry(data: &[u8], display: u16) -> Option<AuthEntry> {
    let display_str = display.to_string();
    let mut offset = 0;

    while offset < data.len() {
        let family = BigEndian::read_u16(data.get(offset..offset + 2)?);
        offset += 2;

        let _address = counted(data, &mut offset)?;
        let number = counted(data, &mut offset)?;
        let name = counted(data, &mut offset)?;
        let auth_data = counted(data, &mut offset)?;

        let family_ok = matches!(family, FAMILY_LOCAL | FAMILY_INTERNET | FAMILY_WILD);
        let number_ok = number == display_str.as_bytes() || number.is_empty();
        if family_ok && number_ok {
            return Some(AuthEntry {
                name: String::from_utf8_lossy(name).to_string(),
                data: auth_data.to_vec(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_display() {
        let d = DisplayName::parse(":1").unwrap();
        assert_eq!((d.display, d.screen), (1, 0));
        assert!(d.is_local());
        assert_eq!(d.unix_socket_path(), PathBuf::from("/tmp/.X11-unix/X1"));
    }

    #[test]
    fn test_parse_screen_and_host() {
        let d = DisplayName::parse("remote.example:2.1").unwrap();
        assert_eq!(d.host, "remote.example");
        assert_eq!((d.display, d.screen), (2, 1));
        assert!(!d.is_local());
        assert_eq!(d.tcp_port(), 6002);
    }

    #[test]
    fn test_parse_protocol_prefixes() {
        let d = DisplayName::parse("unix:0").unwrap();
        assert!(d.is_local());
        assert!(d.host.is_empty());

        let d = DisplayName::parse("tcp/localhost:3").unwrap();
        assert_eq!(d.protocol.as_deref(), Some("tcp"));
        assert!(!d.is_local());
    }

    #[test]
    fn test_parse_socket_path() {
        let d = DisplayName::parse("/run/x11/sock:4").unwrap();
        assert_eq!(d.socket_path, Some(PathBuf::from("/run/x11/sock")));
        assert_eq!(d.display, 4);

        let d = DisplayName::parse("/tmp/.X11-unix/X0").unwrap();
        assert_eq!(d.unix_socket_path(), PathBuf::from("/tmp/.X11-unix/X0"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DisplayName::parse("nonsense").is_err());
        assert!(DisplayName::parse(":x").is_err());
        assert!(DisplayName::parse(":0.y").is_err());
    }

    fn entry(family: u16, number: &str, name: &str, data: &[u8]) -> Vec<u8> {
        let mut out = family.to_be_bytes().to_vec();
        for field in [b"host".as_slice(), number.as_bytes(), name.as_bytes(), data] {
            out.extend_from_slice(&(field.len() as u16).to_be_bytes());
            out.extend_from_slice(field);
        }
        out
    }

    #[test]
    fn test_find_auth_entry_by_display() {
        let mut file = entry(FAMILY_LOCAL, "0", "MIT-MAGIC-COOKIE-1", &[1; 16]);
        file.extend(entry(FAMILY_LOCAL, "1", "MIT-MAGIC-COOKIE-1", &[2; 16]));

        let auth = find_auth_entry(&file, 1).unwrap();
        assert_eq!(auth.name, "MIT-MAGIC-COOKIE-1");
        assert_eq!(auth.data, vec![2; 16]);
        assert!(find_auth_entry(&file, 5).is_none());
    }

    #[test]
    fn test_truncated_auth_file() {
        let file = entry(FAMILY_LOCAL, "0", "MIT-MAGIC-COOKIE-1", &[1; 16]);
        assert!(find_auth_entry(&file[..file.len() - 3], 0).is_none());
    }
}
