//! X11 connection setup protocol
//!
//! This module handles the initial connection handshake between client and
//! server: encoding the client's setup request and parsing the server's
//! answer into screens, depths and visuals.

use super::*;
use byteorder::{ByteOrder as _, LittleEndian};

/// Connection setup request from client
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub byte_order: ByteOrder,
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub authorization_protocol_name: String,
    pub authorization_protocol_data: Vec<u8>,
}

impl SetupRequest {
    /// LSB-first request for protocol 11.0 with the given credentials
    pub fn new(auth_name: String, auth_data: Vec<u8>) -> Self {
        SetupRequest {
            byte_order: ByteOrder::LSBFirst,
            protocol_major_version: PROTOCOL_MAJOR_VERSION,
            protocol_minor_version: PROTOCOL_MINOR_VERSION,
            authorization_protocol_name: auth_name,
            authorization_protocol_data: auth_data,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let name = self.authorization_protocol_name.as_bytes();
        let data = &self.authorization_protocol_data;

        let mut header = [0u8; 12];
        header[0] = self.byte_order.setup_byte();
        LittleEndian::write_u16(&mut header[2..4], self.protocol_major_version);
        LittleEndian::write_u16(&mut header[4..6], self.protocol_minor_version);
        LittleEndian::write_u16(&mut header[6..8], name.len() as u16);
        LittleEndian::write_u16(&mut header[8..10], data.len() as u16);

        let mut setup_bytes = Vec::with_capacity(12 + padded_len(name.len()) + padded_len(data.len()));
        setup_bytes.extend_from_slice(&header);

        // Auth name and data, each padded to 4 bytes
        setup_bytes.extend_from_slice(name);
        setup_bytes.extend_from_slice(&vec![0u8; pad(name.len())]);
        setup_bytes.extend_from_slice(data);
        setup_bytes.extend_from_slice(&vec![0u8; pad(data.len())]);
        setup_bytes
    }
}

/// Setup response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Failed = 0,
    Success = 1,
    Authenticate = 2,
}

impl SetupStatus {
    pub fn from_u8(status: u8) -> Option<Self> {
        match status {
            0 => Some(SetupStatus::Failed),
            1 => Some(SetupStatus::Success),
            2 => Some(SetupStatus::Authenticate),
            _ => None,
        }
    }
}

/// Fixed 8-byte header preceding every setup response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupHeader {
    pub status: u8,
    /// Reason length for Failed responses
    pub reason_len: u8,
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    /// Length of the remaining data in 4-byte units
    pub additional_words: u16,
}

impl SetupHeader {
    pub const LEN: usize = 8;

    pub fn parse(header: &[u8]) -> Result<Self, DecodeError> {
        let r = RawRecord::with_min_len(header, Self::LEN)?;
        Ok(SetupHeader {
            status: r.u8_at(0)?,
            reason_len: r.u8_at(1)?,
            protocol_major_version: r.u16_at(2)?,
            protocol_minor_version: r.u16_at(4)?,
            additional_words: r.u16_at(6)?,
        })
    }

    pub fn data_len(&self) -> usize {
        self.additional_words as usize * 4
    }

    /// Reason text carried by Failed / Authenticate responses
    pub fn reason(&self, data: &[u8]) -> String {
        let len = match SetupStatus::from_u8(self.status) {
            Some(SetupStatus::Failed) => self.reason_len as usize,
            _ => data.len(),
        };
        let text = &data[..len.min(data.len())];
        String::from_utf8_lossy(text).trim_end_matches('\0').to_string()
    }
}

/// Format information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub depth: u8,
    pub bits_per_pixel: u8,
    pub scanline_pad: u8,
}

/// Visual type information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualType {
    pub visual_id: VisualId,
    pub class: u8,
    pub bits_per_rgb_value: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
}

/// Depth information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth {
    pub depth: u8,
    pub visuals: Vec<VisualType>,
}

/// Screen information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub root: ResourceId,
    pub default_colormap: ResourceId,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub current_input_masks: u32,
    pub width_in_pixels: u16,
    pub height_in_pixels: u16,
    pub width_in_millimeters: u16,
    pub height_in_millimeters: u16,
    pub min_installed_maps: u16,
    pub max_installed_maps: u16,
    pub root_visual: VisualId,
    pub backing_stores: u8,
    pub save_unders: bool,
    pub root_depth: u8,
    pub allowed_depths: Vec<Depth>,
}

/// Setup success response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSuccess {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub release_number: u32,
    pub resource_id_base: u32,
    pub resource_id_mask: u32,
    pub motion_buffer_size: u32,
    pub maximum_request_length: u16,
    pub image_byte_order: ByteOrder,
    pub bitmap_format_bit_order: ByteOrder,
    pub min_keycode: u8,
    pub max_keycode: u8,
    pub vendor: String,
    pub pixmap_formats: Vec<Format>,
    pub roots: Vec<Screen>,
}

fn byte_order(value: u8) -> ByteOrder {
    if value == 0 {
        ByteOrder::LSBFirst
    } else {
        ByteOrder::MSBFirst
    }
}

impl SetupSuccess {
    /// Parse the data following a Success header
    pub fn parse(header: &SetupHeader, data: &[u8]) -> Result<Self, DecodeError> {
        let r = RawRecord::with_min_len(data, 32)?;

        let vendor_len = r.u16_at(16)? as usize;
        let num_screens = r.u8_at(20)?;
        let num_formats = r.u8_at(21)?;
        let vendor = String::from_utf8_lossy(r.bytes_at(32, vendor_len)?).to_string();

        let mut offset = 32 + padded_len(vendor_len);
        let mut pixmap_formats = Vec::with_capacity(num_formats as usize);
        for _ in 0..num_formats {
            pixmap_formats.push(Format {
                depth: r.u8_at(offset)?,
                bits_per_pixel: r.u8_at(offset + 1)?,
                scanline_pad: r.u8_at(offset + 2)?,
            });
            offset += 8;
        }

        let mut roots = Vec::with_capacity(num_screens as usize);
        for _ in 0..num_screens {
            let (screen, next) = Self::parse_screen(&r, offset)?;
            roots.push(screen);
            offset = next;
        }

        Ok(SetupSuccess {
            protocol_major_version: header.protocol_major_version,
            protocol_minor_version: header.protocol_minor_version,
            release_number: r.u32_at(0)?,
            resource_id_base: r.u32_at(4)?,
            resource_id_mask: r.u32_at(8)?,
            motion_buffer_size: r.u32_at(12)?,
            maximum_request_length: r.u16_at(18)?,
            image_byte_order: byte_order(r.u8_at(22)?),
            bitmap_format_bit_order: byte_order(r.u8_at(23)?),
            min_keycode: r.u8_at(26)?,
            max_keycode: r.u8_at(27)?,
            vendor,
            pixmap_formats,
            roots,
        })
    }

    fn parse_screen(r: &RawRecord<'_>, mut offset: usize) -> Result<(Screen, usize), DecodeError> {
        let base = offset;
        let num_depths = r.u8_at(base + 39)?;
        offset += 40;

        // Parse depths and visuals
        let mut allowed_depths = Vec::with_capacity(num_depths as usize);
        for _ in 0..num_depths {
            let depth = r.u8_at(offset)?;
            let num_visuals = r.u16_at(offset + 2)?;
            offset += 8;

            let mut visuals = Vec::with_capacity(num_visuals as usize);
            for _ in 0..num_visuals {
                visuals.push(VisualType {
                    visual_id: VisualId::new(r.u32_at(offset)?),
                    class: r.u8_at(offset + 4)?,
                    bits_per_rgb_value: r.u8_at(offset + 5)?,
                    colormap_entries: r.u16_at(offset + 6)?,
                    red_mask: r.u32_at(offset + 8)?,
                    green_mask: r.u32_at(offset + 12)?,
                    blue_mask: r.u32_at(offset + 16)?,
                });
                offset += 24;
            }
            allowed_depths.push(Depth { depth, visuals });
        }

        let screen = Screen {
            root: r.id_at(base)?,
            default_colormap: r.id_at(base + 4)?,
            white_pixel: r.u32_at(base + 8)?,
            black_pixel: r.u32_at(base + 12)?,
            current_input_masks: r.u32_at(base + 16)?,
            width_in_pixels: r.u16_at(base + 20)?,
            height_in_pixels: r.u16_at(base + 22)?,
            width_in_millimeters: r.u16_at(base + 24)?,
            height_in_millimeters: r.u16_at(base + 26)?,
            min_installed_maps: r.u16_at(base + 28)?,
            max_installed_maps: r.u16_at(base + 30)?,
            root_visual: VisualId::new(r.u32_at(base + 32)?),
            backing_stores: r.u8_at(base + 36)?,
            save_unders: r.bool_at(base + 37)?,
            root_depth: r.u8_at(base + 38)?,
            allowed_depths,
        };
        Ok((screen, offset))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Setup data for one 1024x768 screen with a single 24-bit visual
    pub(crate) fn sample_setup_data() -> Vec<u8> {
        let vendor = b"Test Vendor";
        let mut data = Vec::new();
        data.extend_from_slice(&12_000_000u32.to_le_bytes()); // release
        data.extend_from_slice(&0x0040_0000u32.to_le_bytes()); // id base
        data.extend_from_slice(&0x001F_FFFFu32.to_le_bytes()); // id mask
        data.extend_from_slice(&256u32.to_le_bytes()); // motion buffer
        data.extend_from_slice(&(vendor.len() as u16).to_le_bytes());
        data.extend_from_slice(&0xFFFFu16.to_le_bytes()); // max request length
        data.push(1); // screens
        data.push(1); // formats
        data.extend_from_slice(&[0, 0, 32, 32, 8, 255]);
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(vendor);
        data.extend_from_slice(&vec![0u8; pad(vendor.len())]);

        // Format
        data.extend_from_slice(&[24, 32, 32, 0, 0, 0, 0, 0]);

        // Screen
        data.extend_from_slice(&0x0000_0512u32.to_le_bytes()); // root
        data.extend_from_slice(&0x0000_0020u32.to_le_bytes()); // colormap
        data.extend_from_slice(&0x00FF_FFFFu32.to_le_bytes()); // white
        data.extend_from_slice(&0u32.to_le_bytes()); // black
        data.extend_from_slice(&0u32.to_le_bytes()); // input masks
        data.extend_from_slice(&1024u16.to_le_bytes());
        data.extend_from_slice(&768u16.to_le_bytes());
        data.extend_from_slice(&270u16.to_le_bytes());
        data.extend_from_slice(&203u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0x21u32.to_le_bytes()); // root visual
        data.extend_from_slice(&[0, 0, 24, 1]); // backing, save-unders, depth, num depths

        // Depth 24 with one visual
        data.extend_from_slice(&[24, 0]);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&0x21u32.to_le_bytes());
        data.extend_from_slice(&[4, 8]); // TrueColor, bits per rgb
        data.extend_from_slice(&256u16.to_le_bytes());
        data.extend_from_slice(&0x00FF_0000u32.to_le_bytes());
        data.extend_from_slice(&0x0000_FF00u32.to_le_bytes());
        data.extend_from_slice(&0x0000_00FFu32.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data
    }

    #[test]
    fn test_setup_request_encoding() {
        let req = SetupRequest::new("MIT-MAGIC-COOKIE-1".to_string(), vec![0xAB; 16]);
        let bytes = req.encode();
        assert_eq!(bytes[0], b'l');
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 11);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 18);
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 16);
        // 12 header + 20 padded name + 16 data
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn test_parse_setup_success() {
        let data = sample_setup_data();
        let mut header = vec![1, 0];
        header.extend_from_slice(&11u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&((data.len() / 4) as u16).to_le_bytes());

        let header = SetupHeader::parse(&header).unwrap();
        assert_eq!(header.data_len(), data.len());

        let setup = SetupSuccess::parse(&header, &data).unwrap();
        assert_eq!(setup.vendor, "Test Vendor");
        assert_eq!(setup.resource_id_base, 0x0040_0000);
        assert_eq!(setup.roots.len(), 1);

        let screen = &setup.roots[0];
        assert_eq!(screen.root, ResourceId::new(0x512));
        assert_eq!(screen.width_in_pixels, 1024);
        assert_eq!(screen.root_depth, 24);
        assert_eq!(screen.allowed_depths[0].visuals[0].red_mask, 0x00FF_0000);
    }

    #[test]
    fn test_truncated_setup_is_an_error() {
        let data = sample_setup_data();
        let header = SetupHeader {
            status: 1,
            reason_len: 0,
            protocol_major_version: 11,
            protocol_minor_version: 0,
            additional_words: 0,
        };
        assert!(SetupSuccess::parse(&header, &data[..data.len() - 8]).is_err());
    }

    #[test]
    fn test_failure_reason() {
        let header = SetupHeader {
            status: 0,
            reason_len: 5,
            protocol_major_version: 11,
            protocol_minor_version: 0,
            additional_words: 2,
        };
        assert_eq!(header.reason(b"No auth\0"), "No au");
    }
}
