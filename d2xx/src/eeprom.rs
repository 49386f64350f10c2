//! EEPROM image and the helpers that move it across the native boundary.
//!
//! The EEPROM is in 3 parts: the chip-specific struct kept in [`Eeprom::raw`],
//! the 4 strings, and the rest which is used as the user area. The user area
//! is accessed separately through the `ee_ua_*` calls.

use libc::c_char;

/// Size of the common header at the start of every raw image.
pub const HEADER_LEN: usize = 16;

/// Capacity of each native string buffer, NUL included.
pub const STRING_CAPACITY: usize = 64;

/// Upper bound on `manufacturer.len() + desc.len()` imposed by the chips.
pub const MAX_MANUFACTURER_AND_DESC: usize = 40;

/// Unprocessed EEPROM content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eeprom {
    /// Raw EEPROM struct. It excludes the strings.
    pub raw: Vec<u8>,
    pub manufacturer: String,
    pub manufacturer_id: String,
    pub desc: String,
    pub serial: String,
}

impl Eeprom {
    /// Allocates a zeroed image of `len` raw bytes.
    pub fn with_len(len: usize) -> Self {
        Self {
            raw: vec![0; len],
            ..Self::default()
        }
    }

    /// Whether the strings satisfy the chips' combined length limit.
    pub fn strings_fit(&self) -> bool {
        self.manufacturer.len() + self.desc.len() <= MAX_MANUFACTURER_AND_DESC
    }

    pub fn header(&self) -> Option<Header> {
        decode_header(&self.raw)
    }
}

/// The part of the common 16 byte header this crate interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub device_type: u32,
}

/// Decodes the header overlay, or `None` when `raw` is too short to hold one.
///
/// A short buffer is the normal case for devices without an EEPROM.
pub fn decode_header(raw: &[u8]) -> Option<Header> {
    if raw.len() < HEADER_LEN {
        return None;
    }
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&raw[..4]);
    Some(Header {
        device_type: u32::from_le_bytes(tag),
    })
}

/// Stores `device_type` in the header overlay. No-op without a header.
pub fn with_device_type(raw: &mut [u8], device_type: u32) -> &mut [u8] {
    if raw.len() >= HEADER_LEN {
        raw[..4].copy_from_slice(&device_type.to_le_bytes());
    }
    raw
}

/// A fixed size, NUL terminated string buffer as the driver expects.
pub(crate) type StringBuf = [c_char; STRING_CAPACITY];

/// Packs `s` into a native buffer, truncating so the NUL always fits.
pub(crate) fn pack_string(s: &str) -> StringBuf {
    let mut buf = [0 as c_char; STRING_CAPACITY];
    for (dst, &src) in buf.iter_mut().zip(s.as_bytes().iter().take(STRING_CAPACITY - 1)) {
        *dst = src as c_char;
    }
    buf
}

/// Decodes a native buffer up to the first NUL, or the whole buffer if none.
pub(crate) fn unpack_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
