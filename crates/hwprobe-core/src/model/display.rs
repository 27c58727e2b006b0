//! Attached displays and their EDID blocks.
//!
//! The base EDID block is 128 bytes. Multi-byte fields are little-endian
//! except the packed manufacturer id, which is big-endian.

use serde::{Deserialize, Serialize};

/// Length of one EDID block.
pub const EDID_BLOCK_LEN: usize = 128;

/// Fixed 8-byte pattern every EDID block starts with.
const EDID_HEADER: [u8; 8] = [0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00];

/// One attached display, identified by its raw EDID bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    edid: Vec<u8>,
}

impl Display {
    pub fn new(edid: Vec<u8>) -> Self {
        Self { edid }
    }

    /// Raw identification block (usually 128 or 256 bytes).
    pub fn edid(&self) -> &[u8] {
        &self.edid
    }

    /// Upper-case hex rendering of the raw block.
    pub fn edid_hex(&self) -> String {
        self.edid.iter().map(|b| format!("{:02X}", b)).collect()
    }

    /// Decodes the header fields of the base block.
    ///
    /// Returns `None` for blocks shorter than 128 bytes or without the EDID
    /// header pattern.
    pub fn edid_info(&self) -> Option<EdidInfo> {
        let e = self.edid.as_slice();
        if e.len() < EDID_BLOCK_LEN || e[..8] != EDID_HEADER {
            return None;
        }

        // Three 5-bit letters, 'A' == 1.
        let packed = u16::from_be_bytes([e[8], e[9]]);
        let manufacturer_id: String = [10u16, 5, 0]
            .iter()
            .map(|shift| (((packed >> shift) & 0x1f) as u8 + b'A' - 1) as char)
            .collect();

        Some(EdidInfo {
            manufacturer_id,
            product_code: u16::from_le_bytes([e[10], e[11]]),
            serial_number: u32::from_le_bytes([e[12], e[13], e[14], e[15]]),
            week: e[16],
            year: 1990 + e[17] as u16,
            version: e[18],
            revision: e[19],
            width_cm: e[21],
            height_cm: e[22],
        })
    }
}

/// Header fields decoded from an EDID base block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdidInfo {
    /// Three-letter PNP id, e.g. "DEL".
    pub manufacturer_id: String,
    pub product_code: u16,
    pub serial_number: u32,
    /// Week of manufacture (0 when unspecified, 0xff for model year).
    pub week: u8,
    pub year: u16,
    pub version: u8,
    pub revision: u8,
    /// Maximum horizontal image size in centimetres (0 when undefined).
    pub width_cm: u8,
    pub height_cm: u8,
}
