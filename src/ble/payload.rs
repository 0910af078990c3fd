//! The fixed outbound NUS payload.

use crate::config::{PAYLOAD_FILL, PAYLOAD_LEN};

/// 32 bytes, every one equal to [`PAYLOAD_FILL`]. No framing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Payload([u8; PAYLOAD_LEN]);

impl Payload {
    pub const fn new() -> Self {
        Self([PAYLOAD_FILL; PAYLOAD_LEN])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_array(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}
