//! Advertisement data parsing and the scan filter.
//!
//! The SoftDevice hands us raw AD structures (`[len][type][data...]`).
//! Only the pieces the central needs are decoded: local name and
//! 128-bit service UUID lists.

use heapless::String;

/// AD type: Incomplete List of 128-bit Service UUIDs.
const AD_UUID128_INCOMPLETE: u8 = 0x06;
/// AD type: Complete List of 128-bit Service UUIDs.
const AD_UUID128_COMPLETE: u8 = 0x07;
/// AD type: Shortened Local Name.
const AD_NAME_SHORTENED: u8 = 0x08;
/// AD type: Complete Local Name.
const AD_NAME_COMPLETE: u8 = 0x09;

/// Walk the AD structures, yielding `(type, value)` for each well-formed one.
///
/// Stops at the first zero-length or truncated structure.
fn for_each_ad<'a>(data: &'a [u8], mut f: impl FnMut(u8, &'a [u8]) -> bool) -> bool {
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 || i + len >= data.len() {
            break;
        }
        let ad_type = data[i + 1];
        if f(ad_type, &data[i + 2..i + 1 + len]) {
            return true;
        }
        i += len + 1;
    }
    false
}

/// Check if raw advertisement data lists the given 128-bit service UUID
/// (little-endian, as on air).
pub fn contains_uuid128(data: &[u8], uuid: &[u8; 16]) -> bool {
    for_each_ad(data, |ad_type, value| {
        (ad_type == AD_UUID128_INCOMPLETE || ad_type == AD_UUID128_COMPLETE)
            && value.chunks_exact(16).any(|chunk| chunk == uuid)
    })
}

/// Check if the complete or shortened local name equals `name` exactly.
pub fn has_name(data: &[u8], name: &str) -> bool {
    for_each_ad(data, |ad_type, value| {
        (ad_type == AD_NAME_SHORTENED || ad_type == AD_NAME_COMPLETE) && value == name.as_bytes()
    })
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let mut name = String::new();
    let found = for_each_ad(data, |ad_type, value| {
        if ad_type != AD_NAME_SHORTENED && ad_type != AD_NAME_COMPLETE {
            return false;
        }
        for &b in value {
            if name.push(b as char).is_err() {
                break;
            }
        }
        true
    });

    if !found {
        let _ = name.push_str("Unknown");
    }
    name
}

/// Static scan filter, set once at startup.
///
/// A report matches when ANY enabled filter matches. With no filter
/// enabled nothing matches, so the scanner never connects blindly.
#[derive(Clone, Copy, Debug)]
pub struct ScanFilter {
    pub name: Option<&'static str>,
    pub uuid: Option<[u8; 16]>,
}

impl ScanFilter {
    /// Filter on the advertised device name only.
    pub const fn by_name(name: &'static str) -> Self {
        Self {
            name: Some(name),
            uuid: None,
        }
    }

    /// Also accept peers advertising `uuid`.
    pub const fn with_uuid(mut self, uuid: [u8; 16]) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        let by_name = self.name.is_some_and(|n| has_name(data, n));
        let by_uuid = self.uuid.is_some_and(|u| contains_uuid128(data, &u));
        by_name || by_uuid
    }
}
