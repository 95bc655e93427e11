use std::io::{Cursor, Read};

use base64;

/// Decode a base64 image as returned by the fit service. A leading data url
/// header (`data:image/png;base64,`) is tolerated.
pub fn decode_image(i: &str) -> Option<Vec<u8>> {
    let payload = match i.split_once(";base64,") {
        Some((_, data)) => data,
        None => i,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    let mut binding = Cursor::new(payload);
    let mut decoder = base64::read::DecoderReader::new(&mut binding, base64::STANDARD);
    let mut bytes = Vec::new();
    match decoder.read_to_end(&mut bytes) {
        Ok(_) => Some(bytes),
        Err(_) => None,
    }
}

pub fn encode(bytes: &[u8]) -> String {
    base64::encode_config(bytes, base64::STANDARD)
}
