//! Modified UTF-8, the string encoding JNI speaks
//!
//! Differs from UTF-8 in two places: NUL is written as `C0 80`, and
//! characters outside the BMP are written as two 3-byte surrogates.

/// Encode a Rust string as modified UTF-8 (without the trailing NUL).
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 1);
    for ch in s.chars() {
        match ch as u32 {
            0 => out.extend_from_slice(&[0xC0, 0x80]),
            c if c <= 0xFFFF => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units).iter() {
                    push_unit3(&mut out, *unit);
                }
            }
        }
    }
    out
}

fn push_unit3(out: &mut Vec<u8>, unit: u16) {
    out.push(0xE0 | (unit >> 12) as u8);
    out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
    out.push(0x80 | (unit & 0x3F) as u8);
}

/// Decode modified UTF-8. Malformed input is replaced with U+FFFD.
pub fn decode(bytes: &[u8]) -> String {
    // Plain UTF-8 never contains C0 80 or encoded surrogates.
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_owned();
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let cont = |k: usize| bytes.get(i + k).map(|c| (c & 0x3F) as u32).unwrap_or(0);
        if b < 0x80 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push((((b & 0x1F) as u32) << 6 | cont(1)) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            units.push((((b & 0x0F) as u32) << 12 | cont(1) << 6 | cont(2)) as u16);
            i += 3;
        } else if b & 0xF8 == 0xF0 {
            let c = ((b & 0x07) as u32) << 18 | cont(1) << 12 | cont(2) << 6 | cont(3);
            match char::from_u32(c) {
                Some(ch) => {
                    let mut pair = [0u16; 2];
                    units.extend_from_slice(ch.encode_utf16(&mut pair));
                }
                None => units.push(0xFFFD),
            }
            i += 4;
        } else {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
