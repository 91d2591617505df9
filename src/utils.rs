// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt::Write;

/// Renders a byte buffer the way `sg_logs --hex` and friends do: 16 bytes
/// per line, each line prefixed with its offset.
///
/// ```text
/// 00     00 00 00 5c 00 01 00 02  00 02 00 02 00 00 00 00
/// 10     ...
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4);
    for (i, chunk) in data.chunks(16).enumerate() {
        write!(&mut out, "{:04x}  ", i * 16).expect("Writing to String cannot fail");
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                out.push(' ');
            }
            write!(&mut out, " {byte:02x}").expect("Writing to String cannot fail");
        }
        out.push('\n');
    }
    out
}

/// Renders a short buffer as contiguous lowercase hex (no prefix).
pub fn hex_compact(data: &[u8]) -> String {
    let mut hex = String::with_capacity(data.len() * 2);
    for byte in data {
        write!(&mut hex, "{byte:02x}").expect("Writing to String cannot fail");
    }
    hex
}

/// Converts SCSI ASCII fields into a `String`, mapping non-ASCII bytes to
/// `?` and trimming NUL/space padding on both ends.
pub fn trim_scsi_ascii(bytes: &[u8]) -> String {
    let s: String = bytes
        .iter()
        .map(|&b| if b.is_ascii() && b != 0 { b as char } else { ' ' })
        .collect();
    s.trim().to_string()
}

/// Decodes a big-endian counter of 1..=8 bytes into a `u64`, the format
/// used by log page parameter payloads.
pub fn be_counter(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let mut v = 0u64;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_layout() {
        let data: Vec<u8> = (0u8..18).collect();
        let dump = hex_dump(&data);
        let mut lines = dump.lines();
        let first = lines.next().expect("missing first line");
        assert!(first.starts_with("0000"));
        assert!(first.contains("07  08"), "gap after 8 bytes: {first}");
        let second = lines.next().expect("missing second line");
        assert!(second.starts_with("0010"));
    }

    #[test]
    fn test_trim_scsi_ascii() {
        assert_eq!(trim_scsi_ascii(b"ATA     \x00\x00"), "ATA");
        assert_eq!(trim_scsi_ascii(b"\x00\x00"), "");
    }

    #[test]
    fn test_be_counter() {
        assert_eq!(be_counter(&[0x01, 0x00]), Some(256));
        assert_eq!(be_counter(&[0xff; 8]), Some(u64::MAX));
        assert_eq!(be_counter(&[0u8; 9]), None);
        assert_eq!(be_counter(&[]), None);
    }
}
