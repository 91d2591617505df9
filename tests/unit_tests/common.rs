// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared fixture builders for the unit suite.

/// Wrap log parameters into a full LOG SENSE response buffer.
pub fn log_page_bytes(page: u8, subpage: u8, params: &[(u16, u8, Vec<u8>)]) -> Vec<u8> {
    let mut body = vec![];
    for (code, control, value) in params {
        body.extend_from_slice(&code.to_be_bytes());
        body.push(*control);
        body.push(value.len() as u8);
        body.extend_from_slice(value);
    }
    let mut buf = vec![
        (page & 0x3f) | if subpage != 0 { 0x40 } else { 0x00 },
        subpage,
    ];
    buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
    buf.extend_from_slice(&body);
    buf
}

/// A big-endian counter payload of the given width.
pub fn counter(value: u64, width: usize) -> Vec<u8> {
    value.to_be_bytes()[8 - width..].to_vec()
}
