// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! READ BUFFER (10) — 10-byte CDB plus the descriptor-mode parser.
//!
//! CDB layout (SPC):
//!   [0] = 0x3C (READ BUFFER)
//!   [1] = MODE (bits 4..0)
//!   [2] = BUFFER ID
//!   [3..6] = BUFFER OFFSET (big-endian, 3 bytes)
//!   [6..9] = ALLOCATION LENGTH (big-endian, 3 bytes)
//!   [9] = CONTROL
//!
//! `sg_rbuf` uses Data mode to stream from the device buffer;
//! `sg_test_rwbuf` pairs Data mode with WRITE BUFFER. Echo modes bounce
//! back the last WRITE BUFFER payload.

use anyhow::{Result, bail};

pub const READ_BUFFER: u8 = 0x3C;

/// READ BUFFER modes (byte 1, bits 4..0).
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BufferMode {
    CombinedHeaderData = 0x00,
    Data = 0x02,
    Descriptor = 0x03,
    EchoBuffer = 0x0a,
    EchoBufferDescriptor = 0x0b,
}

impl From<BufferMode> for u8 {
    #[inline]
    fn from(m: BufferMode) -> u8 {
        m as u8
    }
}

/// Build a READ BUFFER (10) CDB. Offset and length are 24-bit fields.
#[inline]
pub fn build_read_buffer(
    mode: BufferMode,
    buffer_id: u8,
    offset: u32,
    allocation_len: u32,
    control: u8,
) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = READ_BUFFER;
    cdb[1] = u8::from(mode) & 0x1f;
    cdb[2] = buffer_id;
    cdb[3..6].copy_from_slice(&offset.to_be_bytes()[1..4]);
    cdb[6..9].copy_from_slice(&allocation_len.to_be_bytes()[1..4]);
    cdb[9] = control;
    cdb
}

/// Descriptor-mode response: offset boundary and buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Offsets passed to Data mode must be aligned to 2^boundary bytes.
    pub offset_boundary: u8,
    /// Total buffer capacity in bytes (24-bit field).
    pub capacity: u32,
}

impl BufferDescriptor {
    pub fn alignment(&self) -> u32 {
        // 0xff means "no alignment requirement published"
        if self.offset_boundary >= 24 {
            1
        } else {
            1u32 << self.offset_boundary
        }
    }
}

/// Parse the 4-byte descriptor returned by Descriptor / EchoBufferDescriptor.
pub fn parse_buffer_descriptor(buf: &[u8]) -> Result<BufferDescriptor> {
    if buf.len() < 4 {
        bail!("READ BUFFER descriptor too short: {} bytes", buf.len());
    }
    Ok(BufferDescriptor {
        offset_boundary: buf[0],
        capacity: u32::from_be_bytes([0, buf[1], buf[2], buf[3]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_layout() {
        let cdb = build_read_buffer(BufferMode::Data, 1, 0x012345, 0x00ffff, 0);
        assert_eq!(cdb[0], 0x3c);
        assert_eq!(cdb[1], 0x02);
        assert_eq!(cdb[2], 1);
        assert_eq!(&cdb[3..6], &[0x01, 0x23, 0x45]);
        assert_eq!(&cdb[6..9], &[0x00, 0xff, 0xff]);
    }

    #[test]
    fn test_descriptor_parse() {
        let d = parse_buffer_descriptor(&[0x09, 0x04, 0x00, 0x00]).expect("parse");
        assert_eq!(d.capacity, 0x0004_0000);
        assert_eq!(d.alignment(), 512);
        assert!(parse_buffer_descriptor(&[0x09]).is_err());
    }
}
