// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! READ CAPACITY (10 / 16) — CDB builders and zerocopy response views.

use anyhow::{Result, anyhow};
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::{BigEndian, U32, U64},
};

/// Build a **SCSI READ CAPACITY(10)** CDB (opcode 0x25).
///
/// - With `pmi = false`, targets return the **maximum LBA** (last logical
///   block) and the **logical block length** (8-byte response).
/// - If the device is larger than 2 TB, the Max LBA will be
///   `0xFFFF_FFFF`, which is a hint to issue **READ CAPACITY(16)**.
#[inline]
pub fn build_read_capacity10(lba: u32, pmi: bool, control: u8) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = 0x25; // READ CAPACITY(10)
    cdb[2..6].copy_from_slice(&lba.to_be_bytes()); // only used if PMI=1
    cdb[8] = pmi as u8;
    cdb[9] = control;
    cdb
}

/// Build a **SCSI READ CAPACITY(16)** CDB via SERVICE ACTION IN(16)
/// (opcode 0x9E, SA=0x10). Use `alloc_len = 32` to get full data.
#[inline]
pub fn build_read_capacity16(
    lba: u64,
    pmi: bool,
    alloc_len: u32,
    control: u8,
) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = 0x9E; // SERVICE ACTION IN(16)
    cdb[1] = 0x10; // Service Action = READ CAPACITY(16)
    cdb[2..10].copy_from_slice(&lba.to_be_bytes()); // only used if PMI=1
    cdb[10..14].copy_from_slice(&alloc_len.to_be_bytes());
    cdb[14] = pmi as u8;
    cdb[15] = control;
    cdb
}

/// Raw 8-byte parameter data returned by READ CAPACITY(10).
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug)]
pub struct Rc10Raw {
    /// Maximum logical block address - highest valid LBA on the device
    pub max_lba: U32<BigEndian>,
    /// Block length in bytes - size of each logical block
    pub block_len: U32<BigEndian>,
}

/// Raw header (first 12 bytes) of READ CAPACITY(16) parameter data.
///
/// The full response is 32 bytes; this covers the fields the utilities
/// need. All fields are big-endian.
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug)]
pub struct Rc16Raw {
    /// Maximum logical block address - 64-bit LBA for large devices
    pub max_lba: U64<BigEndian>,
    /// Block length in bytes - size of each logical block
    pub block_len: U32<BigEndian>,
}

impl Rc10Raw {
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        (self.max_lba.get() as u64 + 1) * self.block_len.get() as u64
    }

    /// If true, target likely needs READ CAPACITY(16).
    #[inline]
    pub fn indicates_overflow(&self) -> bool {
        self.max_lba == u32::MAX
    }
}

impl Rc16Raw {
    #[inline]
    pub fn total_bytes(&self) -> u128 {
        (self.max_lba.get() as u128 + 1) * self.block_len.get() as u128
    }
}

/// Parse READ CAPACITY(10) parameter data (needs ≥ 8 bytes).
#[inline]
pub fn parse_read_capacity10(buf: &[u8]) -> Result<&Rc10Raw> {
    let (raw, _rest) = Rc10Raw::ref_from_prefix(buf)
        .map_err(|_| anyhow!("READ CAPACITY(10): need ≥ 8 bytes, got {}", buf.len()))?;
    Ok(raw)
}

/// Parse READ CAPACITY(16) parameter data head (needs ≥ 12 bytes).
#[inline]
pub fn parse_read_capacity16(buf: &[u8]) -> Result<&Rc16Raw> {
    let (raw, _rest) = Rc16Raw::ref_from_prefix(buf)
        .map_err(|_| anyhow!("READ CAPACITY(16): need ≥ 12 bytes, got {}", buf.len()))?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_layouts() {
        let cdb = build_read_capacity10(0, false, 0);
        assert_eq!(cdb[0], 0x25);
        assert_eq!(cdb[8], 0);
        let cdb = build_read_capacity16(0, false, 32, 0);
        assert_eq!((cdb[0], cdb[1]), (0x9e, 0x10));
        assert_eq!(&cdb[10..14], &[0, 0, 0, 32]);
    }

    #[test]
    fn test_parse_rc10() {
        let mut buf = [0u8; 8];
        buf[0..4].copy_from_slice(&0x0000_ffffu32.to_be_bytes());
        buf[4..8].copy_from_slice(&512u32.to_be_bytes());
        let rc = parse_read_capacity10(&buf).expect("parse");
        assert_eq!(rc.max_lba.get(), 0xffff);
        assert_eq!(rc.block_len.get(), 512);
        assert_eq!(rc.total_bytes(), 0x1_0000 * 512);
        assert!(!rc.indicates_overflow());
    }

    #[test]
    fn test_parse_rc16() {
        let mut buf = [0u8; 32];
        buf[0..8].copy_from_slice(&0x0000_0001_0000_0000u64.to_be_bytes());
        buf[8..12].copy_from_slice(&4096u32.to_be_bytes());
        let rc = parse_read_capacity16(&buf).expect("parse");
        assert_eq!(rc.max_lba.get(), 1u64 << 32);
        assert_eq!(rc.block_len.get(), 4096);
    }
}
