// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! WRITE LONG (10/16) — write a full physical block including ECC bytes,
//! or mark a block as pseudo-uncorrectable.
//!
//! WRITE LONG(10) CDB layout (SBC):
//!   [0] = 0x3F
//!   [1] = COR_DIS (bit 7) | WR_UNCOR (bit 6) | PBLOCK (bit 5)
//!   [2..6] = LBA (big-endian u32)
//!   [6] = reserved
//!   [7..9] = BYTE TRANSFER LENGTH (big-endian u16)
//!   [9] = CONTROL
//!
//! WRITE LONG(16) is SERVICE ACTION OUT(16) opcode 0x9F, service action
//! 0x11, with a 64-bit LBA.
//!
//! When the transfer length does not match the device's long-block size
//! the target answers ILLEGAL REQUEST with the ILI bit set and the
//! INFORMATION field holding `requested - correct` as a signed value;
//! the handler uses that to report (or retry with) the correct length.

pub const WRITE_LONG_10: u8 = 0x3F;
pub const SERVICE_ACTION_OUT_16: u8 = 0x9F;
pub const WRITE_LONG_16_SA: u8 = 0x11;

/// Flag bits for byte 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteLongFlags {
    /// COR_DIS: disable error correction on subsequent reads.
    pub cor_dis: bool,
    /// WR_UNCOR: mark the block pseudo-uncorrectable (no data out).
    pub wr_uncor: bool,
    /// PBLOCK: address a physical block rather than a logical one.
    pub pblock: bool,
}

impl WriteLongFlags {
    fn bits(&self) -> u8 {
        ((self.cor_dis as u8) << 7)
            | ((self.wr_uncor as u8) << 6)
            | ((self.pblock as u8) << 5)
    }
}

/// Build a WRITE LONG(10) CDB.
#[inline]
pub fn build_write_long10(
    flags: WriteLongFlags,
    lba: u32,
    transfer_len: u16,
    control: u8,
) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = WRITE_LONG_10;
    cdb[1] = flags.bits();
    cdb[2..6].copy_from_slice(&lba.to_be_bytes());
    cdb[7..9].copy_from_slice(&transfer_len.to_be_bytes());
    cdb[9] = control;
    cdb
}

/// Build a WRITE LONG(16) CDB for LBAs past the 32-bit range.
#[inline]
pub fn build_write_long16(
    flags: WriteLongFlags,
    lba: u64,
    transfer_len: u16,
    control: u8,
) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = SERVICE_ACTION_OUT_16;
    cdb[1] = flags.bits() | WRITE_LONG_16_SA;
    cdb[2..10].copy_from_slice(&lba.to_be_bytes());
    cdb[12..14].copy_from_slice(&transfer_len.to_be_bytes());
    cdb[15] = control;
    cdb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_long10_layout() {
        let flags = WriteLongFlags {
            wr_uncor: true,
            ..Default::default()
        };
        let cdb = build_write_long10(flags, 0x1234, 0, 0);
        assert_eq!(cdb[0], 0x3f);
        assert_eq!(cdb[1], 0x40);
        assert_eq!(&cdb[2..6], &[0x00, 0x00, 0x12, 0x34]);
        assert_eq!(&cdb[7..9], &[0, 0]);
    }

    #[test]
    fn test_write_long16_layout() {
        let cdb = build_write_long16(WriteLongFlags::default(), 1 << 33, 520, 0);
        assert_eq!(cdb[0], 0x9f);
        assert_eq!(cdb[1] & 0x1f, 0x11);
        assert_eq!(&cdb[2..10], &(1u64 << 33).to_be_bytes());
        assert_eq!(&cdb[12..14], &520u16.to_be_bytes());
    }
}
