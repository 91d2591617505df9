// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! ATA PASS-THROUGH (16) — tunnel ATA commands to SATA devices through
//! a SCSI transport (SAT).
//!
//! CDB layout (SAT):
//!   [0]  = 0x85 (ATA PASS-THROUGH 16)
//!   [1]  = MULTIPLE_COUNT (7..5) | PROTOCOL (4..1) | EXTEND (0)
//!   [2]  = OFF_LINE (7..6) | CK_COND (5) | T_DIR (3) | BYT_BLOK (2) |
//!          T_LENGTH (1..0)
//!   [3]  = FEATURES (15:8), [4] = FEATURES (7:0)
//!   [5]  = SECTOR COUNT (15:8), [6] = SECTOR COUNT (7:0)
//!   [7]  = LBA LOW (15:8),  [8]  = LBA LOW (7:0)
//!   [9]  = LBA MID (15:8),  [10] = LBA MID (7:0)
//!   [11] = LBA HIGH (15:8), [12] = LBA HIGH (7:0)
//!   [13] = DEVICE, [14] = COMMAND, [15] = CONTROL

/// SAT protocol field values (byte 1, bits 4..1).
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AtaProtocol {
    HardReset = 0,
    SoftReset = 1,
    NonData = 3,
    PioDataIn = 4,
    PioDataOut = 5,
    Dma = 6,
    UdmaDataIn = 12,
    UdmaDataOut = 13,
}

/// T_LENGTH: where the transfer length lives.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TLength {
    NoData = 0,
    InFeatures = 1,
    InSectorCount = 2,
    InTpsiu = 3,
}

/// ATA register values for the tunneled command.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtaRegisters {
    pub features: u16,
    pub sector_count: u16,
    pub lba: u64,
    pub device: u8,
    pub command: u8,
}

/// ATA IDENTIFY DEVICE opcode.
pub const ATA_IDENTIFY_DEVICE: u8 = 0xEC;
/// ATA CHECK POWER MODE opcode.
pub const ATA_CHECK_POWER_MODE: u8 = 0xE5;

/// Build an ATA PASS-THROUGH(16) CDB.
///
/// `t_dir` is from-device when true; `byt_blok` selects block-granular
/// transfer counts; `ck_cond` asks the SATL for an ATA Status Return
/// descriptor even on success.
#[inline]
pub fn build_ata_passthrough16(
    protocol: AtaProtocol,
    extend: bool,
    ck_cond: bool,
    t_dir_in: bool,
    byt_blok: bool,
    t_length: TLength,
    regs: AtaRegisters,
    control: u8,
) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = 0x85;
    cdb[1] = ((protocol as u8) << 1) | extend as u8;
    cdb[2] = ((ck_cond as u8) << 5)
        | ((t_dir_in as u8) << 3)
        | ((byt_blok as u8) << 2)
        | t_length as u8;
    cdb[3] = (regs.features >> 8) as u8;
    cdb[4] = regs.features as u8;
    cdb[5] = (regs.sector_count >> 8) as u8;
    cdb[6] = regs.sector_count as u8;
    cdb[7] = (regs.lba >> 32) as u8; // LBA low, previous
    cdb[8] = regs.lba as u8; // LBA low, current
    cdb[9] = (regs.lba >> 40) as u8; // LBA mid, previous
    cdb[10] = (regs.lba >> 8) as u8; // LBA mid, current
    cdb[11] = (regs.lba >> 48) as u8; // LBA high, previous
    cdb[12] = (regs.lba >> 16) as u8; // LBA high, current
    cdb[13] = regs.device;
    cdb[14] = regs.command;
    cdb[15] = control;
    cdb
}

/// PIO-in IDENTIFY DEVICE, one 512-byte block.
#[inline]
pub fn build_identify_device() -> [u8; 16] {
    build_ata_passthrough16(
        AtaProtocol::PioDataIn,
        false,
        false,
        true,
        true,
        TLength::InSectorCount,
        AtaRegisters {
            sector_count: 1,
            command: ATA_IDENTIFY_DEVICE,
            ..Default::default()
        },
        0,
    )
}

/// Non-data CHECK POWER MODE with CK_COND set; the answer comes back in
/// the ATA Status Return sense descriptor's sector-count field.
#[inline]
pub fn build_check_power_mode() -> [u8; 16] {
    build_ata_passthrough16(
        AtaProtocol::NonData,
        false,
        true,
        false,
        false,
        TLength::NoData,
        AtaRegisters {
            command: ATA_CHECK_POWER_MODE,
            ..Default::default()
        },
        0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_cdb() {
        let cdb = build_identify_device();
        assert_eq!(cdb[0], 0x85);
        assert_eq!(cdb[1], (4 << 1)); // PIO data-in, no extend
        assert_eq!(cdb[2], 0x0e); // T_DIR | BYT_BLOK | T_LENGTH=sector count
        assert_eq!(cdb[6], 1);
        assert_eq!(cdb[14], 0xec);
    }

    #[test]
    fn test_check_power_mode_cdb() {
        let cdb = build_check_power_mode();
        assert_eq!(cdb[1], 3 << 1); // non-data
        assert_eq!(cdb[2], 0x20); // CK_COND only
        assert_eq!(cdb[14], 0xe5);
    }

    #[test]
    fn test_lba48_register_split() {
        let regs = AtaRegisters {
            lba: 0x0000_1234_5678_9abc,
            ..Default::default()
        };
        let cdb = build_ata_passthrough16(
            AtaProtocol::UdmaDataIn,
            true,
            false,
            true,
            true,
            TLength::InSectorCount,
            regs,
            0,
        );
        assert_eq!(cdb[8], 0xbc); // low current
        assert_eq!(cdb[10], 0x9a); // mid current
        assert_eq!(cdb[12], 0x78); // high current
        assert_eq!(cdb[7], 0x56); // low previous
        assert_eq!(cdb[9], 0x34); // mid previous
        assert_eq!(cdb[11], 0x12); // high previous
    }
}
