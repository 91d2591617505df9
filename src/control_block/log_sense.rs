// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LOG SENSE — 10-byte CDB.
//!
//! CDB layout (SPC):
//!   [0] = 0x4D (LOG SENSE)
//!   [1] = PPC (bit 1) | SP (bit 0)
//!   [2] = PC (bits 7..6) | PAGE CODE (bits 5..0)
//!   [3] = SUBPAGE CODE
//!   [4] = reserved
//!   [5..7] = PARAMETER POINTER (big-endian u16)
//!   [7..9] = ALLOCATION LENGTH (big-endian u16)
//!   [9] = CONTROL
//!
//! Response parsing lives in [`crate::models::logs`].

pub const LOG_SENSE: u8 = 0x4D;

/// Page Control (PC) for LOG SENSE byte 2 (bits 7..6).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[repr(u8)]
pub enum PageControl {
    ThresholdValues = 0b00,
    #[default]
    CumulativeValues = 0b01,
    DefaultThresholds = 0b10,
    DefaultCumulative = 0b11,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSenseOptions {
    pub pc: PageControl,
    /// PPC: only parameters that changed since the last LOG SELECT.
    pub ppc: bool,
    /// SP: save the parameters after reporting them.
    pub sp: bool,
    pub parameter_pointer: u16,
}

/// Build a LOG SENSE CDB for (page, subpage).
#[inline]
pub fn build_log_sense(
    page_code: u8,
    subpage_code: u8,
    options: LogSenseOptions,
    allocation_len: u16,
    control: u8,
) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = LOG_SENSE;
    cdb[1] = ((options.ppc as u8) << 1) | options.sp as u8;
    cdb[2] = ((options.pc as u8) << 6) | (page_code & 0x3F);
    cdb[3] = subpage_code;
    cdb[5..7].copy_from_slice(&options.parameter_pointer.to_be_bytes());
    cdb[7..9].copy_from_slice(&allocation_len.to_be_bytes());
    cdb[9] = control;
    cdb
}

/// Convenience: cumulative values, no save, pointer 0, control 0.
#[inline]
pub fn build_log_sense_simple(
    page_code: u8,
    subpage_code: u8,
    allocation_len: u16,
) -> [u8; 10] {
    build_log_sense(
        page_code,
        subpage_code,
        LogSenseOptions::default(),
        allocation_len,
        0x00,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_layout() {
        let cdb = build_log_sense_simple(0x2f, 0x00, 0x0400);
        assert_eq!(cdb[0], 0x4d);
        assert_eq!(cdb[1], 0x00);
        assert_eq!(cdb[2], 0x40 | 0x2f); // PC=cumulative
        assert_eq!(&cdb[7..9], &[0x04, 0x00]);
    }

    #[test]
    fn test_page_control_bits() {
        let opts = LogSenseOptions {
            pc: PageControl::DefaultThresholds,
            ppc: true,
            sp: true,
            parameter_pointer: 0x1234,
        };
        let cdb = build_log_sense(0x0d, 0x01, opts, 64, 0);
        assert_eq!(cdb[1], 0x03);
        assert_eq!(cdb[2], 0x80 | 0x0d);
        assert_eq!(cdb[3], 0x01);
        assert_eq!(&cdb[5..7], &[0x12, 0x34]);
    }
}
