// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Sense-data normalization (SPC-4 § 4.5).
//!
//! Both wire formats are accepted:
//! - fixed (response codes 0x70 current / 0x71 deferred), 18+ bytes;
//! - descriptor (0x72 current / 0x73 deferred), an 8-byte header followed
//!   by a sequence of (type, length, payload) descriptors.
//!
//! Everything is normalized into [`SenseData`]; the raw descriptors that
//! matter to the utilities (information, command-specific, sense-key
//! specific, ATA status return) are decoded into typed fields.

use core::fmt;

use anyhow::{Result, anyhow, bail};
use thiserror::Error;

use crate::models::asc_ascq::asc_ascq_to_string;

/// Sense data must be >= 18 bytes for fixed format.
pub const FIXED_MIN_LEN: usize = 18;
/// Descriptor format carries an 8-byte header before any descriptors.
pub const DESC_HEADER_LEN: usize = 8;

/// Sense Key Descriptions
pub const SENSE_KEY_DESCRIPTIONS: [&str; 16] = [
    "No Sense",
    "Recovered Error",
    "Not Ready",
    "Medium Error",
    "Hardware Error",
    "Illegal Request",
    "Unit Attention",
    "Data Protect",
    "Blank Check",
    "Vendor specific",
    "Copy Aborted",
    "Aborted Command",
    "Equal",
    "Volume Overflow",
    "Miscompare",
    "Completed",
];

pub const SENSE_KEY_NO_SENSE: u8 = 0x00;
pub const SENSE_KEY_RECOVERED_ERROR: u8 = 0x01;
pub const SENSE_KEY_NOT_READY: u8 = 0x02;
pub const SENSE_KEY_MEDIUM_ERROR: u8 = 0x03;
pub const SENSE_KEY_HARDWARE_ERROR: u8 = 0x04;
pub const SENSE_KEY_ILLEGAL_REQUEST: u8 = 0x05;
pub const SENSE_KEY_UNIT_ATTENTION: u8 = 0x06;
pub const SENSE_KEY_DATA_PROTECT: u8 = 0x07;
pub const SENSE_KEY_ABORTED_COMMAND: u8 = 0x0b;

/// ATA Status Return descriptor (SAT, descriptor type 0x09).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtaStatusReturn {
    pub extend: bool,
    pub error: u8,
    pub sector_count: u16,
    pub lba: u64,
    pub device: u8,
    pub status: u8,
}

/// Normalized sense data, independent of the wire format it arrived in.
#[derive(Default, PartialEq, Clone)]
pub struct SenseData {
    pub response_code: u8, // low-7 bits of byte0
    pub deferred: bool,    // response codes 0x71/0x73
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
    /// Fixed format: VALID bit; descriptor format: an information
    /// descriptor was present.
    pub info_valid: bool,
    pub information: u64,
    pub cmd_specific: Option<u64>,
    /// Fixed-format flags (byte 2).
    pub filemark: bool,
    pub eom: bool,
    pub ili: bool,
    /// Sense-key specific bytes, when the SKSV bit is set.
    pub sks: Option<[u8; 3]>,
    /// SAT ATA Status Return descriptor, when present.
    pub ata_return: Option<AtaStatusReturn>,
}

impl SenseData {
    /// Parse either sense-data format; rejects buffers that are too short
    /// for the format they claim.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.is_empty() {
            bail!("empty sense buffer");
        }
        let response_code = buf[0] & 0x7f;
        match response_code {
            0x70 | 0x71 => Self::parse_fixed(buf),
            0x72 | 0x73 => Self::parse_descriptor(buf),
            other => bail!("invalid sense response code: 0x{other:02x}"),
        }
    }

    /// Parse *fixed-format* sense data (SPC-4 § 4.5.3).
    fn parse_fixed(buf: &[u8]) -> Result<Self> {
        if buf.len() < FIXED_MIN_LEN {
            return Err(anyhow!(
                "fixed sense buffer too small: {} < {FIXED_MIN_LEN}",
                buf.len()
            ));
        }

        let response_code = buf[0] & 0x7f;
        let info_valid = buf[0] & 0x80 != 0;
        let filemark = buf[2] & 0x80 != 0;
        let eom = buf[2] & 0x40 != 0;
        let ili = buf[2] & 0x20 != 0;
        let sense_key = buf[2] & 0x0f;

        let information =
            u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]) as u64;
        let additional_len = buf[7] as usize;
        let cmd_specific = (additional_len >= 4)
            .then(|| u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as u64);

        // SKSV lives in the top bit of byte 15.
        let sks = (buf[15] & 0x80 != 0).then(|| [buf[15], buf[16], buf[17]]);

        Ok(Self {
            response_code,
            deferred: response_code == 0x71,
            sense_key,
            asc: buf[12],
            ascq: buf[13],
            info_valid,
            information,
            cmd_specific,
            filemark,
            eom,
            ili,
            sks,
            ata_return: None,
        })
    }

    /// Parse *descriptor-format* sense data (SPC-4 § 4.5.2).
    fn parse_descriptor(buf: &[u8]) -> Result<Self> {
        if buf.len() < DESC_HEADER_LEN {
            return Err(anyhow!(
                "descriptor sense buffer too small: {} < {DESC_HEADER_LEN}",
                buf.len()
            ));
        }

        let response_code = buf[0] & 0x7f;
        let mut sense = Self {
            response_code,
            deferred: response_code == 0x73,
            sense_key: buf[1] & 0x0f,
            asc: buf[2],
            ascq: buf[3],
            ..Self::default()
        };

        let additional_len = buf[7] as usize;
        let end = buf.len().min(DESC_HEADER_LEN + additional_len);

        let mut off = DESC_HEADER_LEN;
        while off + 2 <= end {
            let dtype = buf[off];
            let dlen = buf[off + 1] as usize;
            let body = off + 2;
            if body + dlen > end {
                // a descriptor spanning past the buffer ends the walk
                break;
            }
            let d = &buf[body..body + dlen];
            match dtype {
                // Information (needs 10 payload bytes; u64 at offset 2)
                0x00 if dlen >= 10 => {
                    sense.info_valid = d[0] & 0x80 != 0;
                    sense.information = u64::from_be_bytes([
                        d[2], d[3], d[4], d[5], d[6], d[7], d[8], d[9],
                    ]);
                },
                // Command-specific information
                0x01 if dlen >= 10 => {
                    sense.cmd_specific = Some(u64::from_be_bytes([
                        d[2], d[3], d[4], d[5], d[6], d[7], d[8], d[9],
                    ]));
                },
                // Sense-key specific
                0x02 if dlen >= 6 => {
                    if d[2] & 0x80 != 0 {
                        sense.sks = Some([d[2], d[3], d[4]]);
                    }
                },
                // ATA Status Return (SAT)
                0x09 if dlen >= 12 => {
                    sense.ata_return = Some(AtaStatusReturn {
                        extend: d[0] & 0x01 != 0,
                        error: d[1],
                        sector_count: u16::from_be_bytes([d[2], d[3]]),
                        lba: ((d[8] as u64) << 40)
                            | ((d[6] as u64) << 32)
                            | ((d[4] as u64) << 24)
                            | ((d[9] as u64) << 16)
                            | ((d[7] as u64) << 8)
                            | (d[5] as u64),
                        device: d[10],
                        status: d[11],
                    });
                },
                _ => {},
            }
            off = body + dlen;
        }

        Ok(sense)
    }

    pub fn sense_key_str(&self) -> &'static str {
        SENSE_KEY_DESCRIPTIONS[(self.sense_key & 0x0f) as usize]
    }

    pub fn additional_str(&self) -> String {
        asc_ascq_to_string(self.asc, self.ascq)
    }

    /// Progress indication from the sense-key specific field, as a
    /// fraction of 65536 (SPC-4 § 4.5.2.4.4). Only meaningful when the
    /// sense key is NO SENSE or NOT READY.
    pub fn progress(&self) -> Option<u16> {
        if self.sense_key != SENSE_KEY_NO_SENSE
            && self.sense_key != SENSE_KEY_NOT_READY
        {
            return None;
        }
        let sks = self.sks?;
        Some(u16::from_be_bytes([sks[1], sks[2]]))
    }

    pub fn category(&self) -> SenseCategory {
        match self.sense_key {
            // NO SENSE covers informational answers too (e.g. the SAT
            // "ATA pass through information available" pair)
            SENSE_KEY_NO_SENSE => SenseCategory::Clean,
            SENSE_KEY_RECOVERED_ERROR => SenseCategory::RecoveredError,
            SENSE_KEY_NOT_READY => SenseCategory::NotReady,
            SENSE_KEY_MEDIUM_ERROR | SENSE_KEY_HARDWARE_ERROR => {
                SenseCategory::MediumOrHardware
            },
            SENSE_KEY_ILLEGAL_REQUEST => SenseCategory::IllegalRequest,
            SENSE_KEY_UNIT_ATTENTION => SenseCategory::UnitAttention,
            SENSE_KEY_ABORTED_COMMAND => SenseCategory::AbortedCommand,
            _ => SenseCategory::OtherSense,
        }
    }

    /// True for the "invalid command operation code" response some
    /// devices give for commands they do not implement.
    pub fn is_invalid_opcode(&self) -> bool {
        self.sense_key == SENSE_KEY_ILLEGAL_REQUEST
            && self.asc == 0x20
            && self.ascq == 0x00
    }
}

/// Coarse classification of a command completion, used by the utilities
/// to decide between retry, report, and abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseCategory {
    Clean,
    RecoveredError,
    NotReady,
    MediumOrHardware,
    IllegalRequest,
    UnitAttention,
    AbortedCommand,
    OtherSense,
}

impl fmt::Display for SenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SenseCategory::Clean => "no sense",
            SenseCategory::RecoveredError => "recovered error",
            SenseCategory::NotReady => "not ready",
            SenseCategory::MediumOrHardware => "medium or hardware error",
            SenseCategory::IllegalRequest => "illegal request",
            SenseCategory::UnitAttention => "unit attention",
            SenseCategory::AbortedCommand => "aborted command",
            SenseCategory::OtherSense => "other sense",
        })
    }
}

/// The (key, asc, ascq) triple plus rendering, carried inside
/// [`crate::device::CommandError`].
#[derive(Error, Clone, PartialEq)]
pub struct SenseInfo {
    pub sense: SenseData,
}

impl fmt::Display for SenseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sense)
    }
}

impl fmt::Debug for SenseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenseInfo {{ {:?} }}", self.sense)
    }
}

impl fmt::Display for SenseData {
    /// Renders the multi-line form the utilities print for CHECK
    /// CONDITION completions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = if self.response_code >= 0x72 {
            "Descriptor format"
        } else {
            "Fixed format"
        };
        let when = if self.deferred { "deferred" } else { "current" };
        writeln!(f, "{format}, {when}; Sense key: {}", self.sense_key_str())?;
        write!(f, " Additional sense: {}", self.additional_str())?;
        if self.info_valid {
            write!(f, "\n  Info fld=0x{:x}", self.information)?;
            if self.ili {
                write!(f, " [ILI]")?;
            }
        } else if self.ili {
            write!(f, "\n  Incorrect length indicator (ILI) set")?;
        }
        if let Some(cs) = self.cmd_specific {
            write!(f, "\n  Command specific: 0x{cs:x}")?;
        }
        if let Some(progress) = self.progress() {
            let pct = (progress as u32 * 100) / 65536;
            write!(f, "\n  Progress indication: {pct}% done")?;
        }
        if let Some(ata) = &self.ata_return {
            write!(
                f,
                "\n  ATA Status Return: status=0x{:02x} error=0x{:02x} \
                 count=0x{:x} lba=0x{:x}",
                ata.status, ata.error, ata.sector_count, ata.lba
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenseData")
            .field(
                "response_code",
                &format_args!("{:#04x}", self.response_code),
            )
            .field("sense_key", &format_args!("{:#x}", self.sense_key))
            .field("asc", &format_args!("{:#04x}", self.asc))
            .field("ascq", &format_args!("{:#04x}", self.ascq))
            .field("deferred", &self.deferred)
            .field("info_valid", &self.info_valid)
            .field("information", &self.information)
            .field("description", &self.additional_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_sense(key: u8, asc: u8, ascq: u8) -> [u8; 18] {
        let mut b = [0u8; 18];
        b[0] = 0x70;
        b[2] = key;
        b[7] = 10;
        b[12] = asc;
        b[13] = ascq;
        b
    }

    #[test]
    fn test_fixed_normalizes() {
        let s = SenseData::parse(&fixed_sense(0x05, 0x24, 0x00)).expect("parse");
        assert_eq!(s.sense_key, SENSE_KEY_ILLEGAL_REQUEST);
        assert_eq!((s.asc, s.ascq), (0x24, 0x00));
        assert_eq!(s.category(), SenseCategory::IllegalRequest);
        assert!(!s.deferred);
    }

    #[test]
    fn test_fixed_info_field() {
        let mut b = fixed_sense(0x05, 0x24, 0x00);
        b[0] = 0xf0; // VALID
        b[2] |= 0x20; // ILI
        b[3..7].copy_from_slice(&0x0000_0208u32.to_be_bytes());
        let s = SenseData::parse(&b).expect("parse");
        assert!(s.info_valid && s.ili);
        assert_eq!(s.information, 0x208);
    }

    #[test]
    fn test_descriptor_normalizes() {
        // header + information descriptor + ATA status return descriptor
        let mut b = vec![0x72, 0x01, 0x00, 0x1d, 0, 0, 0, 26];
        b.extend_from_slice(&[0x00, 0x0a, 0x80, 0, 0, 0, 0, 0, 0x12, 0x34, 0x56, 0x78]);
        b.extend_from_slice(&[
            0x09, 0x0c, 0x01, 0x00, 0x00, 0x01, 0x00, 0xaa, 0x00, 0xbb, 0x00, 0xcc,
            0xa0, 0x50,
        ]);
        let s = SenseData::parse(&b).expect("parse");
        assert_eq!(s.sense_key, SENSE_KEY_RECOVERED_ERROR);
        assert_eq!((s.asc, s.ascq), (0x1d, 0x00));
        assert!(s.info_valid);
        assert_eq!(s.information, 0x12345678);
        let ata = s.ata_return.expect("ata descriptor");
        assert!(ata.extend);
        assert_eq!(ata.status, 0x50);
        assert_eq!(ata.sector_count, 1);
        assert_eq!(ata.lba, 0xccbbaa);
    }

    #[test]
    fn test_progress_indication() {
        let mut b = fixed_sense(0x02, 0x04, 0x04);
        b[15] = 0x80; // SKSV
        b[16..18].copy_from_slice(&0x8000u16.to_be_bytes());
        let s = SenseData::parse(&b).expect("parse");
        assert_eq!(s.progress(), Some(0x8000));
        let text = s.to_string();
        assert!(text.contains("50% done"), "{text}");
    }

    #[test]
    fn test_bad_response_code() {
        assert!(SenseData::parse(&[0x40; 18]).is_err());
        assert!(SenseData::parse(&[]).is_err());
    }
}
