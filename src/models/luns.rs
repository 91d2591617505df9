// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! REPORT LUNS parameter data and SAM-5 LUN addressing.
//!
//! The response is a 4-byte big-endian list length, 4 reserved bytes,
//! then 8-byte LUN entries. Each 8-byte LUN is up to four 2-byte levels;
//! the top two bits of each level select the addressing method.

use core::fmt;

use anyhow::{Result, bail};

/// One 8-byte LUN as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lun(pub [u8; 8]);

/// First-level addressing decode of a LUN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunAddressing {
    /// Peripheral device addressing: bus id + target/lun.
    Peripheral { bus: u8, target_or_lun: u8 },
    /// Flat space addressing: a 14-bit value.
    Flat(u16),
    /// Logical unit addressing: bus / target / lun triple.
    LogicalUnit { bus: u8, target: u8, lun: u8 },
    /// Extended logical unit addressing (length + format preserved raw).
    Extended { length: u8, format: u8, value: u64 },
}

impl Lun {
    /// Word-oriented hex form (`sg_luns` default output).
    pub fn as_words(&self) -> [u16; 4] {
        let b = self.0;
        [
            u16::from_be_bytes([b[0], b[1]]),
            u16::from_be_bytes([b[2], b[3]]),
            u16::from_be_bytes([b[4], b[5]]),
            u16::from_be_bytes([b[6], b[7]]),
        ]
    }

    /// Dense u64 form, handy for ordering and de-duplication.
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Decode the first addressing level (SAM-5 § 4.7).
    pub fn addressing(&self) -> LunAddressing {
        let b0 = self.0[0];
        let b1 = self.0[1];
        match (b0 >> 6) & 0x03 {
            0b00 => LunAddressing::Peripheral {
                bus: b0 & 0x3f,
                target_or_lun: b1,
            },
            0b01 => LunAddressing::Flat(((b0 as u16 & 0x3f) << 8) | b1 as u16),
            0b10 => LunAddressing::LogicalUnit {
                bus: (b0 >> 3) & 0x07,
                target: b0 & 0x07,
                lun: b1 & 0x1f,
            },
            _ => LunAddressing::Extended {
                length: (b0 >> 4) & 0x03,
                format: b0 & 0x0f,
                value: self.as_u64() & 0x00ff_ffff_ffff_ffff,
            },
        }
    }

    /// The common single-level value most initiators care about.
    pub fn ordinary(&self) -> Option<u64> {
        match self.addressing() {
            LunAddressing::Peripheral { bus: 0, target_or_lun } => {
                Some(target_or_lun as u64)
            },
            LunAddressing::Flat(v) => Some(v as u64),
            _ => None,
        }
    }
}

impl fmt::Display for Lun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.as_words();
        write!(f, "{:04x}{:04x}{:04x}{:04x}", w[0], w[1], w[2], w[3])?;
        match self.addressing() {
            LunAddressing::Peripheral { bus: 0, target_or_lun } => {
                write!(f, "  [peripheral, lun {target_or_lun}]")
            },
            LunAddressing::Peripheral { bus, target_or_lun } => {
                write!(f, "  [peripheral, bus {bus}, target/lun {target_or_lun}]")
            },
            LunAddressing::Flat(v) => write!(f, "  [flat space, lun {v}]"),
            LunAddressing::LogicalUnit { bus, target, lun } => {
                write!(f, "  [logical unit, bus {bus}, target {target}, lun {lun}]")
            },
            LunAddressing::Extended { format, .. } => {
                write!(f, "  [extended, format 0x{format:x}]")
            },
        }
    }
}

/// Parse REPORT LUNS parameter data into the reported LUN list.
///
/// `buf` may be shorter than the declared list (a truncated allocation);
/// in that case only the complete entries present are returned and
/// `truncated` is set so the caller can re-issue with a larger buffer.
#[derive(Debug, Clone)]
pub struct LunList {
    pub luns: Vec<Lun>,
    /// Bytes the device said it has, from the list-length field.
    pub declared_bytes: u32,
    pub truncated: bool,
}

impl LunList {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < 8 {
            bail!("REPORT LUNS data too short: {} bytes", buf.len());
        }
        let declared_bytes = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if !declared_bytes.is_multiple_of(8) {
            bail!("LUN list length {declared_bytes} is not a multiple of 8");
        }
        let available = &buf[8..];
        let declared = declared_bytes as usize;
        let usable = declared.min(available.len() - available.len() % 8);

        let mut luns = Vec::with_capacity(usable / 8);
        for chunk in available[..usable].chunks_exact(8) {
            let mut lun = [0u8; 8];
            lun.copy_from_slice(chunk);
            luns.push(Lun(lun));
        }
        Ok(Self {
            luns,
            declared_bytes,
            truncated: declared > available.len(),
        })
    }
}
