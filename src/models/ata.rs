// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! ATA IDENTIFY DEVICE data (ACS), as returned through the SAT
//! ATA PASS-THROUGH(16) tunnel.
//!
//! The 512-byte structure is an array of 256 little-endian 16-bit words;
//! ASCII fields (model, serial, firmware) store two characters per word
//! with the bytes swapped.

use core::fmt;

use anyhow::{Result, bail};

pub const IDENTIFY_DATA_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct IdentifyDevice {
    pub model: String,
    pub serial: String,
    pub firmware: String,
    /// 28-bit addressable sectors (words 60-61).
    pub sectors_28: u32,
    /// 48-bit addressable sectors (words 100-103), when LBA48 is set.
    pub sectors_48: Option<u64>,
    /// Word 217: nominal rotation rate (1 = non-rotating / SSD).
    pub rotation_rate: Option<u16>,
}

fn word(buf: &[u8], idx: usize) -> u16 {
    u16::from_le_bytes([buf[idx * 2], buf[idx * 2 + 1]])
}

/// ATA string fields: per-word byte swap, then trim padding.
fn ata_string(buf: &[u8], first_word: usize, n_words: usize) -> String {
    let mut bytes = Vec::with_capacity(n_words * 2);
    for w in first_word..first_word + n_words {
        let v = word(buf, w);
        bytes.push((v >> 8) as u8);
        bytes.push((v & 0xff) as u8);
    }
    crate::utils::trim_scsi_ascii(&bytes)
}

impl IdentifyDevice {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < IDENTIFY_DATA_LEN {
            bail!(
                "IDENTIFY DEVICE data too short: {} < {IDENTIFY_DATA_LEN}",
                buf.len()
            );
        }

        let lba48 = word(buf, 83) & (1 << 10) != 0;
        let sectors_48 = lba48.then(|| {
            (word(buf, 100) as u64)
                | ((word(buf, 101) as u64) << 16)
                | ((word(buf, 102) as u64) << 32)
                | ((word(buf, 103) as u64) << 48)
        });
        let rotation = word(buf, 217);

        Ok(Self {
            serial: ata_string(buf, 10, 10),
            firmware: ata_string(buf, 23, 4),
            model: ata_string(buf, 27, 20),
            sectors_28: (word(buf, 60) as u32) | ((word(buf, 61) as u32) << 16),
            sectors_48,
            rotation_rate: (rotation != 0 && rotation != 0xffff).then_some(rotation),
        })
    }

    pub fn sectors(&self) -> u64 {
        self.sectors_48.unwrap_or(self.sectors_28 as u64)
    }
}

impl fmt::Display for IdentifyDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:    {}", self.model)?;
        writeln!(f, "Serial:   {}", self.serial)?;
        writeln!(f, "Firmware: {}", self.firmware)?;
        writeln!(f, "Sectors:  {}", self.sectors())?;
        match self.rotation_rate {
            Some(1) => writeln!(f, "Media:    solid state"),
            Some(rpm) => writeln!(f, "Media:    rotating, {rpm} rpm"),
            None => writeln!(f, "Media:    rate not reported"),
        }
    }
}
