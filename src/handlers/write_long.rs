// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! WRITE LONG with the transfer-length negotiation `sg_write_long`
//! performs: when the device rejects the length with ILI set, the sense
//! INFORMATION field carries `requested - correct`, and the command can
//! be retried with the corrected value.

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::{
    control_block::write_long::{
        WriteLongFlags, build_write_long10, build_write_long16,
    },
    device::{CommandError, SgDevice},
};

#[derive(Debug, Clone)]
pub enum WriteLongOutcome {
    /// The device took the data (or the WR_UNCOR marking).
    Done,
    /// Rejected with ILI; the device expects this many bytes instead.
    WrongLength { correct_len: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct WriteLongRequest {
    pub lba: u64,
    pub transfer_len: u16,
    pub flags: WriteLongFlags,
    /// Retry once with the device-corrected length.
    pub fix: bool,
}

fn issue(
    dev: &SgDevice,
    lba: u64,
    transfer_len: u16,
    flags: WriteLongFlags,
    data: &[u8],
) -> Result<(), CommandError> {
    let use_16 = lba > u32::MAX as u64;
    if flags.wr_uncor {
        // WR_UNCOR transfers no data
        if use_16 {
            dev.command_none(&build_write_long16(flags, lba, 0, 0))
        } else {
            dev.command_none(&build_write_long10(flags, lba as u32, 0, 0))
        }
    } else if use_16 {
        dev.command_out(&build_write_long16(flags, lba, transfer_len, 0), data)
    } else {
        dev.command_out(
            &build_write_long10(flags, lba as u32, transfer_len, 0),
            data,
        )
    }
}

/// The ILI negotiation: `info` is `requested - correct` as a signed
/// value (32-bit in fixed sense format).
fn corrected_length(requested: u16, information: u64) -> Option<u32> {
    let delta = information as u32 as i32 as i64;
    let correct = requested as i64 - delta;
    (correct > 0 && correct <= u32::MAX as i64).then_some(correct as u32)
}

/// Run WRITE LONG, negotiating the device's long-block size when asked.
pub fn write_long(
    dev: &SgDevice,
    req: WriteLongRequest,
    data: &[u8],
) -> Result<WriteLongOutcome> {
    if !req.flags.wr_uncor && data.len() != req.transfer_len as usize {
        bail!(
            "data length {} does not match transfer length {}",
            data.len(),
            req.transfer_len
        );
    }

    match issue(dev, req.lba, req.transfer_len, req.flags, data) {
        Ok(()) => Ok(WriteLongOutcome::Done),
        Err(CommandError::Sense(info))
            if info.sense.ili && info.sense.info_valid =>
        {
            let Some(correct) =
                corrected_length(req.transfer_len, info.sense.information)
            else {
                bail!(
                    "device set ILI but the information field 0x{:x} yields no \
                     usable length",
                    info.sense.information
                );
            };
            debug!(
                requested = req.transfer_len,
                correct, "device corrected WRITE LONG length"
            );

            if !req.fix {
                return Ok(WriteLongOutcome::WrongLength {
                    correct_len: correct,
                });
            }
            if correct > u16::MAX as u32 {
                bail!("corrected length {correct} exceeds WRITE LONG's 16-bit field");
            }

            let mut fixed = data.to_vec();
            fixed.resize(correct as usize, 0);
            warn!(correct, "retrying WRITE LONG with corrected length");
            issue(dev, req.lba, correct as u16, req.flags, &fixed)
                .context("corrected WRITE LONG failed")?;
            Ok(WriteLongOutcome::Done)
        },
        Err(err) => Err(err).context("WRITE LONG failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrected_length_underrun() {
        // device wants 520, caller sent 512: info = 512 - 520 = -8
        let info = (-8i32) as u32 as u64;
        assert_eq!(corrected_length(512, info), Some(520));
    }

    #[test]
    fn test_corrected_length_overrun() {
        // caller sent 1024, device wants 520: info = 504
        assert_eq!(corrected_length(1024, 504), Some(520));
    }

    #[test]
    fn test_corrected_length_nonsense() {
        assert_eq!(corrected_length(512, 512), None); // "wants zero"
        assert_eq!(corrected_length(0, 8), None);
    }
}
