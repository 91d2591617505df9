// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MODE SENSE with the (10)-then-(6) fallback for `sg_modes`.

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    control_block::mod_sense::{
        PageControl, build_mode_sense6, build_mode_sense10,
    },
    device::{CommandError, SgDevice},
    models::modes::ModeData,
};

#[derive(Debug, Clone, Copy)]
pub struct ModeSenseOptions {
    pub pc: PageControl,
    /// DBD: leave block descriptors out of the answer.
    pub dbd: bool,
    /// Force the 6-byte CDB instead of trying (10) first.
    pub six_only: bool,
}

impl Default for ModeSenseOptions {
    fn default() -> Self {
        Self {
            pc: PageControl::Current,
            dbd: false,
            six_only: false,
        }
    }
}

/// Run MODE SENSE(10), falling back to MODE SENSE(6) when the device
/// rejects the opcode, and split the response.
pub fn mode_sense(
    dev: &SgDevice,
    page: u8,
    subpage: u8,
    options: ModeSenseOptions,
    max_alloc: u16,
) -> Result<ModeData> {
    if !options.six_only {
        let alloc = max_alloc.clamp(8, 4096);
        let cdb =
            build_mode_sense10(false, options.dbd, options.pc, page, subpage, alloc, 0);
        let mut buf = vec![0u8; alloc as usize];
        match dev.command_in(&cdb, &mut buf) {
            Ok(got) => {
                return ModeData::parse(&buf[..got], true)
                    .context("decoding mode sense(10) data");
            },
            Err(CommandError::Sense(info)) if info.sense.is_invalid_opcode() => {
                debug!("MODE SENSE(10) not supported, retrying with (6)");
            },
            Err(err) => return Err(err).context("MODE SENSE(10) failed"),
        }
    }

    let alloc = max_alloc.min(0xff) as u8;
    let cdb = build_mode_sense6(options.dbd, options.pc, page, subpage, alloc, 0);
    let mut buf = vec![0u8; alloc as usize];
    let got = dev
        .command_in(&cdb, &mut buf)
        .context("MODE SENSE(6) failed")?;
    ModeData::parse(&buf[..got], false).context("decoding mode sense(6) data")
}
