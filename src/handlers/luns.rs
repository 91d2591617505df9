// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! REPORT LUNS with truncation-driven re-issue for `sg_luns`.

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    control_block::report_luns::{MIN_ALLOC_LEN, build_report_luns},
    device::SgDevice,
    models::luns::LunList,
};

/// First-attempt allocation: room for 127 LUNs, enough for almost every
/// target.
const INITIAL_ALLOC: u32 = 1024;

/// Issue REPORT LUNS; when the device declares more data than the first
/// allocation carried, re-issue once with the declared size (capped).
pub fn report_luns(
    dev: &SgDevice,
    select: u8,
    max_alloc: u32,
) -> Result<LunList> {
    let alloc = INITIAL_ALLOC.clamp(MIN_ALLOC_LEN, max_alloc.max(MIN_ALLOC_LEN));
    let mut buf = vec![0u8; alloc as usize];
    let cdb = build_report_luns(select, alloc, 0);
    let got = dev
        .command_in(&cdb, &mut buf)
        .context("REPORT LUNS failed")?;
    let list = LunList::parse(&buf[..got])?;
    if !list.truncated {
        return Ok(list);
    }

    let want = (list.declared_bytes.saturating_add(8)).min(max_alloc.max(MIN_ALLOC_LEN));
    debug!(declared = list.declared_bytes, want, "lun list truncated, re-issuing");
    let mut buf = vec![0u8; want as usize];
    let cdb = build_report_luns(select, want, 0);
    let got = dev
        .command_in(&cdb, &mut buf)
        .context("REPORT LUNS re-issue failed")?;
    LunList::parse(&buf[..got])
}
