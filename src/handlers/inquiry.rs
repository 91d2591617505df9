// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! INQUIRY fetch helpers shared by `sg_scan` and the SAT path.

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::{
    control_block::inquiry::{
        InquiryStandard, STANDARD_INQUIRY_LEN, build_inquiry_standard,
        build_inquiry_vpd, parse_inquiry_standard, parse_vpd_unit_serial,
    },
    device::SgDevice,
};

/// Largest single-byte allocation a 6-byte INQUIRY CDB can carry.
const MAX_INQ_ALLOC: u8 = 252;

/// Fetch and parse the standard INQUIRY data.
///
/// Issued twice when the device advertises more than the classic 36
/// bytes; the second fetch uses the advertised length.
pub fn standard_inquiry(dev: &SgDevice) -> Result<InquiryStandard> {
    let mut buf = vec![0u8; MAX_INQ_ALLOC as usize];
    let cdb = build_inquiry_standard(STANDARD_INQUIRY_LEN, 0);
    let got = dev
        .command_in(&cdb, &mut buf[..STANDARD_INQUIRY_LEN as usize])
        .context("standard INQUIRY failed")?;
    if got < STANDARD_INQUIRY_LEN as usize {
        bail!("standard INQUIRY returned only {got} bytes");
    }

    let advertised = buf[4] as usize + 5;
    if advertised > STANDARD_INQUIRY_LEN as usize {
        let want = advertised.min(MAX_INQ_ALLOC as usize);
        debug!(want, "re-issuing INQUIRY for full data");
        let cdb = build_inquiry_standard(want as u8, 0);
        dev.command_in(&cdb, &mut buf[..want])
            .context("full-length INQUIRY failed")?;
    }

    parse_inquiry_standard(&buf)
}

/// Fetch a VPD page, sized from the page header.
pub fn vpd_page(dev: &SgDevice, page: u8, max_alloc: u16) -> Result<Vec<u8>> {
    let mut probe = [0u8; 4];
    let cdb = build_inquiry_vpd(page, probe.len() as u16, 0);
    dev.command_in(&cdb, &mut probe)
        .with_context(|| format!("VPD page 0x{page:02x} probe failed"))?;
    if probe[1] != page {
        bail!(
            "device answered VPD probe for 0x{page:02x} with page 0x{:02x}",
            probe[1]
        );
    }

    let full = u16::from_be_bytes([probe[2], probe[3]])
        .saturating_add(4)
        .min(max_alloc.max(4));
    let mut buf = vec![0u8; full as usize];
    let cdb = build_inquiry_vpd(page, full, 0);
    let got = dev
        .command_in(&cdb, &mut buf)
        .with_context(|| format!("VPD page 0x{page:02x} fetch failed"))?;
    buf.truncate(got);
    Ok(buf)
}

/// VPD 0x80 unit serial as a trimmed string.
pub fn unit_serial(dev: &SgDevice, max_alloc: u16) -> Result<String> {
    let buf = vpd_page(dev, 0x80, max_alloc)?;
    parse_vpd_unit_serial(&buf)
}
