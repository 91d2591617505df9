// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LOG SENSE fetch and rendering for `sg_logs`.

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    control_block::log_sense::{LogSenseOptions, build_log_sense},
    device::SgDevice,
    models::logs::{LogPage, standard, vendor},
    utils::hex_dump,
};

/// Fetch one log page, sizing the second read from the 4-byte header
/// probe and capping it at `max_alloc`.
pub fn fetch_log_page(
    dev: &SgDevice,
    page: u8,
    subpage: u8,
    options: LogSenseOptions,
    max_alloc: u16,
) -> Result<LogPage> {
    let mut probe = [0u8; 4];
    let cdb = build_log_sense(page, subpage, options, probe.len() as u16, 0);
    dev.command_in(&cdb, &mut probe)
        .with_context(|| format!("LOG SENSE probe for page 0x{page:02x} failed"))?;

    let declared = u16::from_be_bytes([probe[2], probe[3]]);
    let full = declared.saturating_add(4).min(max_alloc.max(4));
    debug!(page, subpage, declared, full, "log page sized");

    let mut buf = vec![0u8; full as usize];
    let cdb = build_log_sense(page, subpage, options, full, 0);
    let got = dev
        .command_in(&cdb, &mut buf)
        .with_context(|| format!("LOG SENSE for page 0x{page:02x} failed"))?;
    buf.truncate(got);

    LogPage::parse(&buf)
        .with_context(|| format!("decoding log page 0x{page:02x}"))
}

/// The (page, subpage) pairs the device advertises, from page 0x00.
///
/// Tries the 0x00/0xff supported-subpages variant first and falls back
/// to the plain page list when the device rejects it.
pub fn supported_pages(
    dev: &SgDevice,
    options: LogSenseOptions,
    max_alloc: u16,
) -> Result<Vec<(u8, u8)>> {
    match fetch_log_page(
        dev,
        standard::PAGE_SUPPORTED,
        standard::SUBPAGE_ALL,
        options,
        max_alloc,
    ) {
        Ok(page) => {
            if let Some(Ok(standard::DecodedPage::Supported(s))) =
                standard::decode(&page)
            {
                return Ok(s.pairs);
            }
            debug!("0x00/0xff answer undecodable, falling back to page list");
        },
        Err(err) => {
            debug!("supported-subpages fetch failed ({err:#}), falling back");
        },
    }

    let page =
        fetch_log_page(dev, standard::PAGE_SUPPORTED, 0x00, options, max_alloc)?;
    match standard::decode(&page) {
        Some(Ok(standard::DecodedPage::Supported(s))) => Ok(s.pairs),
        Some(Err(err)) => Err(err.context("decoding supported pages")),
        _ => Ok(vec![]),
    }
}

/// Render one page: typed decoder, then vendor decoder, then the hex
/// fallback (header line plus parameter dump, or a raw dump when the
/// parameters themselves do not parse).
pub fn render_page(page: &LogPage, vendor_id: &str) -> String {
    if let Some(decoded) = standard::decode(page) {
        match decoded {
            Ok(d) => return d.to_string(),
            Err(err) => {
                return format!(
                    "{} [0x{:02x}]: malformed: {err:#}\n{}",
                    page.name(),
                    page.page,
                    hex_dump(&page.data)
                );
            },
        }
    }

    if let Some(result) = vendor::decode(vendor_id, page) {
        match result {
            Ok(text) => return text,
            Err(err) => {
                return format!(
                    "Vendor page [0x{:02x}]: malformed: {err:#}\n{}",
                    page.page,
                    hex_dump(&page.data)
                );
            },
        }
    }

    let header = if page.spf {
        format!("{} [0x{:02x},0x{:02x}]:\n", page.name(), page.page, page.subpage)
    } else {
        format!("{} [0x{:02x}]:\n", page.name(), page.page)
    };
    match page.params() {
        Ok(params) if !params.is_empty() => {
            format!("{header}{}", standard::render_params_hex(&params))
        },
        _ => format!("{header}{}", hex_dump(&page.data)),
    }
}
