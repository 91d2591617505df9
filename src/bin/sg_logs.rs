// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Fetch and decode SCSI log pages (LOG SENSE).

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_num_u8, config::Config, logger::init_from_cli},
    control_block::log_sense::{LogSenseOptions, PageControl},
    device::SgDevice,
    handlers::{inquiry::standard_inquiry, logs},
    utils::hex_dump,
};

#[derive(Parser, Debug)]
#[command(name = "sg_logs", about = "Fetch and decode SCSI log pages")]
struct Cli {
    /// SG or block device node (e.g. /dev/sg0, /dev/sda)
    device: PathBuf,

    /// Page (and optional subpage): PAGE or PAGE,SUBPAGE; hex accepted
    #[arg(short, long)]
    page: Option<String>,

    /// Fetch every page the device advertises
    #[arg(short, long, conflicts_with = "page")]
    all: bool,

    /// Hex dump instead of decoding
    #[arg(short = 'H', long)]
    hex: bool,

    /// Write the raw page bytes to stdout
    #[arg(short, long, conflicts_with = "hex")]
    raw: bool,

    /// Page control: 0 threshold, 1 cumulative, 2 default threshold,
    /// 3 default cumulative
    #[arg(long, default_value_t = 1)]
    pc: u8,

    /// PPC bit: only parameters changed since the last LOG SELECT
    #[arg(long)]
    ppc: bool,

    /// SP bit: ask the device to save the parameters
    #[arg(long)]
    sp: bool,

    /// Cap on the allocation length for a single fetch
    #[arg(short, long)]
    maxlen: Option<u16>,

    /// Log every CDB and completion
    #[arg(short, long)]
    verbose: bool,

    /// Runtime config YAML
    #[arg(long)]
    config: Option<String>,

    /// Logger config YAML
    #[arg(long)]
    log_config: Option<String>,
}

fn parse_page_arg(s: &str) -> Result<(u8, u8)> {
    match s.split_once(',') {
        Some((p, sp)) => Ok((parse_num_u8(p)?, parse_num_u8(sp)?)),
        None => Ok((parse_num_u8(s)?, 0)),
    }
}

fn page_control(v: u8) -> Result<PageControl> {
    Ok(match v {
        0 => PageControl::ThresholdValues,
        1 => PageControl::CumulativeValues,
        2 => PageControl::DefaultThresholds,
        3 => PageControl::DefaultCumulative,
        _ => bail!("--pc must be 0..=3"),
    })
}

fn emit(cli: &Cli, page: &sg_utils_rs::models::logs::LogPage, vendor: &str) -> Result<()> {
    if cli.raw {
        // reconstitute the wire form: header then parameters
        let mut out = vec![
            (page.page & 0x3f)
                | if page.spf { 0x40 } else { 0 }
                | if page.saved { 0 } else { 0x80 },
            page.subpage,
        ];
        out.extend_from_slice(&(page.data.len() as u16).to_be_bytes());
        out.extend_from_slice(&page.data);
        std::io::stdout()
            .write_all(&out)
            .context("writing raw page")?;
        return Ok(());
    }
    if cli.hex {
        println!(
            "{} [0x{:02x},0x{:02x}]:",
            page.name(),
            page.page,
            page.subpage
        );
        print!("{}", hex_dump(&page.data));
        return Ok(());
    }
    print!("{}", logs::render_page(page, vendor));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_from_cli(cli.log_config.as_deref())?;
    let config = Config::load_optional(cli.config.as_deref())
        .context("failed to resolve or load config")?;

    let mut dev = SgDevice::open_with(&cli.device, true, &config.device)?;
    if cli.verbose {
        dev.set_verbose(true);
    }
    let max_alloc = cli.maxlen.unwrap_or(config.device.max_allocation_len);

    let options = LogSenseOptions {
        pc: page_control(cli.pc)?,
        ppc: cli.ppc,
        sp: cli.sp,
        parameter_pointer: 0,
    };

    let inq = standard_inquiry(&dev)
        .context("INQUIRY failed; is this a SCSI device?")?;
    if !cli.raw {
        println!(
            "    {}  {}  {}",
            inq.vendor_id, inq.product_id, inq.product_rev
        );
    }

    if cli.all {
        let pairs = logs::supported_pages(&dev, options, max_alloc)?;
        for (p, sp) in pairs {
            match logs::fetch_log_page(&dev, p, sp, options, max_alloc) {
                Ok(page) => emit(&cli, &page, &inq.vendor_id)?,
                Err(err) => {
                    eprintln!("page 0x{p:02x},0x{sp:02x} failed: {err:#}");
                },
            }
        }
        return Ok(());
    }

    let (page_code, subpage) = match &cli.page {
        Some(s) => parse_page_arg(s)?,
        // no page named: show what the device supports
        None => (0x00, 0x00),
    };
    let page = logs::fetch_log_page(&dev, page_code, subpage, options, max_alloc)?;
    emit(&cli, &page, &inq.vendor_id)
}
