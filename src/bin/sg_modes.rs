// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Fetch and print mode pages (MODE SENSE 10/6).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_num_u8, config::Config, logger::init_from_cli},
    control_block::mod_sense::{PAGE_ALL, PageControl},
    device::SgDevice,
    handlers::modes::{ModeSenseOptions, mode_sense},
};

#[derive(Parser, Debug)]
#[command(name = "sg_modes", about = "Fetch and print SCSI mode pages")]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// Page (and optional subpage): PAGE or PAGE,SUBPAGE; hex accepted
    #[arg(short, long)]
    page: Option<String>,

    /// Fetch all pages (page code 0x3f)
    #[arg(short, long, conflicts_with = "page")]
    all: bool,

    /// Page control: 0 current, 1 changeable, 2 default, 3 saved
    #[arg(long, default_value_t = 0)]
    pc: u8,

    /// DBD: leave block descriptors out
    #[arg(short, long)]
    dbd: bool,

    /// Use MODE SENSE(6) only
    #[arg(long)]
    six: bool,

    /// Cap on the allocation length
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

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_from_cli(cli.log_config.as_deref())?;
    let config = Config::load_optional(cli.config.as_deref())
        .context("failed to resolve or load config")?;

    let mut dev = SgDevice::open_with(&cli.device, true, &config.device)?;
    if cli.verbose {
        dev.set_verbose(true);
    }

    let (page, subpage) = if cli.all {
        (PAGE_ALL, 0x00)
    } else {
        match &cli.page {
            Some(s) => match s.split_once(',') {
                Some((p, sp)) => (parse_num_u8(p)?, parse_num_u8(sp)?),
                None => (parse_num_u8(s)?, 0),
            },
            None => (PAGE_ALL, 0x00),
        }
    };

    let options = ModeSenseOptions {
        pc: match cli.pc {
            0 => PageControl::Current,
            1 => PageControl::Changeable,
            2 => PageControl::Default,
            3 => PageControl::Saved,
            _ => bail!("--pc must be 0..=3"),
        },
        dbd: cli.dbd,
        six_only: cli.six,
    };

    let max_alloc = cli.maxlen.unwrap_or(config.device.max_allocation_len);
    let data = mode_sense(&dev, page, subpage, options, max_alloc)?;
    print!("{data}");
    Ok(())
}
