// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Report the logical units a SCSI target exposes (REPORT LUNS).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{config::Config, logger::init_from_cli},
    device::SgDevice,
    handlers::luns::report_luns,
};

#[derive(Parser, Debug)]
#[command(name = "sg_luns", about = "Report the logical units of a SCSI target")]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// SELECT REPORT: 0 addressed, 1 well-known, 2 all
    #[arg(short, long, default_value_t = 0)]
    select: u8,

    /// Only print the bare hex LUN values
    #[arg(short = 'H', long)]
    hex: bool,

    /// Cap on the allocation length
    #[arg(short, long)]
    maxlen: Option<u32>,

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

    if cli.select > 2 {
        bail!("--select must be 0, 1 or 2");
    }

    let mut dev = SgDevice::open_with(&cli.device, true, &config.device)?;
    if cli.verbose {
        dev.set_verbose(true);
    }

    let max_alloc = cli
        .maxlen
        .unwrap_or(config.device.max_allocation_len as u32);
    let list = report_luns(&dev, cli.select, max_alloc)?;

    if list.truncated {
        eprintln!(
            "warning: device declares {} bytes of LUN data, showing the first {}",
            list.declared_bytes,
            list.luns.len() * 8
        );
    }

    println!("Lun list length = {} ({} luns):", list.declared_bytes, list.luns.len());
    for lun in &list.luns {
        if cli.hex {
            let w = lun.as_words();
            println!("{:04x}{:04x}{:04x}{:04x}", w[0], w[1], w[2], w[3]);
        } else {
            println!("    {lun}");
        }
    }
    Ok(())
}
