// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Tunnel ATA IDENTIFY DEVICE through the SAT pass-through and decode
//! the result.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{config::Config, logger::init_from_cli},
    control_block::ata_passthrough::{build_check_power_mode, build_identify_device},
    device::{DataDirection, SgDevice},
    models::ata::{IDENTIFY_DATA_LEN, IdentifyDevice},
    utils::hex_dump,
};

#[derive(Parser, Debug)]
#[command(
    name = "sg_sat_identify",
    about = "ATA IDENTIFY DEVICE through the SCSI/ATA translation layer"
)]
struct Cli {
    /// SG or block device node fronted by a SAT layer
    device: PathBuf,

    /// Hex dump the raw 512-byte identify data instead of decoding
    #[arg(short = 'H', long)]
    hex: bool,

    /// Query CHECK POWER MODE instead of IDENTIFY DEVICE
    #[arg(short = 'p', long)]
    power: bool,

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

fn power_mode_str(count: u16) -> &'static str {
    match count & 0xff {
        0x00 => "standby",
        0x40 | 0x41 => "NV cache power mode",
        0x80 => "idle",
        0xff => "active or idle",
        _ => "unknown power mode",
    }
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

    if cli.power {
        // CK_COND makes the SATL answer with an ATA status-return
        // descriptor even on success
        let outcome = dev
            .execute(&build_check_power_mode(), DataDirection::None)
            .context("ATA PASS-THROUGH (CHECK POWER MODE) failed")?;
        let Some(ata) = outcome.sense.as_ref().and_then(|s| s.ata_return) else {
            bail!("SATL returned no ATA status descriptor; not a SAT device?");
        };
        println!(
            "CHECK POWER MODE: count 0x{:02x} => {}",
            ata.sector_count,
            power_mode_str(ata.sector_count)
        );
        return Ok(());
    }

    let mut buf = vec![0u8; IDENTIFY_DATA_LEN];
    dev.command_in(&build_identify_device(), &mut buf)
        .context("ATA PASS-THROUGH (IDENTIFY DEVICE) failed")?;

    if cli.hex {
        print!("{}", hex_dump(&buf));
        return Ok(());
    }
    let id = IdentifyDevice::parse(&buf)?;
    print!("{id}");
    Ok(())
}
