// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Write a pseudo-random pattern into the device buffer, read it back
//! and verify (WRITE BUFFER / READ BUFFER).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_size, config::Config, logger::init_from_cli},
    device::SgDevice,
    handlers::buffer::test_rwbuf,
};

#[derive(Parser, Debug)]
#[command(
    name = "sg_test_rwbuf",
    about = "Exercise a device buffer with a write/read/verify cycle"
)]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// Bytes to write and verify (suffixes k/m/g)
    #[arg(short, long, value_parser = parse_size)]
    size: u64,

    /// Repeat the cycle this many times
    #[arg(short, long, default_value_t = 1)]
    times: u32,

    /// Seed for the pattern generator (varied per iteration)
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Use the echo buffer instead of the data buffer
    #[arg(short, long)]
    echo: bool,

    /// Buffer id (byte 2 of the CDB)
    #[arg(short, long, default_value_t = 0)]
    id: u8,

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

    let mut dev = SgDevice::open_with(&cli.device, false, &config.device)?;
    if cli.verbose {
        dev.set_verbose(true);
    }

    let size = cli.size.min(u32::MAX as u64) as u32;
    for run in 0..cli.times.max(1) {
        let report = test_rwbuf(&dev, size, cli.id, cli.seed ^ run as u64, cli.echo)?;
        match report.mismatch_at {
            None => {
                println!(
                    "run {}: {} bytes verified, crc32c 0x{:08x}",
                    run, report.bytes, report.crc
                );
            },
            Some(off) => {
                bail!(
                    "run {run}: readback differs at byte offset {off} \
                     (crc32c of pattern 0x{:08x})",
                    report.crc
                );
            },
        }
    }
    Ok(())
}
