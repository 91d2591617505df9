// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Stream data out of a device's internal buffer (READ BUFFER) to
//! measure transport throughput without touching the medium.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_size, config::Config, logger::init_from_cli},
    device::SgDevice,
    handlers::buffer::{probe_descriptor, rbuf_run},
};

#[derive(Parser, Debug)]
#[command(
    name = "sg_rbuf",
    about = "Read a device's internal buffer repeatedly for throughput testing"
)]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// Total bytes to transfer (suffixes k/m/g)
    #[arg(short, long, default_value = "200m", value_parser = parse_size)]
    size: u64,

    /// Bytes per READ BUFFER command (default: the buffer capacity)
    #[arg(short, long, value_parser = parse_size)]
    buffer: Option<u64>,

    /// Buffer id (byte 2 of the CDB)
    #[arg(short, long, default_value_t = 0)]
    id: u8,

    /// Ask the driver not to copy data to user space (transport-only
    /// measurement)
    #[arg(short, long)]
    quick: bool,

    /// Only print the buffer descriptor and exit
    #[arg(short, long)]
    probe: bool,

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

    if cli.probe {
        let desc = probe_descriptor(&dev, false, cli.id)?;
        println!(
            "Buffer capacity {} bytes, offset alignment {} bytes",
            desc.capacity,
            desc.alignment()
        );
        return Ok(());
    }

    let segment = cli.buffer.map(|b| b.min(u32::MAX as u64) as u32);
    let report = rbuf_run(&mut dev, cli.size, segment, cli.id, cli.quick)?;
    println!(
        "Transferred {} bytes in {:.3} s ({:.2} MiB/s), {} bytes per command{}",
        report.bytes,
        report.elapsed.as_secs_f64(),
        report.mib_per_second(),
        report.segment,
        if cli.quick { " [no data copy]" } else { "" }
    );
    Ok(())
}
