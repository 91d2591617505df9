// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Issue TEST UNIT READY commands, optionally in bulk for timing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_num, config::Config, logger::init_from_cli},
    device::SgDevice,
    handlers::turs::run_turs,
};

#[derive(Parser, Debug)]
#[command(name = "sg_turs", about = "Issue TEST UNIT READY commands")]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// Number of commands to issue
    #[arg(short, long, default_value = "1", value_parser = parse_num)]
    number: u64,

    /// Print the command rate when done
    #[arg(short, long)]
    time: bool,

    /// Print progress indication from sense data, when the device
    /// reports one
    #[arg(short, long)]
    progress: bool,

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

    let report = run_turs(&dev, cli.number.max(1))?;

    if report.not_ready > 0 {
        println!(
            "{} of {} commands answered with sense",
            report.not_ready, report.completed
        );
        if let Some(failure) = &report.last_failure {
            println!("{failure}");
        }
    } else {
        println!("Ready");
    }

    if cli.progress {
        match report.progress {
            Some(p) => {
                println!(
                    "Progress indication: {}% done",
                    (p as u32 * 100) / 65536
                );
            },
            None => println!("No progress indication reported"),
        }
    }

    if cli.time {
        println!(
            "{} commands in {:.3} s ({:.1} commands/s)",
            report.completed,
            report.elapsed.as_secs_f64(),
            report.commands_per_second()
        );
    }
    Ok(())
}
