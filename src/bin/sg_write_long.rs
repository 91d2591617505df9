// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Issue WRITE LONG, negotiating the device's long-block size.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{cli::parse_num, config::Config, logger::init_from_cli},
    control_block::write_long::WriteLongFlags,
    device::SgDevice,
    handlers::write_long::{WriteLongOutcome, WriteLongRequest, write_long},
};

#[derive(Parser, Debug)]
#[command(
    name = "sg_write_long",
    about = "Issue WRITE LONG (data + ECC) against one logical block"
)]
struct Cli {
    /// SG or block device node
    device: PathBuf,

    /// Logical block address to overwrite
    #[arg(short, long, value_parser = parse_num)]
    lba: u64,

    /// Transfer length in bytes (data + ECC); the classic guess is 520
    #[arg(short, long, default_value_t = 520)]
    xfer_len: u16,

    /// File providing the data; zeros when absent
    #[arg(short, long)]
    in_file: Option<PathBuf>,

    /// COR_DIS: disable correction on later reads of this block
    #[arg(long)]
    cor_dis: bool,

    /// WR_UNCOR: mark the block pseudo-uncorrectable (no data sent)
    #[arg(long)]
    wr_uncor: bool,

    /// PBLOCK: address a physical block
    #[arg(long)]
    pblock: bool,

    /// Retry once with the length the device reports via ILI
    #[arg(long)]
    fix: bool,

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

    let flags = WriteLongFlags {
        cor_dis: cli.cor_dis,
        wr_uncor: cli.wr_uncor,
        pblock: cli.pblock,
    };

    let data = if cli.wr_uncor {
        if cli.in_file.is_some() {
            bail!("--wr-uncor transfers no data; drop --in-file");
        }
        vec![]
    } else {
        match &cli.in_file {
            Some(path) => {
                let data = fs::read(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                if data.len() != cli.xfer_len as usize {
                    bail!(
                        "{} holds {} bytes, transfer length is {}",
                        path.display(),
                        data.len(),
                        cli.xfer_len
                    );
                }
                data
            },
            None => vec![0u8; cli.xfer_len as usize],
        }
    };

    let req = WriteLongRequest {
        lba: cli.lba,
        transfer_len: if cli.wr_uncor { 0 } else { cli.xfer_len },
        flags,
        fix: cli.fix,
    };

    match write_long(&dev, req, &data)? {
        WriteLongOutcome::Done => {
            println!("WRITE LONG at lba 0x{:x} completed", cli.lba);
        },
        WriteLongOutcome::WrongLength { correct_len } => {
            println!(
                "Device expects {correct_len} bytes (got {}); re-run with \
                 --xfer-len {correct_len} or --fix",
                cli.xfer_len
            );
        },
    }
    Ok(())
}
