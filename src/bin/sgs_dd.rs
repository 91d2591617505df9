// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! dd-style copy between an sg device and a file, with a bounded queue
//! of outstanding pass-through commands.

use std::os::unix::fs::FileTypeExt;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sg_utils_rs::{
    cfg::{
        cli::{parse_num, parse_size},
        config::Config,
        logger::init_from_cli,
    },
    handlers::dd::{DdOptions, Endpoint, copy},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "sgs_dd",
    about = "Copy between an sg device and a file with queued commands",
    after_help = "OPERANDS (dd style):\n  \
        if=FILE    input (sg node or regular file)\n  \
        of=FILE    output (sg node, regular file, - or /dev/null)\n  \
        bs=BYTES   logical block size (default from config)\n  \
        bpt=N      blocks per transfer unit\n  \
        count=N    blocks to copy\n  \
        skip=N     input blocks to skip\n  \
        seek=N     output blocks to skip\n  \
        qd=N       queued (outstanding) commands"
)]
struct Cli {
    /// dd-style operands, e.g. if=/dev/sg0 of=out.img bs=512 count=2048
    #[arg(required = true)]
    operands: Vec<String>,

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

fn classify(path: &str) -> Endpoint {
    if path == "-" || path == "/dev/null" {
        return Endpoint::Null;
    }
    let is_char_dev = std::fs::metadata(path)
        .map(|m| m.file_type().is_char_device())
        .unwrap_or(false);
    Endpoint::parse(path, is_char_dev)
}

fn build_options(cli: &Cli, config: &Config) -> Result<DdOptions> {
    let mut input = None;
    let mut output = None;
    let mut bs = config.dd.block_size;
    let mut bpt = config.dd.blocks_per_transfer;
    let mut count = None;
    let mut skip = 0;
    let mut seek = 0;
    let mut qd = config.dd.queue_depth;

    for op in &cli.operands {
        let Some((key, value)) = op.split_once('=') else {
            bail!("operand {op:?} is not of the form key=value");
        };
        match key {
            "if" => input = Some(classify(value)),
            "of" => output = Some(classify(value)),
            "bs" => bs = parse_size(value)?.min(u32::MAX as u64) as u32,
            "bpt" => bpt = parse_num(value)?.min(u32::MAX as u64) as u32,
            "count" => count = Some(parse_num(value)?),
            "skip" => skip = parse_num(value)?,
            "seek" => seek = parse_num(value)?,
            "qd" => qd = parse_num(value)?.clamp(1, 64) as u16,
            other => bail!("unknown operand {other:?}"),
        }
    }

    Ok(DdOptions {
        input: input.context("if= is required")?,
        output: output.context("of= is required")?,
        block_size: bs,
        blocks_per_transfer: bpt,
        count,
        skip,
        seek,
        queue_depth: qd,
        device: {
            let mut dev_cfg = config.device.clone();
            if cli.verbose {
                dev_cfg.verbose = Some(sg_utils_rs::cfg::enums::YesNo::Yes);
            }
            dev_cfg
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_from_cli(cli.log_config.as_deref())?;
    let config = Config::load_optional(cli.config.as_deref())
        .context("failed to resolve or load config")?;

    let opts = build_options(&cli, &config)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; draining commands in flight");
                cancel.cancel();
            }
        });
    }

    let report = copy(opts, cancel).await?;
    eprintln!(
        "{}+0 records in\n{}+0 records out\n{} bytes copied, {:.3} s, {:.2} MiB/s",
        report.blocks_in,
        report.blocks_out,
        report.bytes,
        report.elapsed.as_secs_f64(),
        report.mib_per_second()
    );
    Ok(())
}
