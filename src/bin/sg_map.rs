// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Print the mapping between sg nodes and their primary block/tape
//! siblings, the way `sg_map` always has.

use anyhow::{Context, Result};
use clap::Parser;
use sg_utils_rs::{cfg::logger::init_from_cli, device::scan};

#[derive(Parser, Debug)]
#[command(name = "sg_map", about = "Map sg nodes to block/tape device nodes")]
struct Cli {
    /// Also print vendor/model/revision from sysfs
    #[arg(short, long)]
    inquiry: bool,

    /// Also print the H:C:T:L address and device type
    #[arg(short = 'x', long)]
    extra: bool,

    /// Logger config YAML
    #[arg(long)]
    log_config: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_from_cli(cli.log_config.as_deref())?;

    let nodes = scan::enumerate().context("scanning /sys/class/scsi_generic")?;
    if nodes.is_empty() {
        eprintln!("no sg devices found (is the sg module loaded?)");
        return Ok(());
    }

    for node in nodes {
        let mapped = node
            .primary_node()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!("{}  {}", node.dev_path.display(), mapped);
        if cli.extra {
            let hctl = node
                .hctl
                .map(|h| h.to_string())
                .unwrap_or_else(|| "?:?:?:?".to_string());
            let dtype = node
                .device_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string());
            line = format!("{line}  [{hctl} type {dtype}]");
        }
        if cli.inquiry {
            line = format!(
                "{line}  {}  {}  {}",
                node.vendor, node.model, node.revision
            );
        }
        println!("{line}");
    }
    Ok(())
}
