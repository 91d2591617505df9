// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scan the sg nodes on this host, optionally confirming each with a
//! live INQUIRY over SG_IO.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use sg_utils_rs::{
    cfg::{config::Config, logger::init_from_cli},
    control_block::inquiry::PERIPHERAL_DEVICE_TYPE_TEXT,
    device::{SgDevice, scan},
    handlers::inquiry::{standard_inquiry, unit_serial},
};

#[derive(Parser, Debug)]
#[command(name = "sg_scan", about = "Scan and identify sg devices")]
struct Cli {
    /// Issue a live INQUIRY instead of trusting sysfs
    #[arg(short, long)]
    inquiry: bool,

    /// Also fetch the unit serial number (VPD 0x80); implies --inquiry
    #[arg(short, long)]
    serial: bool,

    /// Emit one JSON document instead of text lines
    #[arg(short, long)]
    json: bool,

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

    let nodes = scan::enumerate().context("scanning /sys/class/scsi_generic")?;
    if nodes.is_empty() {
        eprintln!("no sg devices found (is the sg module loaded?)");
        return Ok(());
    }

    let live = cli.inquiry || cli.serial;
    let mut json_nodes = vec![];

    for node in &nodes {
        let hctl = node
            .hctl
            .map(|h| h.to_string())
            .unwrap_or_else(|| "?:?:?:?".to_string());
        let type_text = node
            .device_type
            .map(|t| PERIPHERAL_DEVICE_TYPE_TEXT[(t & 0x1f) as usize])
            .unwrap_or("Unknown");

        let (mut vendor, mut model, mut rev) = (
            node.vendor.clone(),
            node.model.clone(),
            node.revision.clone(),
        );
        let mut serial = None;

        if live {
            match SgDevice::open_with(&node.dev_path, true, &config.device) {
                Ok(dev) => {
                    match standard_inquiry(&dev) {
                        Ok(inq) => {
                            vendor = inq.vendor_id;
                            model = inq.product_id;
                            rev = inq.product_rev;
                        },
                        Err(err) => eprintln!(
                            "{}: INQUIRY failed: {err:#}",
                            node.dev_path.display()
                        ),
                    }
                    if cli.serial {
                        serial = unit_serial(&dev, config.device.max_allocation_len)
                            .ok();
                    }
                },
                Err(err) => {
                    eprintln!("{}: {err:#}", node.dev_path.display());
                },
            }
        }

        if cli.json {
            json_nodes.push(json!({
                "node": node.dev_path,
                "hctl": node.hctl,
                "type": node.device_type,
                "type_text": type_text,
                "vendor": vendor,
                "model": model,
                "revision": rev,
                "serial": serial,
                "mapped": node.primary_node(),
            }));
            continue;
        }

        let mut line = format!(
            "{}: scsi {hctl} [{type_text}]  {vendor}  {model}  {rev}",
            node.dev_path.display()
        );
        if let Some(sn) = serial {
            line = format!("{line}  sn={sn}");
        }
        println!("{line}");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json!({ "devices": json_nodes }))?);
    }
    Ok(())
}
