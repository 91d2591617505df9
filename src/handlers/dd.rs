// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The `sgs_dd` copy engine: moves data between an SG device and a
//! regular file with a bounded number of SG_IO commands in flight.
//!
//! Each transfer unit is `blocks_per_transfer` logical blocks. Units are
//! issued in LBA order but complete out of order; file I/O uses
//! positioned reads/writes so completion order does not matter. A
//! semaphore caps the outstanding commands at `queue_depth`, the same
//! bound the original applies to its queued sg packets.

use std::{
    os::unix::fs::FileExt,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use bytes::BytesMut;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    cfg::config::DeviceConfig,
    control_block::{
        common::{build_read10, build_read16, build_write10, build_write16},
        read_capacity::{
            build_read_capacity10, build_read_capacity16, parse_read_capacity10,
            parse_read_capacity16,
        },
    },
    device::SgDevice,
};

/// One side of the copy.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// An SG/block node driven with READ/WRITE pass-through.
    Sg(PathBuf),
    /// A regular file accessed with positioned I/O.
    File(PathBuf),
    /// Discard (output only).
    Null,
}

impl Endpoint {
    /// `sgs_dd` argument form: `-` and `/dev/null` discard.
    pub fn parse(s: &str, device_hint: bool) -> Self {
        match s {
            "-" | "/dev/null" => Endpoint::Null,
            _ if device_hint => Endpoint::Sg(PathBuf::from(s)),
            _ => Endpoint::File(PathBuf::from(s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DdOptions {
    pub input: Endpoint,
    pub output: Endpoint,
    /// Logical block size; corrected from READ CAPACITY when they differ.
    pub block_size: u32,
    pub blocks_per_transfer: u32,
    /// Blocks to move; `None` = to the end of the input.
    pub count: Option<u64>,
    /// Input blocks to skip.
    pub skip: u64,
    /// Output blocks to skip past.
    pub seek: u64,
    pub queue_depth: u16,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Default)]
pub struct DdReport {
    pub blocks_in: u64,
    pub blocks_out: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl DdReport {
    pub fn mib_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.bytes as f64 / (1024.0 * 1024.0)) / secs
        } else {
            0.0
        }
    }
}

/// READ CAPACITY(10), stepping up to (16) for >2TB devices.
pub fn device_capacity(dev: &SgDevice) -> Result<(u64, u32)> {
    let mut buf = [0u8; 8];
    dev.command_in(&build_read_capacity10(0, false, 0), &mut buf)
        .context("READ CAPACITY(10) failed")?;
    let rc = parse_read_capacity10(&buf)?;
    if !rc.indicates_overflow() {
        return Ok((rc.max_lba.get() as u64 + 1, rc.block_len.get()));
    }

    let mut buf = [0u8; 32];
    dev.command_in(&build_read_capacity16(0, false, 32, 0), &mut buf)
        .context("READ CAPACITY(16) failed")?;
    let rc = parse_read_capacity16(&buf)?;
    Ok((rc.max_lba.get() + 1, rc.block_len.get()))
}

fn read_cdb(lba: u64, blocks: u32) -> Vec<u8> {
    if lba + blocks as u64 > u32::MAX as u64 || blocks > u16::MAX as u32 {
        build_read16(lba, blocks, 0, 0).to_vec()
    } else {
        build_read10(lba as u32, blocks as u16, 0, 0).to_vec()
    }
}

fn write_cdb(lba: u64, blocks: u32) -> Vec<u8> {
    if lba + blocks as u64 > u32::MAX as u64 || blocks > u16::MAX as u32 {
        build_write16(lba, blocks, 0, 0).to_vec()
    } else {
        build_write10(lba as u32, blocks as u16, 0, 0).to_vec()
    }
}

struct Plan {
    dev: Arc<SgDevice>,
    file: Option<Arc<std::fs::File>>,
    /// True: sg -> file/null; false: file -> sg.
    reading: bool,
    block_size: u32,
    total_blocks: u64,
    dev_start_lba: u64,
    file_start_block: u64,
}

fn build_plan(opts: &DdOptions) -> Result<Plan> {
    let (sg_path, reading) = match (&opts.input, &opts.output) {
        (Endpoint::Sg(p), Endpoint::File(_) | Endpoint::Null) => (p.clone(), true),
        (Endpoint::File(_), Endpoint::Sg(p)) => (p.clone(), false),
        (Endpoint::Sg(_), Endpoint::Sg(_)) => {
            bail!("sg-to-sg copies are not supported; stage through a file")
        },
        _ => bail!("exactly one of if=/of= must be an sg device"),
    };

    let dev = SgDevice::open_with(&sg_path, false, &opts.device)?;
    let (dev_blocks, dev_block_len) = device_capacity(&dev)?;
    let block_size = if dev_block_len != opts.block_size {
        warn!(
            configured = opts.block_size,
            device = dev_block_len,
            "block size corrected from READ CAPACITY"
        );
        dev_block_len
    } else {
        opts.block_size
    };

    let (file, file_blocks, dev_start_lba, file_start_block) = match (
        &opts.input,
        &opts.output,
    ) {
        (Endpoint::Sg(_), Endpoint::File(p)) => {
            let f = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(opts.seek == 0)
                .open(p)
                .with_context(|| format!("cannot open {}", p.display()))?;
            (Some(Arc::new(f)), None, opts.skip, opts.seek)
        },
        (Endpoint::Sg(_), Endpoint::Null) => (None, None, opts.skip, 0),
        (Endpoint::File(p), Endpoint::Sg(_)) => {
            let f = std::fs::File::open(p)
                .with_context(|| format!("cannot open {}", p.display()))?;
            let len = f.metadata()?.len();
            let blocks = len / block_size as u64;
            if blocks <= opts.skip {
                bail!("skip={} is past the end of the input file", opts.skip);
            }
            (Some(Arc::new(f)), Some(blocks - opts.skip), opts.seek, opts.skip)
        },
        _ => unreachable!(),
    };

    let dev_avail = dev_blocks.saturating_sub(dev_start_lba);
    if dev_avail == 0 {
        bail!("device window is empty (skip/seek past the last LBA)");
    }

    let mut total_blocks = dev_avail;
    if let Some(fb) = file_blocks {
        total_blocks = total_blocks.min(fb);
    }
    if let Some(c) = opts.count {
        total_blocks = total_blocks.min(c);
    }

    Ok(Plan {
        dev: Arc::new(dev),
        file,
        reading,
        block_size,
        total_blocks,
        dev_start_lba,
        file_start_block,
    })
}

/// One transfer unit, run on the blocking pool: the pass-through command
/// plus the matching positioned file I/O. `block_offset` is the unit's
/// position within the copy window, in blocks.
fn run_unit(plan: &Plan, block_offset: u64, lba: u64, blocks: u32) -> Result<u64> {
    let bs = plan.block_size as usize;
    let len = blocks as usize * bs;
    let file_offset = (plan.file_start_block + block_offset) * bs as u64;

    if plan.reading {
        let mut buf = BytesMut::zeroed(len);
        let got = plan
            .dev
            .command_in(&read_cdb(lba, blocks), &mut buf)
            .with_context(|| format!("READ at lba {lba} failed"))?;
        if got < len {
            bail!("short read at lba {lba}: {got} of {len} bytes");
        }
        if let Some(file) = &plan.file {
            file.write_all_at(&buf, file_offset)
                .with_context(|| format!("file write at offset {file_offset}"))?;
        }
    } else {
        let mut buf = BytesMut::zeroed(len);
        let file = plan.file.as_ref().expect("write path always has a file");
        file.read_exact_at(&mut buf, file_offset)
            .with_context(|| format!("file read at offset {file_offset}"))?;
        plan.dev
            .command_out(&write_cdb(lba, blocks), &buf)
            .with_context(|| format!("WRITE at lba {lba} failed"))?;
    }
    Ok(blocks as u64)
}

/// Run the copy. `cancel` stops new submissions; units already in
/// flight are drained before returning.
pub async fn copy(opts: DdOptions, cancel: CancellationToken) -> Result<DdReport> {
    if opts.block_size == 0 || opts.blocks_per_transfer == 0 {
        bail!("bs and bpt must both be non-zero");
    }

    let plan = Arc::new(build_plan(&opts)?);
    let bpt = opts.blocks_per_transfer as u64;
    let n_units = plan.total_blocks.div_ceil(bpt);
    info!(
        blocks = plan.total_blocks,
        block_size = plan.block_size,
        units = n_units,
        queue_depth = opts.queue_depth,
        reading = plan.reading,
        "starting copy"
    );

    let semaphore = Arc::new(Semaphore::new(opts.queue_depth as usize));
    let mut join_set: JoinSet<Result<u64>> = JoinSet::new();
    let started = Instant::now();
    let mut moved = 0u64;
    let mut first_error: Option<anyhow::Error> = None;

    let mut drain =
        |set: &mut JoinSet<Result<u64>>, moved: &mut u64, res: Result<u64>| match res {
            Ok(blocks) => *moved += blocks,
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                    cancel.cancel();
                }
                set.abort_all();
            },
        };

    for unit in 0..n_units {
        if cancel.is_cancelled() {
            debug!(unit, "cancelled, no further submissions");
            break;
        }

        // back-pressure: wait for a slot before building the next unit
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore never closed");

        while let Some(res) = join_set.try_join_next() {
            match res {
                Ok(inner) => drain(&mut join_set, &mut moved, inner),
                Err(join_err) if join_err.is_cancelled() => {},
                Err(join_err) => {
                    drain(&mut join_set, &mut moved, Err(join_err.into()))
                },
            }
        }

        let plan = plan.clone();
        let block_offset = unit * bpt;
        let lba = plan.dev_start_lba + block_offset;
        let blocks = bpt.min(plan.total_blocks - block_offset) as u32;
        join_set.spawn(async move {
            let res = tokio::task::spawn_blocking(move || {
                run_unit(&plan, block_offset, lba, blocks)
            })
            .await
            .map_err(anyhow::Error::from)?;
            drop(permit);
            res
        });
    }

    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(inner) => drain(&mut join_set, &mut moved, inner),
            Err(join_err) if join_err.is_cancelled() => {},
            Err(join_err) => drain(&mut join_set, &mut moved, Err(join_err.into())),
        }
    }

    if let Some(err) = first_error {
        return Err(err.context(format!("copy aborted after {moved} blocks")));
    }

    let wrote_somewhere = plan.file.is_some() || !plan.reading;
    Ok(DdReport {
        blocks_in: moved,
        blocks_out: if wrote_somewhere { moved } else { 0 },
        bytes: moved * plan.block_size as u64,
        elapsed: started.elapsed(),
    })
}
