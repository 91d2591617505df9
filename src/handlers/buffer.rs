// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Device-buffer commands: the `sg_rbuf` throughput loop and the
//! `sg_test_rwbuf` write/read/verify cycle.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rand::{RngExt, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    control_block::{
        read_buffer::{
            BufferDescriptor, BufferMode, build_read_buffer,
            parse_buffer_descriptor,
        },
        write_buffer::{WriteBufferMode, build_write_buffer},
    },
    device::{SgDevice, SgFlags},
};

/// Largest single READ BUFFER transfer the utilities attempt.
const MAX_SEGMENT: u32 = 1 << 20;

/// Fetch the buffer descriptor (capacity + offset alignment).
pub fn probe_descriptor(
    dev: &SgDevice,
    echo: bool,
    buffer_id: u8,
) -> Result<BufferDescriptor> {
    let mode = if echo {
        BufferMode::EchoBufferDescriptor
    } else {
        BufferMode::Descriptor
    };
    let mut buf = [0u8; 4];
    let cdb = build_read_buffer(mode, buffer_id, 0, buf.len() as u32, 0);
    dev.command_in(&cdb, &mut buf)
        .context("READ BUFFER (descriptor) failed")?;
    parse_buffer_descriptor(&buf)
}

#[derive(Debug, Clone)]
pub struct RbufReport {
    pub bytes: u64,
    pub segment: u32,
    pub elapsed: Duration,
}

impl RbufReport {
    pub fn mib_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.bytes as f64 / (1024.0 * 1024.0)) / secs
        } else {
            0.0
        }
    }
}

/// The `sg_rbuf` loop: repeatedly read the device buffer until `total`
/// bytes have been transferred.
///
/// With `quick` the driver is told not to copy data to user space
/// (SG_FLAG_NO_DXFER), which measures the transport rather than the
/// memcpy.
pub fn rbuf_run(
    dev: &mut SgDevice,
    total: u64,
    segment: Option<u32>,
    buffer_id: u8,
    quick: bool,
) -> Result<RbufReport> {
    let desc = probe_descriptor(dev, false, buffer_id)?;
    if desc.capacity == 0 {
        bail!("device reports a zero-capacity data buffer");
    }
    let segment = segment
        .unwrap_or(desc.capacity)
        .min(desc.capacity)
        .min(MAX_SEGMENT);
    debug!(capacity = desc.capacity, segment, "buffer descriptor");

    if quick {
        dev.set_flags(SgFlags::NO_DXFER);
    }

    let mut buf = vec![0u8; segment as usize];
    let started = Instant::now();
    let mut done = 0u64;
    while done < total {
        let this = (segment as u64).min(total - done) as usize;
        let cdb = build_read_buffer(BufferMode::Data, buffer_id, 0, this as u32, 0);
        dev.command_in(&cdb, &mut buf[..this])
            .context("READ BUFFER (data) failed")?;
        done += this as u64;
    }
    let elapsed = started.elapsed();

    if quick {
        dev.set_flags(SgFlags::empty());
    }

    Ok(RbufReport {
        bytes: done,
        segment,
        elapsed,
    })
}

#[derive(Debug, Clone)]
pub struct RwbufReport {
    pub bytes: u32,
    pub crc: u32,
    pub mismatch_at: Option<usize>,
}

impl RwbufReport {
    pub fn passed(&self) -> bool {
        self.mismatch_at.is_none()
    }
}

/// `sg_test_rwbuf`: write a seeded pseudo-random pattern into the device
/// buffer, read it back, and compare.
///
/// The comparison reports the first mismatching offset; the crc32c of
/// the pattern is included so runs can be correlated across hosts.
pub fn test_rwbuf(
    dev: &SgDevice,
    size: u32,
    buffer_id: u8,
    seed: u64,
    echo: bool,
) -> Result<RwbufReport> {
    let desc = probe_descriptor(dev, echo, buffer_id)?;
    if size > desc.capacity {
        bail!(
            "requested {size} bytes but the buffer holds {}",
            desc.capacity
        );
    }
    if size == 0 {
        bail!("zero-length buffer test");
    }

    let mut pattern = vec![0u8; size as usize];
    let mut rng = StdRng::seed_from_u64(seed);
    rng.fill(&mut pattern[..]);
    let crc = crc32c::crc32c(&pattern);

    let (wmode, rmode) = if echo {
        (WriteBufferMode::EchoBuffer, BufferMode::EchoBuffer)
    } else {
        (WriteBufferMode::Data, BufferMode::Data)
    };

    let cdb = build_write_buffer(wmode, buffer_id, 0, size, 0);
    dev.command_out(&cdb, &pattern)
        .context("WRITE BUFFER failed")?;

    let mut readback = vec![0u8; size as usize];
    let cdb = build_read_buffer(rmode, buffer_id, 0, size, 0);
    let got = dev
        .command_in(&cdb, &mut readback)
        .context("READ BUFFER failed")?;
    if got < size as usize {
        bail!("read back only {got} of {size} bytes");
    }

    let mismatch_at = pattern
        .iter()
        .zip(readback.iter())
        .position(|(a, b)| a != b);
    if mismatch_at.is_none() && crc32c::crc32c(&readback) != crc {
        // the byte compare and the checksum cannot disagree
        bail!("checksum mismatch without a byte mismatch");
    }

    info!(size, crc, ?mismatch_at, "buffer verify finished");
    Ok(RwbufReport {
        bytes: size,
        crc,
        mismatch_at,
    })
}
