// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Device handles and command submission.

/// /sys/class/scsi_generic enumeration and node mapping.
pub mod scan;
/// The `sg_io_hdr` mirror and the SG_IO ioctl wrapper.
pub mod sg_io;

use std::{
    fs::{File, OpenOptions},
    os::unix::{fs::OpenOptionsExt, io::AsRawFd},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    cfg::config::DeviceConfig,
    models::{
        common::{DriverStatus, HostStatus, ScsiStatus},
        opcode::opcode_name,
        sense::{SenseCategory, SenseData, SenseInfo},
    },
};

pub use sg_io::{DataDirection, SgFlags};

/// Why a submitted command did not complete cleanly.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The device returned CHECK CONDITION with parseable sense data.
    #[error("{0}")]
    Sense(#[from] SenseInfo),
    /// The device returned a non-GOOD status without usable sense.
    #[error("SCSI status: {status}")]
    Status { status: ScsiStatus },
    /// The host adapter or mid-level driver failed the command.
    #[error("transport error: host {host}, driver {driver}")]
    Transport {
        host: HostStatus,
        driver: DriverStatus,
    },
    /// The ioctl itself failed.
    #[error("SG_IO ioctl failed: {0}")]
    Os(#[from] std::io::Error),
}

impl CommandError {
    /// The `sg_err_category3`-style classification the binaries print.
    pub fn category(&self) -> &'static str {
        match self {
            CommandError::Sense(info) => match info.sense.category() {
                SenseCategory::NotReady => "not ready",
                SenseCategory::MediumOrHardware => "medium or hardware error",
                SenseCategory::IllegalRequest => "illegal request",
                SenseCategory::UnitAttention => "unit attention",
                SenseCategory::AbortedCommand => "aborted command",
                _ => "sense",
            },
            CommandError::Status { .. } => "status",
            CommandError::Transport { .. } => "transport",
            CommandError::Os(_) => "os",
        }
    }

    /// The normalized sense, when this failure carries one.
    pub fn sense(&self) -> Option<&SenseData> {
        match self {
            CommandError::Sense(info) => Some(&info.sense),
            _ => None,
        }
    }
}

/// One completed command: transferred length plus everything the driver
/// reported. `sense` is set for clean-with-sense completions (recovered
/// errors, CK_COND ATA returns).
#[derive(Debug, Clone)]
pub struct IoOutcome {
    pub transferred: usize,
    pub status: ScsiStatus,
    pub host_status: HostStatus,
    pub driver_status: DriverStatus,
    pub sense: Option<SenseData>,
    pub duration: Duration,
}

/// An opened SG or block device node ready for pass-through.
#[derive(Debug)]
pub struct SgDevice {
    file: File,
    path: PathBuf,
    /// `SG_GET_VERSION_NUM` answer; `None` for block nodes.
    sg_version: Option<i32>,
    timeout: Duration,
    sense_len: u8,
    verbose: bool,
    flags: SgFlags,
}

/// sg driver versions older than 3.0 do not speak `sg_io_hdr`.
const MIN_SG_VERSION: i32 = 30000;

impl SgDevice {
    /// Open read-write (O_NONBLOCK keeps tape/changer nodes from
    /// stalling the open).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, false, &DeviceConfig::default())
    }

    /// Open read-only; sufficient for all the query utilities.
    pub fn open_ro<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, true, &DeviceConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        read_only: bool,
        cfg: &DeviceConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .with_context(|| format!("cannot open {}", path.display()))?;

        let sg_version = sg_io::sg_version(file.as_raw_fd())
            .with_context(|| format!("SG_GET_VERSION_NUM on {}", path.display()))?;
        if let Some(v) = sg_version
            && v < MIN_SG_VERSION
        {
            anyhow::bail!(
                "{} speaks sg driver version {v}, need >= {MIN_SG_VERSION}",
                path.display()
            );
        }

        Ok(Self {
            file,
            path,
            sg_version,
            timeout: cfg.timeout,
            sense_len: cfg.sense_len,
            verbose: cfg.verbose.map(|v| v.as_bool()).unwrap_or(false),
            flags: SgFlags::empty(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this is a real sg character node (not a block device).
    pub fn is_sg_node(&self) -> bool {
        self.sg_version.is_some()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_flags(&mut self, flags: SgFlags) {
        self.flags = flags;
    }

    /// Submit a CDB and classify the completion.
    ///
    /// GOOD and recovered-error completions come back as `Ok`; CHECK
    /// CONDITION with any other sense category, transport failures and
    /// ioctl errors are `Err`.
    pub fn execute(
        &self,
        cdb: &[u8],
        mut dir: DataDirection<'_>,
    ) -> Result<IoOutcome, CommandError> {
        let mut sense_buf = vec![0u8; self.sense_len as usize];
        let timeout_ms = self.timeout.as_millis().min(u32::MAX as u128) as u32;

        if self.verbose {
            debug!(
                device = %self.path.display(),
                cdb = %hex::encode(cdb),
                op = opcode_name(cdb),
                "submitting"
            );
        }

        let raw = sg_io::submit(
            self.file.as_raw_fd(),
            cdb,
            &mut dir,
            &mut sense_buf,
            timeout_ms,
            self.flags,
        )?;

        let status = ScsiStatus::from(raw.status);
        let host_status = HostStatus(raw.host_status);
        let driver_status = DriverStatus(raw.driver_status);

        let sense = (raw.sense_written >= 8)
            .then(|| SenseData::parse(&sense_buf[..raw.sense_written]).ok())
            .flatten();

        if self.verbose {
            debug!(
                device = %self.path.display(),
                op = opcode_name(cdb),
                ?status,
                transferred = raw.transferred,
                duration_ms = raw.duration_ms,
                "completed"
            );
        }

        let outcome = IoOutcome {
            transferred: raw.transferred,
            status,
            host_status,
            driver_status,
            sense: sense.clone(),
            duration: Duration::from_millis(raw.duration_ms as u64),
        };

        // DRIVER_SENSE with valid sense counts as a sense completion even
        // when the host reported an error alongside it.
        let sense_completion = status == ScsiStatus::CheckCondition
            || driver_status.has_sense();

        if sense_completion {
            if let Some(sense) = sense {
                return match sense.category() {
                    SenseCategory::Clean | SenseCategory::RecoveredError => {
                        if sense.category() == SenseCategory::RecoveredError {
                            warn!(
                                device = %self.path.display(),
                                op = opcode_name(cdb),
                                "recovered error: {}", sense.additional_str()
                            );
                        }
                        Ok(outcome)
                    },
                    _ => Err(CommandError::Sense(SenseInfo { sense })),
                };
            }
            return Err(CommandError::Status { status });
        }

        if !host_status.is_ok() || !driver_status.is_ok() {
            return Err(CommandError::Transport {
                host: host_status,
                driver: driver_status,
            });
        }

        if status != ScsiStatus::Good && status != ScsiStatus::ConditionMet {
            return Err(CommandError::Status { status });
        }

        Ok(outcome)
    }

    /// Data-in convenience wrapper: returns the byte count transferred.
    pub fn command_in(
        &self,
        cdb: &[u8],
        buf: &mut [u8],
    ) -> Result<usize, CommandError> {
        let outcome = self.execute(cdb, DataDirection::In(buf))?;
        Ok(outcome.transferred)
    }

    /// Data-out convenience wrapper.
    pub fn command_out(
        &self,
        cdb: &[u8],
        data: &[u8],
    ) -> Result<(), CommandError> {
        self.execute(cdb, DataDirection::Out(data))?;
        Ok(())
    }

    /// No-data convenience wrapper.
    pub fn command_none(&self, cdb: &[u8]) -> Result<(), CommandError> {
        self.execute(cdb, DataDirection::None)?;
        Ok(())
    }
}
