// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::cfg::enums::YesNo;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Parameters applied to every pass-through command.
    pub device: DeviceConfig,
    /// Settings for the `sgs_dd` copy engine.
    #[serde(default)]
    pub dd: DdConfig,
}

/// Pass-through defaults shared by all utilities.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DeviceConfig {
    #[serde(rename = "TimeoutSeconds", with = "serde_secs")]
    /// SG_IO command timeout.
    pub timeout: Duration,

    #[serde(rename = "SenseBufferLength")]
    /// Bytes reserved for returned sense data (18..=255).
    pub sense_len: u8,

    #[serde(rename = "MaxAllocationLength")]
    /// Upper bound for response allocation lengths negotiated from page
    /// headers (LOG SENSE / MODE SENSE re-reads).
    pub max_allocation_len: u16,

    #[serde(default, rename = "Verbose")]
    /// Log every CDB and completion at debug level.
    pub verbose: Option<YesNo>,
}

/// `sgs_dd` defaults; each is overridable on the command line.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DdConfig {
    #[serde(rename = "BlockSize")]
    /// Logical block size assumed before READ CAPACITY answers.
    pub block_size: u32,

    #[serde(rename = "BlocksPerTransfer")]
    /// Blocks moved by a single READ/WRITE command.
    pub blocks_per_transfer: u32,

    #[serde(rename = "QueueDepth")]
    /// Maximum commands kept outstanding against the device.
    pub queue_depth: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            sense_len: 64,
            max_allocation_len: 0xffff,
            verbose: None,
        }
    }
}

impl Default for DdConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            blocks_per_transfer: 128,
            queue_depth: 16,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            dd: DdConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Optional-config bootstrap used by the binaries: load and validate
    /// when a path is given, defaults otherwise.
    pub fn load_optional(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let resolved = crate::cfg::cli::resolve_config_path(p)?;
                Self::load_from_file(resolved)
            },
            None => Ok(Self::default()),
        }
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(
            self.device.timeout >= Duration::from_secs(1),
            "TimeoutSeconds must be >= 1"
        );
        ensure!(
            self.device.sense_len >= 18,
            "SenseBufferLength must be >= 18 (fixed-format minimum)"
        );
        ensure!(
            self.device.max_allocation_len >= 512,
            "MaxAllocationLength must be >= 512"
        );

        ensure!(self.dd.block_size >= 512, "BlockSize must be >= 512");
        ensure!(
            self.dd.block_size.is_multiple_of(512),
            "BlockSize must be a multiple of 512"
        );
        ensure!(
            self.dd.blocks_per_transfer >= 1,
            "BlocksPerTransfer must be >= 1"
        );

        // The SG driver rejects more than SG_MAX_QUEUE (16) commands per
        // fd; larger configured depths are clamped rather than rejected.
        if self.dd.queue_depth == 0 {
            self.dd.queue_depth = 1;
        }
        if self.dd.queue_depth > 64 {
            self.dd.queue_depth = 64;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.device.verbose.map(YesNo::as_bool).unwrap_or(false)
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
