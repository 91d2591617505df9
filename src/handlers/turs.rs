// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Repeated TEST UNIT READY for `sg_turs`.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use crate::{
    control_block::test_unit_ready::build_test_unit_ready,
    device::{CommandError, SgDevice},
};

/// Outcome of a TUR run.
#[derive(Debug, Clone)]
pub struct TursReport {
    pub completed: u64,
    pub not_ready: u64,
    /// Rendering of the last non-clean completion.
    pub last_failure: Option<String>,
    /// Last progress indication seen, as (numerator, 65536).
    pub progress: Option<u16>,
    pub elapsed: Duration,
}

impl TursReport {
    pub fn commands_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Issue `count` TEST UNIT READY commands, counting the ones that did
/// not come back clean. Transport and OS failures abort the loop; sense
/// answers (not ready, unit attention) are counted and the loop carries
/// on, matching the utility's use as a readiness poller.
pub fn run_turs(dev: &SgDevice, count: u64) -> Result<TursReport> {
    let cdb = build_test_unit_ready(0);
    let started = Instant::now();
    let mut report = TursReport {
        completed: 0,
        not_ready: 0,
        last_failure: None,
        progress: None,
        elapsed: Duration::ZERO,
    };

    for i in 0..count {
        match dev.command_none(&cdb) {
            Ok(()) => {},
            Err(CommandError::Sense(info)) => {
                report.not_ready += 1;
                if let Some(p) = info.sense.progress() {
                    report.progress = Some(p);
                    debug!(iteration = i, progress = p, "TUR progress indication");
                }
                report.last_failure = Some(info.sense.to_string());
            },
            Err(other) => {
                report.elapsed = started.elapsed();
                report.last_failure = Some(other.to_string());
                return Err(other.into());
            },
        }
        report.completed += 1;
    }

    report.elapsed = started.elapsed();
    Ok(report)
}
