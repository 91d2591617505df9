// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The live tests need a disposable SCSI device; point
//! `SG_UTILS_TEST_DEV` at one (e.g. a scsi_debug node) to enable them.

use sg_utils_rs::device::SgDevice;

pub fn test_device() -> Option<SgDevice> {
    let path = std::env::var("SG_UTILS_TEST_DEV").ok()?;
    match SgDevice::open_ro(&path) {
        Ok(dev) => Some(dev),
        Err(err) => {
            eprintln!("skipping: cannot open {path}: {err:#}");
            None
        },
    }
}
