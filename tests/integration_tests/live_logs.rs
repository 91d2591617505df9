// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use sg_utils_rs::{
    control_block::log_sense::LogSenseOptions,
    handlers::logs::{fetch_log_page, supported_pages},
};

use crate::integration_tests::common::test_device;

#[test]
#[serial]
fn test_supported_pages_live() {
    let Some(dev) = test_device() else { return };
    let opts = LogSenseOptions::default();
    let pairs = supported_pages(&dev, opts, 0x1000).expect("page 0x00");
    // every target lists at least page 0x00 itself
    assert!(pairs.iter().any(|&(p, _)| p == 0x00));
}

#[test]
#[serial]
fn test_each_advertised_page_parses() {
    let Some(dev) = test_device() else { return };
    let opts = LogSenseOptions::default();
    let Ok(pairs) = supported_pages(&dev, opts, 0x1000) else {
        return;
    };
    for (page, subpage) in pairs {
        match fetch_log_page(&dev, page, subpage, opts, 0x1000) {
            Ok(parsed) => assert_eq!(parsed.page, page),
            // some devices advertise pages they then refuse; that's
            // their bug, not a parser failure
            Err(err) => eprintln!("page 0x{page:02x}: {err:#}"),
        }
    }
}
