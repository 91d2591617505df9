// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use sg_utils_rs::handlers::inquiry::{standard_inquiry, vpd_page};

use crate::integration_tests::common::test_device;

#[test]
#[serial]
fn test_standard_inquiry_live() {
    let Some(dev) = test_device() else { return };
    let inq = standard_inquiry(&dev).expect("INQUIRY must work on any target");
    assert!(!inq.vendor_id.is_empty());
    assert!(inq.peripheral_qualifier <= 3);
}

#[test]
#[serial]
fn test_supported_vpd_live() {
    let Some(dev) = test_device() else { return };
    // page 0x00 is mandatory
    let buf = vpd_page(&dev, 0x00, 512).expect("VPD 0x00 is mandatory");
    assert_eq!(buf[1], 0x00);
}
