// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use sg_utils_rs::handlers::turs::run_turs;

use crate::integration_tests::common::test_device;

#[test]
#[serial]
fn test_turs_burst() {
    let Some(dev) = test_device() else { return };
    let report = run_turs(&dev, 64).expect("TUR burst");
    assert_eq!(report.completed, 64);
}
