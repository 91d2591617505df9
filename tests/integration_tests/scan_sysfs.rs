// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use sg_utils_rs::device::scan;

#[test]
#[serial]
fn test_enumerate_does_not_fail() {
    // works on any host: an absent class dir is an empty list
    let nodes = scan::enumerate().expect("sysfs walk");
    for node in nodes {
        assert!(node.name.starts_with("sg"), "{}", node.name);
        assert!(node.dev_path.starts_with("/dev"));
    }
}
