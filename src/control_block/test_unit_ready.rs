// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TEST UNIT READY — 6-byte CDB, no data transfer.
//!
//! CDB layout (SPC):
//!   [0] = 0x00 (TEST UNIT READY)
//!   [1..4] = reserved
//!   [5] = CONTROL

pub const TEST_UNIT_READY: u8 = 0x00;

/// Build a TEST UNIT READY CDB.
#[inline]
pub fn build_test_unit_ready(control: u8) -> [u8; 6] {
    let mut cdb = [0u8; 6];
    cdb[0] = TEST_UNIT_READY;
    cdb[5] = control;
    cdb
}
