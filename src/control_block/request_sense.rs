// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! REQUEST SENSE — 6-byte CDB.
//!
//! CDB layout (SPC):
//!   [0] = 0x03 (REQUEST SENSE)
//!   [1] = DESC (bit 0), other bits reserved=0
//!   [2]..[3] = reserved (0)
//!   [4] = ALLOCATION LENGTH (number of bytes to return)
//!   [5] = CONTROL
//!
//! Notes:
//! - `desc=false` requests Fixed sense format; `desc=true` requests
//!   Descriptor format. The target may still choose format per its mode
//!   settings.

pub const REQUEST_SENSE: u8 = 0x03;

/// The allocation length the Seagate SCSI reference recommends.
pub const RECOMMENDED_ALLOC: u8 = 252;

/// Build a REQUEST SENSE (6) CDB.
#[inline]
pub fn build_request_sense(desc: bool, allocation_len: u8, control: u8) -> [u8; 6] {
    let mut cdb = [0u8; 6];
    cdb[0] = REQUEST_SENSE;
    cdb[1] = desc as u8; // DESC bit (bit 0)
    cdb[4] = allocation_len;
    cdb[5] = control;
    cdb
}

/// Convenience: DESC=0 (fixed format), CONTROL=0.
#[inline]
pub fn build_request_sense_simple(allocation_len: u8) -> [u8; 6] {
    build_request_sense(false, allocation_len, 0x00)
}
