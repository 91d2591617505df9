// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! CDB layout checks against the SPC/SBC/SAT byte tables.

use sg_utils_rs::control_block::{
    ata_passthrough::build_identify_device,
    inquiry::build_inquiry_standard,
    log_sense::{LogSenseOptions, PageControl, build_log_sense},
    read_buffer::{BufferMode, build_read_buffer},
    report_luns::{build_report_luns_simple},
    request_sense::build_request_sense,
    test_unit_ready::build_test_unit_ready,
    write_buffer::{WriteBufferMode, build_write_buffer},
    write_long::{WriteLongFlags, build_write_long10},
};

#[test]
fn test_six_byte_cdbs() {
    assert_eq!(build_test_unit_ready(0), [0, 0, 0, 0, 0, 0]);
    assert_eq!(
        build_request_sense(true, 252, 0),
        [0x03, 0x01, 0x00, 0x00, 252, 0x00]
    );
    assert_eq!(build_inquiry_standard(36, 0), [0x12, 0, 0, 0, 36, 0]);
}

#[test]
fn test_log_sense_page_and_pc() {
    let opts = LogSenseOptions {
        pc: PageControl::CumulativeValues,
        ..Default::default()
    };
    let cdb = build_log_sense(0x10, 0x00, opts, 0x1000, 0);
    assert_eq!(cdb[0], 0x4d);
    assert_eq!(cdb[2], 0x50); // PC=01b, page 0x10
    assert_eq!(&cdb[7..9], &[0x10, 0x00]);
}

#[test]
fn test_buffer_cdb_pairing() {
    // sg_test_rwbuf issues these back to back; offsets/lengths must agree
    let len = 0x000400u32;
    let w = build_write_buffer(WriteBufferMode::Data, 2, 0, len, 0);
    let r = build_read_buffer(BufferMode::Data, 2, 0, len, 0);
    assert_eq!((w[0], r[0]), (0x3b, 0x3c));
    assert_eq!(w[1], r[1]); // both mode 0x02
    assert_eq!(&w[6..9], &r[6..9]);
    assert_eq!(w[2], r[2]);
}

#[test]
fn test_write_long_flag_bits() {
    let cdb = build_write_long10(
        WriteLongFlags {
            cor_dis: true,
            wr_uncor: true,
            pblock: true,
        },
        0,
        520,
        0,
    );
    assert_eq!(cdb[1], 0xe0);
    assert_eq!(&cdb[7..9], &520u16.to_be_bytes());
}

#[test]
fn test_report_luns_simple() {
    let cdb = build_report_luns_simple(1024);
    assert_eq!(cdb.len(), 12);
    assert_eq!(cdb[0], 0xa0);
    assert_eq!(cdb[2], 0x00);
    assert_eq!(&cdb[6..10], &1024u32.to_be_bytes());
}

#[test]
fn test_identify_reaches_device_register_block() {
    let cdb = build_identify_device();
    assert_eq!(cdb.len(), 16);
    assert_eq!(cdb[14], 0xec);
    // PIO data-in with block-granular count of one 512-byte sector
    assert_eq!(cdb[6], 1);
}
