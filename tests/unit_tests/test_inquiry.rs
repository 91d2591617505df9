// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use sg_utils_rs::control_block::inquiry::{
    parse_inquiry_standard, parse_vpd_device_id, parse_vpd_supported_pages,
    parse_vpd_unit_serial,
};

/// A realistic 96-byte standard INQUIRY from a SAS disk.
fn disk_inquiry() -> Vec<u8> {
    let mut b = vec![0u8; 96];
    b[0] = 0x00; // connected, disk
    b[2] = 0x06; // SPC-4
    b[3] = 0x12; // NORMACA | RDF=2
    b[4] = 91; // additional length
    b[8..16].copy_from_slice(b"SEAGATE ");
    b[16..32].copy_from_slice(b"ST4000NM0023    ");
    b[32..36].copy_from_slice(b"0004");
    b
}

#[test]
fn test_standard_inquiry_fields() {
    let s = parse_inquiry_standard(&disk_inquiry()).expect("parse");
    assert_eq!(s.peripheral_qualifier, 0);
    assert_eq!(s.device_type, 0x00);
    assert_eq!(s.device_type_str(), "Disk Drive");
    assert_eq!(s.version, 0x06);
    assert_eq!(s.response_data_format, 0x02);
    assert_eq!(s.additional_length, 91);
    assert_eq!(s.vendor_id, "SEAGATE");
    assert_eq!(s.product_id, "ST4000NM0023");
    assert_eq!(s.product_rev, "0004");
    assert!(!s.rmb);
}

#[test]
fn test_tape_device_type() {
    let mut b = disk_inquiry();
    b[0] = 0x01;
    b[1] = 0x80; // removable
    let s = parse_inquiry_standard(&b).expect("parse");
    assert_eq!(s.device_type_str(), "Tape Drive");
    assert!(s.rmb);
}

#[test]
fn test_vpd_pages_together() {
    let supported = [0x00, 0x00, 0x00, 0x03, 0x00, 0x80, 0x83];
    assert_eq!(
        parse_vpd_supported_pages(&supported).expect("supported"),
        vec![0x00, 0x80, 0x83]
    );

    let mut serial = vec![0x00, 0x80, 0x00, 0x08];
    serial.extend_from_slice(b"Z1Z2Q8A4");
    assert_eq!(parse_vpd_unit_serial(&serial).expect("serial"), "Z1Z2Q8A4");

    // NAA binary descriptor renders as hex
    let mut dev_id = vec![0x00, 0x83, 0x00, 0x0c];
    dev_id.extend_from_slice(&[0x01, 0x03, 0x00, 0x08]); // binary, NAA
    dev_id.extend_from_slice(&[0x50, 0x00, 0xc5, 0x00, 0x12, 0x34, 0x56, 0x78]);
    let descs = parse_vpd_device_id(&dev_id).expect("device id");
    assert_eq!(descs.len(), 1);
    assert_eq!(descs[0].id_type, 0x03);
    assert_eq!(descs[0].identifier, "5000c50012345678");
}

#[test]
fn test_vpd_wrong_page_rejected() {
    let serial = [0x00, 0x80, 0x00, 0x00];
    assert!(parse_vpd_supported_pages(&serial).is_err());
}

#[test]
fn test_truncated_vpd_rejected() {
    let buf = [0x00, 0x80, 0x00, 0x20, 0x41];
    assert!(parse_vpd_unit_serial(&buf).is_err());
}
