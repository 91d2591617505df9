// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use hex_literal::hex;
use sg_utils_rs::models::sense::{SenseCategory, SenseData};

// Fixed format, ILLEGAL REQUEST / invalid field in cdb, SKSV pointing
// at CDB byte 2 (as a real target answers a bad LOG SENSE page).
const FIXED_INVALID_CDB: [u8; 18] =
    hex!("70 00 05 00 00 00 00 0a 00 00 00 00 24 00 00 c0 00 02");

#[test]
fn test_fixed_invalid_cdb_field() {
    let sense = SenseData::parse(&FIXED_INVALID_CDB).expect("parse");
    assert_eq!(sense.sense_key, 0x05);
    assert_eq!((sense.asc, sense.ascq), (0x24, 0x00));
    assert_eq!(sense.category(), SenseCategory::IllegalRequest);
    assert_eq!(sense.sks, Some([0xc0, 0x00, 0x02]));

    let text = sense.to_string();
    assert!(text.contains("Illegal Request"), "{text}");
    assert!(text.contains("Invalid field in cdb"), "{text}");
}

#[test]
fn test_fixed_unit_attention_power_on() {
    let sense = hex!("70 00 06 00 00 00 00 0a 00 00 00 00 29 00 00 00 00 00");
    let s = SenseData::parse(&sense).expect("parse");
    assert_eq!(s.category(), SenseCategory::UnitAttention);
    assert!(
        s.additional_str().contains("Power on"),
        "{}",
        s.additional_str()
    );
}

#[test]
fn test_deferred_fixed_format() {
    let mut sense = FIXED_INVALID_CDB;
    sense[0] = 0x71;
    let s = SenseData::parse(&sense).expect("parse");
    assert!(s.deferred);
    assert!(s.to_string().contains("deferred"));
}

#[test]
fn test_descriptor_format_with_info() {
    // 0x72, MEDIUM ERROR, unrecovered read error, one information
    // descriptor carrying the failing LBA
    let mut buf = hex!("72 03 11 00 00 00 00 0c").to_vec();
    buf.extend_from_slice(&hex!("00 0a 80 00 00 00 00 00 00 12 d6 87"));
    let s = SenseData::parse(&buf).expect("parse");
    assert_eq!(s.category(), SenseCategory::MediumOrHardware);
    assert!(s.info_valid);
    assert_eq!(s.information, 0x12d687);
    assert!(s.to_string().contains("Unrecovered read error"));
}

#[test]
fn test_write_long_ili_answer() {
    // the sg_write_long negotiation: ILI + VALID, information holds
    // requested-correct = 512 - 520 = -8
    let mut sense = FIXED_INVALID_CDB;
    sense[0] = 0xf0;
    sense[2] = 0x25; // ILI | ILLEGAL REQUEST
    sense[3..7].copy_from_slice(&(-8i32 as u32).to_be_bytes());
    let s = SenseData::parse(&sense).expect("parse");
    assert!(s.ili && s.info_valid);
    assert_eq!(s.information as u32 as i32, -8);
}

#[test]
fn test_vendor_asc_fallback() {
    let mut sense = FIXED_INVALID_CDB;
    sense[12] = 0x80;
    sense[13] = 0x12;
    let s = SenseData::parse(&sense).expect("parse");
    assert!(s.additional_str().contains("vendor specific"));
}

#[test]
fn test_short_and_garbage_buffers() {
    assert!(SenseData::parse(&[0x70, 0x00]).is_err());
    assert!(SenseData::parse(&hex!("7f 00 00 00 00 00 00 00")).is_err());
}
