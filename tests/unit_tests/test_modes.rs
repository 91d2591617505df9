// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use sg_utils_rs::models::modes::{ModeData, mode_page_name};

/// MODE SENSE(10) answer: header + block descriptor + caching page.
fn mode10_fixture() -> Vec<u8> {
    let mut buf = vec![0u8; 8];
    buf[2] = 0x00; // medium type
    buf[3] = 0x80; // WP
    buf[6..8].copy_from_slice(&8u16.to_be_bytes()); // block descriptor len
    // block descriptor: density 0, 0x10000 blocks, 512 bytes each
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00]);
    // caching page (0x08), 18 bytes of payload
    buf.push(0x08);
    buf.push(18);
    buf.extend_from_slice(&[0u8; 18]);
    let total = (buf.len() - 2) as u16;
    buf[0..2].copy_from_slice(&total.to_be_bytes());
    buf
}

#[test]
fn test_mode10_split() {
    let m = ModeData::parse(&mode10_fixture(), true).expect("parse");
    assert!(m.header.long_form);
    assert!(m.header.write_protect());
    assert_eq!(m.block_descriptors.len(), 1);
    assert_eq!(m.block_descriptors[0].number_of_blocks, 0x1_0000);
    assert_eq!(m.block_descriptors[0].block_length, 512);
    assert_eq!(m.pages.len(), 1);
    assert_eq!(m.pages[0].page, 0x08);
    assert_eq!(m.pages[0].data.len(), 18);
}

#[test]
fn test_render_names_pages() {
    let m = ModeData::parse(&mode10_fixture(), true).expect("parse");
    let text = m.to_string();
    assert!(text.contains("write protected"), "{text}");
    assert!(text.contains("Caching"), "{text}");
    assert!(text.contains("512 bytes"), "{text}");
}

#[test]
fn test_page_names() {
    assert_eq!(mode_page_name(0x08, 0), "Caching");
    assert_eq!(mode_page_name(0x1c, 1), "Background control");
    assert_eq!(mode_page_name(0x2a, 0), "Vendor specific");
}

#[test]
fn test_allocation_slack_tolerated() {
    let mut buf = mode10_fixture();
    buf.extend_from_slice(&[0u8; 64]); // slack past mode_data_len
    let m = ModeData::parse(&buf, true).expect("parse");
    assert_eq!(m.pages.len(), 1);
}
