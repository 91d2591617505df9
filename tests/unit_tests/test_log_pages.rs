// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use sg_utils_rs::{
    handlers::logs::render_page,
    models::logs::{LogPage, ParamFormat, standard, vendor},
};

use crate::unit_tests::common::{counter, log_page_bytes};

#[test]
fn test_error_counter_page_end_to_end() {
    let buf = log_page_bytes(
        standard::PAGE_WRITE_ERRORS,
        0,
        &[
            (0x0002, 0x00, counter(7, 2)),
            (0x0003, 0x00, counter(12345, 4)),
            (0x0005, 0x00, counter(9_876_543_210, 6)),
            (0x0006, 0x00, counter(0, 2)),
        ],
    );
    let page = LogPage::parse(&buf).expect("parse");
    let text = render_page(&page, "ACME");
    assert!(text.contains("Write error counters:"), "{text}");
    assert!(text.contains("Total rewrites or rereads = 7"), "{text}");
    assert!(text.contains("Total errors corrected = 12345"), "{text}");
    assert!(text.contains("Total bytes processed = 9876543210"), "{text}");
    assert!(text.contains("Total uncorrected errors = 0"), "{text}");
}

#[test]
fn test_temperature_page_render() {
    let buf = log_page_bytes(
        standard::PAGE_TEMPERATURE,
        0,
        &[
            (0x0000, 0x00, vec![0x00, 38]),
            (0x0001, 0x00, vec![0x00, 65]),
        ],
    );
    let page = LogPage::parse(&buf).expect("parse");
    let text = render_page(&page, "");
    assert!(text.contains("Current temperature = 38 C"), "{text}");
    assert!(text.contains("Reference temperature = 65 C"), "{text}");
}

#[test]
fn test_self_test_page_render() {
    let mut entry = vec![0u8; 16];
    entry[0] = 0x15; // test code 0, result 5 (first segment failed)
    entry[2..4].copy_from_slice(&500u16.to_be_bytes());
    entry[4..12].copy_from_slice(&0x1000u64.to_be_bytes());
    entry[12] = 0x03;
    entry[13] = 0x11;
    entry[14] = 0x00;
    let buf = log_page_bytes(standard::PAGE_SELF_TEST, 0, &[(0x0001, 0x00, entry)]);
    let page = LogPage::parse(&buf).expect("parse");
    let text = render_page(&page, "");
    assert!(text.contains("first segment failed"), "{text}");
    assert!(text.contains("poh 500"), "{text}");
    assert!(text.contains("0x1000"), "{text}");
    assert!(text.contains("asc 0x11"), "{text}");
}

#[test]
fn test_vendor_page_dispatch_and_fallback() {
    let buf = log_page_bytes(
        vendor::SEAGATE_CACHE_PAGE,
        0,
        &[(0x0000, 0x00, counter(4096, 4))],
    );
    let page = LogPage::parse(&buf).expect("parse");

    let text = render_page(&page, "SEAGATE");
    assert!(text.contains("Blocks sent to initiator = 4096"), "{text}");

    // an unknown vendor gets the parameter hex fallback
    let text = render_page(&page, "NONAME");
    assert!(text.contains("Vendor specific"), "{text}");
    assert!(text.contains("param 0x0000"), "{text}");
}

#[test]
fn test_malformed_page_render_degrades_to_hex() {
    // parameter header claims 0x20 payload bytes that are not there
    let mut buf = vec![0x02, 0x00, 0x00, 0x06];
    buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x20, 0xde, 0xad]);
    let page = LogPage::parse(&buf).expect("header itself is fine");
    let text = render_page(&page, "");
    assert!(text.contains("malformed"), "{text}");
    assert!(text.contains("runs past the page"), "{text}");
}

#[test]
fn test_ascii_format_parameter() {
    let buf = log_page_bytes(
        0x0e,
        0,
        &[(0x0001, 0x01, b"201406".to_vec())],
    );
    let page = LogPage::parse(&buf).expect("parse");
    let params = page.params().expect("params");
    assert_eq!(params[0].format, ParamFormat::AsciiList);
    assert_eq!(params[0].counter(), None);
    let text = render_page(&page, "");
    assert!(text.contains("year: 2014"), "{text}");
}
