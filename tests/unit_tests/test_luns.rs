// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use hex_literal::hex;
use sg_utils_rs::models::luns::{Lun, LunAddressing, LunList};

#[test]
fn test_typical_target_answer() {
    // three peripheral luns 0..2 as a LIO target reports them
    let mut buf = hex!("00 00 00 18 00 00 00 00").to_vec();
    buf.extend_from_slice(&hex!("00 00 00 00 00 00 00 00"));
    buf.extend_from_slice(&hex!("00 01 00 00 00 00 00 00"));
    buf.extend_from_slice(&hex!("00 02 00 00 00 00 00 00"));

    let list = LunList::parse(&buf).expect("parse");
    assert_eq!(list.luns.len(), 3);
    assert!(!list.truncated);
    let ordinaries: Vec<_> = list.luns.iter().map(|l| l.ordinary()).collect();
    assert_eq!(ordinaries, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn test_addressing_methods() {
    assert_eq!(
        Lun(hex!("00 05 00 00 00 00 00 00")).addressing(),
        LunAddressing::Peripheral {
            bus: 0,
            target_or_lun: 5
        }
    );
    assert_eq!(
        Lun(hex!("41 02 00 00 00 00 00 00")).addressing(),
        LunAddressing::Flat(0x0102)
    );
    assert_eq!(
        Lun(hex!("8a 03 00 00 00 00 00 00")).addressing(),
        LunAddressing::LogicalUnit {
            bus: 1,
            target: 2,
            lun: 3
        }
    );
    assert!(matches!(
        Lun(hex!("c1 00 00 00 00 00 00 00")).addressing(),
        LunAddressing::Extended { .. }
    ));
}

#[test]
fn test_display_forms() {
    let lun = Lun(hex!("40 2a 00 00 00 00 00 00"));
    let text = lun.to_string();
    assert!(text.starts_with("402a000000000000"), "{text}");
    assert!(text.contains("flat space, lun 42"), "{text}");
}

#[test]
fn test_ordering_by_dense_form() {
    let mut luns = vec![
        Lun(hex!("00 02 00 00 00 00 00 00")),
        Lun(hex!("00 00 00 00 00 00 00 00")),
        Lun(hex!("00 01 00 00 00 00 00 00")),
    ];
    luns.sort_by_key(|l| l.as_u64());
    let ids: Vec<_> = luns.iter().map(|l| l.ordinary()).collect();
    assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
}
