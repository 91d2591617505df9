// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Names for the SCSI operation codes the utilities issue, used when
//! logging CDBs and reporting failed commands.

/// Human-readable name for a CDB's first byte.
///
/// Service-action qualified opcodes (0x9e) are resolved with the second
/// byte's low 5 bits.
pub fn opcode_name(cdb: &[u8]) -> &'static str {
    let Some(&op) = cdb.first() else {
        return "(empty CDB)";
    };
    match op {
        0x00 => "TEST UNIT READY",
        0x03 => "REQUEST SENSE",
        0x08 => "READ(6)",
        0x0a => "WRITE(6)",
        0x12 => "INQUIRY",
        0x15 => "MODE SELECT(6)",
        0x1a => "MODE SENSE(6)",
        0x25 => "READ CAPACITY(10)",
        0x28 => "READ(10)",
        0x2a => "WRITE(10)",
        0x2f => "VERIFY(10)",
        0x35 => "SYNCHRONIZE CACHE(10)",
        0x3b => "WRITE BUFFER",
        0x3c => "READ BUFFER(10)",
        0x3e => "READ LONG(10)",
        0x3f => "WRITE LONG(10)",
        0x4c => "LOG SELECT",
        0x4d => "LOG SENSE",
        0x55 => "MODE SELECT(10)",
        0x5a => "MODE SENSE(10)",
        0x85 => "ATA PASS-THROUGH(16)",
        0x88 => "READ(16)",
        0x8a => "WRITE(16)",
        0x9e => match cdb.get(1).map(|b| b & 0x1f) {
            Some(0x10) => "READ CAPACITY(16)",
            Some(0x11) => "READ LONG(16)",
            _ => "SERVICE ACTION IN(16)",
        },
        0x9f => match cdb.get(1).map(|b| b & 0x1f) {
            Some(0x11) => "WRITE LONG(16)",
            _ => "SERVICE ACTION OUT(16)",
        },
        0xa0 => "REPORT LUNS",
        0xa1 => "ATA PASS-THROUGH(12)",
        0xa3 => "MAINTENANCE IN",
        _ => "(unknown opcode)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_opcodes() {
        assert_eq!(opcode_name(&[0x12, 0, 0, 0, 36, 0]), "INQUIRY");
        assert_eq!(opcode_name(&[0x4d]), "LOG SENSE");
        assert_eq!(opcode_name(&[]), "(empty CDB)");
    }

    #[test]
    fn test_service_action() {
        assert_eq!(opcode_name(&[0x9e, 0x10]), "READ CAPACITY(16)");
        assert_eq!(opcode_name(&[0x9f, 0x11]), "WRITE LONG(16)");
        assert_eq!(opcode_name(&[0x9e]), "SERVICE ACTION IN(16)");
    }
}
