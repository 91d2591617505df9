// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// ASC/ASCQ additional-sense description table.
pub mod asc_ascq;
/// ATA IDENTIFY DEVICE data decoding (SAT tunnel).
pub mod ata;
/// SCSI status byte plus SG host/driver completion codes.
pub mod common;
/// Log page and log parameter (TLV record) decoding.
pub mod logs;
/// SCSI operation-code names for logging.
pub mod opcode;
/// REPORT LUNS data and SAM LUN addressing.
pub mod luns;
/// Mode parameter header, block descriptor and mode page decoding.
pub mod modes;
/// Sense-data normalization for both wire formats.
pub mod sense;
