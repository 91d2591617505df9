//! This crate provides Linux SG (SCSI generic) pass-through utilities.
// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Handles configuration, command-line helpers, and logging.
pub mod cfg;
/// Implements various SCSI commands (control blocks).
pub mod control_block;
/// Opens device nodes and submits commands through the SG_IO ioctl.
pub mod device;
/// Contains high-level handlers, one per utility operation.
pub mod handlers;
/// Defines the data structures decoded from SCSI response buffers.
pub mod models;
/// Provides utility functions used throughout the crate.
pub mod utils;
