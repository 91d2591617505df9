// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Raw `SG_IO` submission: the `sg_io_hdr` mirror from `<scsi/sg.h>` and
//! a thin, unsafe-contained wrapper around the ioctl itself.

use std::{io, os::unix::io::RawFd, ptr};

use bitflags::bitflags;
use libc::{c_int, c_uchar, c_uint, c_ushort, c_void};

#[cfg(not(target_env = "musl"))]
const SG_IO: libc::c_ulong = 0x2285;
#[cfg(target_env = "musl")]
const SG_IO: c_int = 0x2285;

#[cfg(not(target_env = "musl"))]
const SG_GET_VERSION_NUM: libc::c_ulong = 0x2282;
#[cfg(target_env = "musl")]
const SG_GET_VERSION_NUM: c_int = 0x2282;

// dxfer_direction values (scsi/sg.h SG_DXFER_*)
const SG_DXFER_NONE: c_int = -1;
const SG_DXFER_TO_DEV: c_int = -2;
const SG_DXFER_FROM_DEV: c_int = -3;

bitflags! {
    /// `sg_io_hdr.flags` (scsi/sg.h SG_FLAG_*).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SgFlags: c_uint {
        /// Bypass the block layer's bounce buffer.
        const DIRECT_IO = 0x01;
        /// Do not interpret the buffer as a scatter-gather list.
        const UNUSED_LUN_INHIBIT = 0x02;
        /// Memory-map the transfer (reserved buffer only).
        const MMAP_IO = 0x04;
        /// No transfer of kernel buffers to/from user space.
        const NO_DXFER = 0x10000;
    }
}

/// Data transfer direction
#[derive(Debug)]
pub enum DataDirection<'a> {
    None,
    /// Device-to-host transfer into the provided buffer.
    In(&'a mut [u8]),
    /// Host-to-device transfer from the provided buffer.
    Out(&'a [u8]),
}

// see scsi/sg.h
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Debug)]
struct sg_io_hdr {
    interface_id: c_int,    // [i] 'S' for SCSI generic (required)
    dxfer_direction: c_int, // [i] data transfer direction
    cmd_len: c_uchar,       // [i] SCSI command length ( <= 16 bytes)
    mx_sb_len: c_uchar,     // [i] max length to write to sbp
    iovec_count: c_ushort,  // [i] 0 implies no scatter gather
    dxfer_len: c_uint,      // [i] byte count of data transfer
    dxferp: *mut c_void,    // [i] points to data transfer memory
    cmdp: *const c_uchar,   // [i] points to command to perform
    sbp: *mut c_uchar,      // [i] points to sense_buffer memory
    timeout: c_uint,        // [i] MAX_UINT->no timeout (unit: millisec)
    flags: c_uint,          // [i] 0 -> default, see SG_FLAG...
    pack_id: c_int,         // [i->o] unused internally (normally)
    usr_ptr: *mut c_void,   // [i->o] unused internally
    status: c_uchar,        // [o] scsi status
    masked_status: c_uchar, // [o] shifted, masked scsi status
    msg_status: c_uchar,    // [o] messaging level data (optional)
    sb_len_wr: c_uchar,     // [o] byte count actually written to sbp
    host_status: c_ushort,  // [o] errors from host adapter
    driver_status: c_ushort, // [o] errors from software driver
    resid: c_int,           // [o] dxfer_len - actual_transferred
    duration: c_uint,       // [o] time taken by cmd (unit: millisec)
    info: c_uint,           // [o] auxiliary information
}

/// Raw completion as the driver reported it.
#[derive(Debug, Clone)]
pub struct RawCompletion {
    pub status: u8,
    pub host_status: u16,
    pub driver_status: u16,
    /// Bytes actually moved (dxfer_len minus the clamped residual).
    pub transferred: usize,
    pub sense_written: usize,
    pub duration_ms: u32,
}

/// Submit one CDB through `SG_IO`. `sense_buf` receives whatever sense
/// bytes the driver hands back.
pub fn submit(
    fd: RawFd,
    cdb: &[u8],
    dir: &mut DataDirection<'_>,
    sense_buf: &mut [u8],
    timeout_ms: u32,
    flags: SgFlags,
) -> io::Result<RawCompletion> {
    debug_assert!(!cdb.is_empty() && cdb.len() <= 16);

    let (dxfer_direction, dxferp, dxfer_len) = match dir {
        DataDirection::None => (SG_DXFER_NONE, ptr::null_mut(), 0usize),
        DataDirection::In(buf) => (
            SG_DXFER_FROM_DEV,
            buf.as_mut_ptr() as *mut c_void,
            buf.len(),
        ),
        DataDirection::Out(buf) => (
            SG_DXFER_TO_DEV,
            buf.as_ptr() as *mut c_void,
            buf.len(),
        ),
    };

    let mut hdr = sg_io_hdr {
        interface_id: 'S' as c_int,
        dxfer_direction,
        cmd_len: cdb.len() as c_uchar,
        mx_sb_len: sense_buf.len() as c_uchar,
        iovec_count: 0,
        dxfer_len: dxfer_len as c_uint,
        dxferp,
        cmdp: cdb.as_ptr(),
        sbp: sense_buf.as_mut_ptr(),
        timeout: timeout_ms,
        flags: flags.bits(),
        pack_id: 0,
        usr_ptr: ptr::null_mut(),
        status: 0,
        masked_status: 0,
        msg_status: 0,
        sb_len_wr: 0,
        host_status: 0,
        driver_status: 0,
        resid: 0,
        duration: 0,
        info: 0,
    };

    // SAFETY: hdr points at live buffers for the duration of the call;
    // the kernel only writes within the lengths given above.
    let rc = unsafe { libc::ioctl(fd, SG_IO, &mut hdr) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }

    // resid only reports underruns in practice, but don't trust a
    // negative value from the driver either
    let resid = (hdr.resid.max(0) as usize).min(dxfer_len);

    Ok(RawCompletion {
        status: hdr.status,
        host_status: hdr.host_status,
        driver_status: hdr.driver_status,
        transferred: dxfer_len - resid,
        sense_written: (hdr.sb_len_wr as usize).min(sense_buf.len()),
        duration_ms: hdr.duration,
    })
}

/// `SG_GET_VERSION_NUM`: distinguishes true sg character nodes (version
/// >= 30000) from block nodes that merely accept SG_IO.
pub fn sg_version(fd: RawFd) -> io::Result<Option<i32>> {
    let mut version: c_int = 0;
    let rc = unsafe { libc::ioctl(fd, SG_GET_VERSION_NUM, &mut version) };
    if rc == -1 {
        let err = io::Error::last_os_error();
        // block devices answer ENOTTY here; that's not a failure
        if err.raw_os_error() == Some(libc::ENOTTY)
            || err.raw_os_error() == Some(libc::EINVAL)
        {
            return Ok(None);
        }
        return Err(err);
    }
    Ok(Some(version))
}
