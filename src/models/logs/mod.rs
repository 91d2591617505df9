// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LOG SENSE response decoding (SPC-4 § 7.3).
//!
//! A log page is a 4-byte header followed by a sequence of variable-length
//! parameter records: 2-byte big-endian parameter code, 1-byte control,
//! 1-byte length, then the payload. The sequence runs until the page
//! length from the header is exhausted.

/// Typed decoders for the standard (SPC/SBC) pages.
pub mod standard;
/// Decoders for vendor-specific pages, keyed on the INQUIRY vendor id.
pub mod vendor;

use anyhow::{Result, bail};
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::{BigEndian, U16},
};

/// 4-byte log page header.
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug)]
struct RawPageHeader {
    page_byte: u8,    // DS(7) SPF(6) PAGE CODE(5:0)
    subpage_code: u8,
    page_len: U16<BigEndian>,
}

/// 4-byte log parameter header preceding each payload.
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug)]
struct RawParamHeader {
    code: U16<BigEndian>,
    control: u8,
    len: u8,
}

/// Threshold comparison criterion (control byte bits 3:2, gated on ETC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// ETC clear: values are never compared.
    Never,
    Always,
    Eq,
    Ne,
    Gt,
}

/// Parameter payload format (control byte bits 1:0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFormat {
    BoundedCounter,
    AsciiList,
    UnboundedCounter,
    BinaryList,
}

/// One decoded log parameter record.
#[derive(Debug, Clone)]
pub struct LogParameter {
    pub code: u16,
    /// DU: the cumulative value is only updated by LOG SELECT.
    pub update_disabled: bool,
    /// Inverse of TSD: the device saves this parameter on its own.
    pub target_save: bool,
    pub threshold_comparison: Condition,
    pub format: ParamFormat,
    pub value: Vec<u8>,
}

impl LogParameter {
    /// Big-endian counter value, for the counter formats.
    pub fn counter(&self) -> Option<u64> {
        match self.format {
            ParamFormat::BoundedCounter | ParamFormat::UnboundedCounter => {
                crate::utils::be_counter(&self.value)
            },
            _ => None,
        }
    }
}

/// A parsed log page: header fields plus the raw parameter bytes.
#[derive(Debug, Clone)]
pub struct LogPage {
    pub page: u8,
    pub subpage: u8,
    /// SPF bit: the subpage code byte is meaningful.
    pub spf: bool,
    /// Inverse of the DS bit: LOG SENSE with SP=1 saves this page.
    pub saved: bool,
    pub data: Vec<u8>,
}

impl LogPage {
    /// Parse the page header and take ownership of the parameter bytes.
    ///
    /// The buffer may be longer than the page (allocation slack); it must
    /// not be shorter than the header-declared length.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let Ok((hdr, _rest)) = RawPageHeader::ref_from_prefix(buf) else {
            bail!("log page truncated: {} bytes, need 4", buf.len());
        };
        let page_len = hdr.page_len.get() as usize;
        if buf.len() < 4 + page_len {
            bail!(
                "log page truncated: header declares {page_len} bytes, only {} present",
                buf.len() - 4
            );
        }
        let spf = hdr.page_byte & 0x40 != 0;
        if !spf && hdr.subpage_code != 0 {
            bail!(
                "subpage 0x{:02x} present but SPF clear",
                hdr.subpage_code
            );
        }
        Ok(Self {
            page: hdr.page_byte & 0x3f,
            subpage: hdr.subpage_code,
            spf,
            saved: hdr.page_byte & 0x80 == 0,
            data: buf[4..4 + page_len].to_vec(),
        })
    }

    /// Iterate the parameter records.
    ///
    /// Pages that do not hold parameters (0x00 holds a bare page-code
    /// list) should not be walked with this. A record spanning past the
    /// page is an error naming the offending offset.
    pub fn params(&self) -> Result<Vec<LogParameter>> {
        let mut params = vec![];
        let len = self.data.len();
        let mut off = 0usize;
        while off < len {
            let Ok((hdr, _rest)) = RawParamHeader::ref_from_prefix(&self.data[off..])
            else {
                bail!("log parameter header truncated at offset {}", off + 4);
            };
            let plen = hdr.len as usize;
            let body = off + 4;
            if body + plen > len {
                bail!(
                    "log parameter 0x{:04x} at offset {} runs past the page \
                     ({} payload bytes, {} remain)",
                    hdr.code.get(),
                    body + 4,
                    plen,
                    len - body
                );
            }

            let control = hdr.control;
            params.push(LogParameter {
                code: hdr.code.get(),
                update_disabled: control & 0x80 != 0,
                target_save: control & 0x20 == 0,
                threshold_comparison: {
                    use Condition::*;
                    match (control & 0x10 != 0, (control >> 2) & 0x03) {
                        (false, _) => Never,
                        (true, 0b00) => Always,
                        (true, 0b01) => Eq,
                        (true, 0b10) => Ne,
                        _ => Gt,
                    }
                },
                format: match control & 0x03 {
                    0b00 => ParamFormat::BoundedCounter,
                    0b01 => ParamFormat::AsciiList,
                    0b10 => ParamFormat::UnboundedCounter,
                    _ => ParamFormat::BinaryList,
                },
                value: self.data[body..body + plen].to_vec(),
            });

            off = body + plen;
        }
        Ok(params)
    }

    /// Standard page name (page code only; subpages share the name).
    pub fn name(&self) -> &'static str {
        page_name(self.page)
    }
}

/// SPC/SBC log page names for the codes the utilities print.
pub fn page_name(page: u8) -> &'static str {
    match page {
        0x00 => "Supported log pages",
        0x01 => "Buffer over-run/under-run",
        0x02 => "Write error counters",
        0x03 => "Read error counters",
        0x04 => "Read reverse error counters",
        0x05 => "Verify error counters",
        0x06 => "Non-medium errors",
        0x07 => "Last n error events",
        0x08 => "Format status",
        0x0b => "Last n deferred errors or asynchronous events",
        0x0c => "Sequential access device",
        0x0d => "Temperature",
        0x0e => "Start-stop cycle counter",
        0x0f => "Application client",
        0x10 => "Self-test results",
        0x11 => "Solid state media",
        0x15 => "Background scan results",
        0x17 => "Non-volatile cache",
        0x18 => "Protocol specific port",
        0x1a => "Power condition transitions",
        0x2f => "Informational exceptions",
        0x30..=0x3e => "Vendor specific",
        _ => "Reserved or unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_params(page: u8, params: &[(u16, u8, &[u8])]) -> Vec<u8> {
        let mut body = vec![];
        for (code, control, value) in params {
            body.extend_from_slice(&code.to_be_bytes());
            body.push(*control);
            body.push(value.len() as u8);
            body.extend_from_slice(value);
        }
        let mut buf = vec![page & 0x3f, 0x00];
        buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
        buf.extend_from_slice(&body);
        buf
    }

    #[test]
    fn test_parse_header() {
        let buf = page_with_params(0x02, &[]);
        let page = LogPage::parse(&buf).expect("parse");
        assert_eq!(page.page, 0x02);
        assert!(page.saved);
        assert!(!page.spf);
        assert_eq!(page.name(), "Write error counters");
    }

    #[test]
    fn test_param_iteration() {
        let buf = page_with_params(
            0x02,
            &[
                (0x0000, 0x00, &[0x00, 0x05]),
                (0x0003, 0x02, &[0x00, 0x00, 0x01, 0x00]),
            ],
        );
        let page = LogPage::parse(&buf).expect("parse");
        let params = page.params().expect("params");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].code, 0);
        assert_eq!(params[0].counter(), Some(5));
        assert_eq!(params[1].code, 3);
        assert_eq!(params[1].format, ParamFormat::UnboundedCounter);
        assert_eq!(params[1].counter(), Some(256));
    }

    #[test]
    fn test_param_past_end_rejected() {
        // header claims 8 bytes of payload but the page ends after 2
        let mut buf = vec![0x02, 0x00, 0x00, 0x06];
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x08, 0xaa, 0xbb]);
        let page = LogPage::parse(&buf).expect("parse");
        let err = page.params().expect_err("must reject");
        assert!(err.to_string().contains("runs past the page"), "{err}");
    }

    #[test]
    fn test_subpage_without_spf_rejected() {
        let buf = vec![0x0d, 0x01, 0x00, 0x00];
        assert!(LogPage::parse(&buf).is_err());
    }

    #[test]
    fn test_truncated_page_rejected() {
        let buf = vec![0x0d, 0x00, 0x00, 0x10, 0xaa];
        assert!(LogPage::parse(&buf).is_err());
    }

    #[test]
    fn test_control_bits() {
        let buf = page_with_params(0x02, &[(0x0001, 0b1011_0101, &[0x01])]);
        let page = LogPage::parse(&buf).expect("parse");
        let p = &page.params().expect("params")[0];
        assert!(p.update_disabled);
        assert!(!p.target_save); // TSD set
        assert_eq!(p.threshold_comparison, Condition::Eq);
        assert_eq!(p.format, ParamFormat::AsciiList);
    }
}
