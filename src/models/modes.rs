// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MODE SENSE parameter data (SPC-4 § 7.5): mode parameter header (6- or
//! 10-byte form), optional block descriptors, then mode pages.

use core::fmt;

use anyhow::{Result, bail};
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::{BigEndian, U16},
};

/// 10-byte header returned by MODE SENSE(10).
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug, Clone, Copy)]
pub struct RawModeHeader10 {
    pub mode_data_len: U16<BigEndian>,
    pub medium_type: u8,
    pub dev_specific: u8,
    reserved4: [u8; 2],
    pub block_descriptor_len: U16<BigEndian>,
}

/// 4-byte header returned by MODE SENSE(6).
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Debug, Clone, Copy)]
pub struct RawModeHeader6 {
    pub mode_data_len: u8,
    pub medium_type: u8,
    pub dev_specific: u8,
    pub block_descriptor_len: u8,
}

/// Header-form independent view.
#[derive(Debug, Clone, Copy)]
pub struct ModeHeader {
    pub long_form: bool,
    pub mode_data_len: u16,
    pub medium_type: u8,
    pub dev_specific: u8,
    pub block_descriptor_len: u16,
}

impl ModeHeader {
    /// Device-specific parameter bit 7 for direct-access devices.
    pub fn write_protect(&self) -> bool {
        self.dev_specific & 0x80 != 0
    }
}

/// 8-byte general block descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub density_code: u8,
    pub number_of_blocks: u32,
    pub block_length: u32,
}

/// One mode page: code/subpage plus its parameter bytes.
#[derive(Debug, Clone)]
pub struct ModePage {
    pub page: u8,
    pub subpage: u8,
    /// PS bit: the page can be saved.
    pub saveable: bool,
    pub data: Vec<u8>,
}

/// Fully split MODE SENSE response.
#[derive(Debug, Clone)]
pub struct ModeData {
    pub header: ModeHeader,
    pub block_descriptors: Vec<BlockDescriptor>,
    pub pages: Vec<ModePage>,
}

pub fn mode_page_name(page: u8, subpage: u8) -> &'static str {
    match (page, subpage) {
        (0x01, 0x00) => "Read-write error recovery",
        (0x02, 0x00) => "Disconnect-reconnect",
        (0x03, 0x00) => "Format (obsolete)",
        (0x04, 0x00) => "Rigid disk geometry (obsolete)",
        (0x05, 0x00) => "Flexible disk (obsolete)",
        (0x07, 0x00) => "Verify error recovery",
        (0x08, 0x00) => "Caching",
        (0x09, 0x00) => "Peripheral device (obsolete)",
        (0x0a, 0x00) => "Control",
        (0x0a, 0x01) => "Control extension",
        (0x0c, 0x00) => "Notch and partition (obsolete)",
        (0x18, 0x00) => "Protocol specific logical unit",
        (0x19, 0x00) => "Protocol specific port",
        (0x1a, 0x00) => "Power condition",
        (0x1c, 0x00) => "Informational exceptions control",
        (0x1c, 0x01) => "Background control",
        (0x00, _) => "Vendor (unit attention)",
        (0x20..=0x3e, _) => "Vendor specific",
        _ => "Unknown or reserved",
    }
}

impl ModeData {
    /// Parse a MODE SENSE(10) (`long_form`) or MODE SENSE(6) response.
    pub fn parse(buf: &[u8], long_form: bool) -> Result<Self> {
        let (header, mut off) = if long_form {
            let Ok((h, _)) = RawModeHeader10::ref_from_prefix(buf) else {
                bail!("mode data shorter than the 8-byte header");
            };
            (
                ModeHeader {
                    long_form,
                    mode_data_len: h.mode_data_len.get(),
                    medium_type: h.medium_type,
                    dev_specific: h.dev_specific,
                    block_descriptor_len: h.block_descriptor_len.get(),
                },
                8usize,
            )
        } else {
            let Ok((h, _)) = RawModeHeader6::ref_from_prefix(buf) else {
                bail!("mode data shorter than the 4-byte header");
            };
            (
                ModeHeader {
                    long_form,
                    mode_data_len: h.mode_data_len as u16,
                    medium_type: h.medium_type,
                    dev_specific: h.dev_specific,
                    block_descriptor_len: h.block_descriptor_len as u16,
                },
                4usize,
            )
        };

        // The data-length field counts everything after itself; cap the
        // walk there when the device returned allocation slack.
        let len_field_size = if long_form { 2 } else { 1 };
        let declared_end = len_field_size + header.mode_data_len as usize;
        let end = buf.len().min(declared_end);
        if declared_end > buf.len() {
            bail!(
                "mode data truncated: header declares {declared_end} bytes, \
                 got {}",
                buf.len()
            );
        }

        let bd_len = header.block_descriptor_len as usize;
        if off + bd_len > end {
            bail!("block descriptors run past the mode data");
        }
        if !bd_len.is_multiple_of(8) {
            bail!("block descriptor length {bd_len} is not a multiple of 8");
        }
        let mut block_descriptors = vec![];
        for chunk in buf[off..off + bd_len].chunks_exact(8) {
            block_descriptors.push(BlockDescriptor {
                density_code: chunk[0],
                number_of_blocks: u32::from_be_bytes([
                    0, chunk[1], chunk[2], chunk[3],
                ]),
                block_length: u32::from_be_bytes([0, chunk[5], chunk[6], chunk[7]]),
            });
        }
        off += bd_len;

        let mut pages = vec![];
        while off < end {
            let b0 = buf[off];
            let spf = b0 & 0x40 != 0;
            let (subpage, plen, body) = if spf {
                if off + 4 > end {
                    bail!("subpage header truncated at offset {off}");
                }
                let plen =
                    u16::from_be_bytes([buf[off + 2], buf[off + 3]]) as usize;
                (buf[off + 1], plen, off + 4)
            } else {
                if off + 2 > end {
                    bail!("page header truncated at offset {off}");
                }
                (0u8, buf[off + 1] as usize, off + 2)
            };
            if body + plen > end {
                bail!(
                    "mode page 0x{:02x} runs past the mode data \
                     ({plen} bytes at offset {body}, end {end})",
                    b0 & 0x3f
                );
            }
            pages.push(ModePage {
                page: b0 & 0x3f,
                subpage,
                saveable: b0 & 0x80 != 0,
                data: buf[body..body + plen].to_vec(),
            });
            off = body + plen;
        }

        Ok(Self {
            header,
            block_descriptors,
            pages,
        })
    }
}

impl fmt::Display for ModeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mode parameter header ({}), medium type 0x{:02x}{}",
            if self.header.long_form { "10" } else { "6" },
            self.header.medium_type,
            if self.header.write_protect() {
                ", write protected"
            } else {
                ""
            }
        )?;
        for bd in &self.block_descriptors {
            writeln!(
                f,
                "  Block descriptor: density 0x{:02x}, {} blocks of {} bytes",
                bd.density_code, bd.number_of_blocks, bd.block_length
            )?;
        }
        for page in &self.pages {
            if page.subpage != 0 {
                writeln!(
                    f,
                    "  Page 0x{:02x},0x{:02x} [{}] ({} bytes){}",
                    page.page,
                    page.subpage,
                    mode_page_name(page.page, page.subpage),
                    page.data.len(),
                    if page.saveable { " [saveable]" } else { "" }
                )?;
            } else {
                writeln!(
                    f,
                    "  Page 0x{:02x} [{}] ({} bytes){}",
                    page.page,
                    mode_page_name(page.page, 0),
                    page.data.len(),
                    if page.saveable { " [saveable]" } else { "" }
                )?;
            }
            write!(f, "{}", crate::utils::hex_dump(&page.data))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode6(bd: &[u8], pages: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 4];
        buf[1] = 0x00;
        buf[3] = bd.len() as u8;
        buf.extend_from_slice(bd);
        buf.extend_from_slice(pages);
        buf[0] = (buf.len() - 1) as u8;
        buf
    }

    #[test]
    fn test_mode6_with_block_descriptor() {
        let bd = [0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x02, 0x00];
        let page = [0x88, 0x02, 0xaa, 0xbb]; // caching page, saveable
        let data = mode6(&bd, &page);
        let m = ModeData::parse(&data, false).expect("parse");
        assert_eq!(m.block_descriptors.len(), 1);
        assert_eq!(m.block_descriptors[0].number_of_blocks, 0x1000);
        assert_eq!(m.block_descriptors[0].block_length, 512);
        assert_eq!(m.pages.len(), 1);
        assert_eq!(m.pages[0].page, 0x08);
        assert!(m.pages[0].saveable);
        assert_eq!(m.pages[0].data, vec![0xaa, 0xbb]);
    }

    #[test]
    fn test_mode10_subpage() {
        let mut buf = vec![0u8; 8];
        // subpage-format page 0x1c,0x01 with 3 bytes
        buf.extend_from_slice(&[0x5c, 0x01, 0x00, 0x03, 1, 2, 3]);
        let total = buf.len() as u16 - 2;
        buf[0..2].copy_from_slice(&total.to_be_bytes());
        let m = ModeData::parse(&buf, true).expect("parse");
        assert_eq!(m.pages.len(), 1);
        assert_eq!((m.pages[0].page, m.pages[0].subpage), (0x1c, 0x01));
        assert_eq!(
            mode_page_name(m.pages[0].page, m.pages[0].subpage),
            "Background control"
        );
    }

    #[test]
    fn test_truncated_rejected() {
        let bd = [0u8; 8];
        let mut data = mode6(&bd, &[0x08, 0x0a]); // page claims 10 bytes
        data.truncate(data.len());
        assert!(ModeData::parse(&data, false).is_err());
    }
}
