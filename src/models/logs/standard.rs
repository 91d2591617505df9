// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed decoders for the standard log pages `sg_logs` knows how to
//! print. Each decoder consumes a parsed [`LogPage`] and yields a struct
//! whose `Display` output matches the utility's text rendering.

use core::fmt;

use anyhow::{Result, bail};

use crate::{
    models::logs::{LogPage, LogParameter},
    utils::{be_counter, hex_compact, trim_scsi_ascii},
};

pub const PAGE_SUPPORTED: u8 = 0x00;
pub const PAGE_WRITE_ERRORS: u8 = 0x02;
pub const PAGE_READ_ERRORS: u8 = 0x03;
pub const PAGE_VERIFY_ERRORS: u8 = 0x05;
pub const PAGE_NON_MEDIUM: u8 = 0x06;
pub const PAGE_TEMPERATURE: u8 = 0x0d;
pub const PAGE_START_STOP: u8 = 0x0e;
pub const PAGE_SELF_TEST: u8 = 0x10;
pub const PAGE_INFO_EXCEPTIONS: u8 = 0x2f;
pub const SUBPAGE_ALL: u8 = 0xff;

/// Everything this module can decode into typed form.
#[derive(Debug, Clone)]
pub enum DecodedPage {
    Supported(SupportedPages),
    ErrorCounters(ErrorCounterPage),
    NonMedium(NonMediumErrors),
    Temperature(TemperaturePage),
    StartStop(StartStopPage),
    SelfTest(SelfTestResults),
    InfoExceptions(InfoExceptionsPage),
}

/// Dispatch on the page code; `None` means the caller should fall back
/// to a vendor decoder or a hex dump.
pub fn decode(page: &LogPage) -> Option<Result<DecodedPage>> {
    if page.spf && page.subpage != 0 && page.subpage != SUBPAGE_ALL {
        return None;
    }
    let decoded = match page.page {
        PAGE_SUPPORTED => supported_pages(page).map(DecodedPage::Supported),
        PAGE_WRITE_ERRORS | PAGE_READ_ERRORS | PAGE_VERIFY_ERRORS => {
            error_counters(page).map(DecodedPage::ErrorCounters)
        },
        PAGE_NON_MEDIUM => non_medium(page).map(DecodedPage::NonMedium),
        PAGE_TEMPERATURE => temperature(page).map(DecodedPage::Temperature),
        PAGE_START_STOP => start_stop(page).map(DecodedPage::StartStop),
        PAGE_SELF_TEST => self_test(page).map(DecodedPage::SelfTest),
        PAGE_INFO_EXCEPTIONS => {
            info_exceptions(page).map(DecodedPage::InfoExceptions)
        },
        _ => return None,
    };
    Some(decoded)
}

impl fmt::Display for DecodedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedPage::Supported(v) => fmt::Display::fmt(v, f),
            DecodedPage::ErrorCounters(v) => fmt::Display::fmt(v, f),
            DecodedPage::NonMedium(v) => fmt::Display::fmt(v, f),
            DecodedPage::Temperature(v) => fmt::Display::fmt(v, f),
            DecodedPage::StartStop(v) => fmt::Display::fmt(v, f),
            DecodedPage::SelfTest(v) => fmt::Display::fmt(v, f),
            DecodedPage::InfoExceptions(v) => fmt::Display::fmt(v, f),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x00 — Supported log pages (and the 0x00/0xff subpage variant)

/// Page 0x00: a bare list of page codes; with subpage 0xff, a list of
/// (page, subpage) pairs.
#[derive(Debug, Clone)]
pub struct SupportedPages {
    pub pairs: Vec<(u8, u8)>,
    pub with_subpages: bool,
}

fn supported_pages(page: &LogPage) -> Result<SupportedPages> {
    if page.spf {
        if !page.data.len().is_multiple_of(2) {
            bail!(
                "supported subpages list has odd length {}",
                page.data.len()
            );
        }
        Ok(SupportedPages {
            pairs: page
                .data
                .chunks_exact(2)
                .map(|c| (c[0] & 0x3f, c[1]))
                .collect(),
            with_subpages: true,
        })
    } else {
        Ok(SupportedPages {
            pairs: page.data.iter().map(|&b| (b & 0x3f, 0)).collect(),
            with_subpages: false,
        })
    }
}

impl fmt::Display for SupportedPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.with_subpages {
            writeln!(f, "Supported log pages and subpages:")?;
        } else {
            writeln!(f, "Supported log pages:")?;
        }
        for &(p, sp) in &self.pairs {
            if self.with_subpages && sp != 0 {
                writeln!(
                    f,
                    "  0x{p:02x},0x{sp:02x}  {}",
                    super::page_name(p)
                )?;
            } else {
                writeln!(f, "  0x{p:02x}        {}", super::page_name(p))?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x02 / 0x03 / 0x05 — error counter pages

#[derive(Debug, Clone)]
pub struct ErrorCounterPage {
    pub page: u8,
    pub counters: Vec<(u16, u64)>,
}

/// Parameter-code labels shared by the write/read/verify counter pages.
fn counter_label(code: u16) -> &'static str {
    match code {
        0x0000 => "Errors corrected without substantial delay",
        0x0001 => "Errors corrected with possible delays",
        0x0002 => "Total rewrites or rereads",
        0x0003 => "Total errors corrected",
        0x0004 => "Total times correction algorithm processed",
        0x0005 => "Total bytes processed",
        0x0006 => "Total uncorrected errors",
        _ => "Reserved or vendor counter",
    }
}

fn error_counters(page: &LogPage) -> Result<ErrorCounterPage> {
    let mut counters = vec![];
    for param in page.params()? {
        let Some(v) = param.counter().or_else(|| be_counter(&param.value)) else {
            continue;
        };
        counters.push((param.code, v));
    }
    Ok(ErrorCounterPage {
        page: page.page,
        counters,
    })
}

impl fmt::Display for ErrorCounterPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", super::page_name(self.page))?;
        for &(code, value) in &self.counters {
            writeln!(f, "  {} = {value}", counter_label(code))?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x06 — non-medium errors

#[derive(Debug, Clone)]
pub struct NonMediumErrors {
    pub count: u64,
}

fn non_medium(page: &LogPage) -> Result<NonMediumErrors> {
    for param in page.params()? {
        if param.code == 0
            && let Some(count) =
                param.counter().or_else(|| be_counter(&param.value))
        {
            return Ok(NonMediumErrors { count });
        }
    }
    bail!("non-medium error page lacks parameter 0x0000");
}

impl fmt::Display for NonMediumErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Non-medium errors:")?;
        writeln!(f, "  Error event count = {}", self.count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x0d — temperature

#[derive(Debug, Clone)]
pub struct TemperaturePage {
    pub current_c: Option<u8>,
    pub reference_c: Option<u8>,
}

fn temperature(page: &LogPage) -> Result<TemperaturePage> {
    let mut out = TemperaturePage {
        current_c: None,
        reference_c: None,
    };
    for param in page.params()? {
        // payload: reserved byte then the temperature; 0xff = unknown
        let Some(&t) = param.value.get(1) else { continue };
        match param.code {
            0x0000 => out.current_c = (t != 0xff).then_some(t),
            0x0001 => out.reference_c = (t != 0xff).then_some(t),
            _ => {},
        }
    }
    Ok(out)
}

impl fmt::Display for TemperaturePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Temperature:")?;
        match self.current_c {
            Some(t) => writeln!(f, "  Current temperature = {t} C")?,
            None => writeln!(f, "  Current temperature = <not available>")?,
        }
        if let Some(t) = self.reference_c {
            writeln!(f, "  Reference temperature = {t} C")?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x0e — start-stop cycle counter

#[derive(Debug, Clone, Default)]
pub struct StartStopPage {
    pub manufacture_year: Option<String>,
    pub manufacture_week: Option<String>,
    pub accounting_year: Option<String>,
    pub accounting_week: Option<String>,
    pub specified_cycles: Option<u64>,
    pub accumulated_cycles: Option<u64>,
}

fn start_stop(page: &LogPage) -> Result<StartStopPage> {
    let mut out = StartStopPage::default();
    for param in page.params()? {
        match param.code {
            0x0001 if param.value.len() >= 6 => {
                out.manufacture_year = Some(trim_scsi_ascii(&param.value[0..4]));
                out.manufacture_week = Some(trim_scsi_ascii(&param.value[4..6]));
            },
            0x0002 if param.value.len() >= 6 => {
                out.accounting_year = Some(trim_scsi_ascii(&param.value[0..4]));
                out.accounting_week = Some(trim_scsi_ascii(&param.value[4..6]));
            },
            0x0003 => out.specified_cycles = be_counter(&param.value),
            0x0004 => out.accumulated_cycles = be_counter(&param.value),
            _ => {},
        }
    }
    Ok(out)
}

impl fmt::Display for StartStopPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Start-stop cycle counter:")?;
        if let (Some(y), Some(w)) = (&self.manufacture_year, &self.manufacture_week) {
            writeln!(f, "  Date of manufacture, year: {y}, week: {w}")?;
        }
        if let (Some(y), Some(w)) = (&self.accounting_year, &self.accounting_week) {
            writeln!(f, "  Accounting date, year: {y}, week: {w}")?;
        }
        if let Some(n) = self.specified_cycles {
            writeln!(f, "  Specified cycle count over device lifetime = {n}")?;
        }
        if let Some(n) = self.accumulated_cycles {
            writeln!(f, "  Accumulated start-stop cycles = {n}")?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x10 — self-test results

#[derive(Debug, Clone)]
pub struct SelfTestEntry {
    pub param_code: u16,
    pub result: u8,
    pub test_code: u8,
    pub segment: u8,
    pub power_on_hours: u16,
    pub lba: u64,
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
}

#[derive(Debug, Clone)]
pub struct SelfTestResults {
    pub entries: Vec<SelfTestEntry>,
}

fn self_test_result_str(result: u8) -> &'static str {
    match result {
        0x0 => "completed without error",
        0x1 => "aborted by SEND DIAGNOSTIC",
        0x2 => "aborted other than by SEND DIAGNOSTIC",
        0x3 => "unknown error, unable to complete",
        0x4 => "completed, unknown failed segment",
        0x5 => "completed, first segment failed",
        0x6 => "completed, second segment failed",
        0x7 => "completed, another segment failed",
        0xf => "self-test in progress",
        _ => "reserved result code",
    }
}

fn self_test(page: &LogPage) -> Result<SelfTestResults> {
    let mut entries = vec![];
    for param in page.params()? {
        // 20 results, parameter codes 0x0001..0x0014, 16-byte payloads;
        // an all-zero payload is an unused slot
        if !(0x0001..=0x0014).contains(&param.code) {
            continue;
        }
        let v = &param.value;
        if v.len() < 16 || v.iter().all(|&b| b == 0) {
            continue;
        }
        entries.push(SelfTestEntry {
            param_code: param.code,
            result: v[0] & 0x0f,
            test_code: (v[0] >> 5) & 0x07,
            segment: v[1],
            power_on_hours: u16::from_be_bytes([v[2], v[3]]),
            lba: u64::from_be_bytes([v[4], v[5], v[6], v[7], v[8], v[9], v[10], v[11]]),
            sense_key: v[12] & 0x0f,
            asc: v[13],
            ascq: v[14],
        });
    }
    Ok(SelfTestResults { entries })
}

impl fmt::Display for SelfTestResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Self-test results:")?;
        if self.entries.is_empty() {
            return writeln!(f, "  No self-tests have been logged");
        }
        for e in &self.entries {
            writeln!(
                f,
                "  #{:<2} test code {}, {} [poh {}]",
                e.param_code,
                e.test_code,
                self_test_result_str(e.result),
                e.power_on_hours
            )?;
            if e.lba != u64::MAX && e.lba != 0 {
                writeln!(f, "      address of first failure = 0x{:x}", e.lba)?;
            }
            if e.sense_key != 0 || e.asc != 0 || e.ascq != 0 {
                writeln!(
                    f,
                    "      sense key 0x{:x}, asc 0x{:02x}, ascq 0x{:02x}",
                    e.sense_key, e.asc, e.ascq
                )?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 0x2f — informational exceptions

#[derive(Debug, Clone)]
pub struct InfoExceptionsPage {
    pub asc: u8,
    pub ascq: u8,
    pub recent_temp_c: Option<u8>,
}

fn info_exceptions(page: &LogPage) -> Result<InfoExceptionsPage> {
    for param in page.params()? {
        if param.code == 0 {
            let v = &param.value;
            if v.len() < 2 {
                bail!("informational exceptions parameter too short");
            }
            return Ok(InfoExceptionsPage {
                asc: v[0],
                ascq: v[1],
                recent_temp_c: v.get(2).copied().filter(|&t| t != 0xff),
            });
        }
    }
    bail!("informational exceptions page lacks parameter 0x0000");
}

impl fmt::Display for InfoExceptionsPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Informational exceptions:")?;
        if self.asc == 0 && self.ascq == 0 {
            writeln!(f, "  IE asc = 0x0, ascq = 0x0 (no exception reported)")?;
        } else {
            writeln!(
                f,
                "  IE asc = 0x{:02x}, ascq = 0x{:02x}: {}",
                self.asc,
                self.ascq,
                crate::models::asc_ascq::asc_ascq_to_string(self.asc, self.ascq)
            )?;
        }
        if let Some(t) = self.recent_temp_c {
            writeln!(f, "  Most recent temperature = {t} C")?;
        }
        Ok(())
    }
}

/// Fallback rendering for parameters nothing recognizes: one line per
/// record with the payload in hex.
pub fn render_params_hex(params: &[LogParameter]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for p in params {
        writeln!(
            &mut out,
            "  param 0x{:04x} [{:?}]: {}",
            p.code,
            p.format,
            if p.value.is_empty() {
                "<empty>".to_string()
            } else {
                hex_compact(&p.value)
            }
        )
        .expect("Writing to String cannot fail");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_page(page: u8, subpage: u8, params: &[(u16, &[u8])]) -> LogPage {
        let mut body = vec![];
        for (code, value) in params {
            body.extend_from_slice(&code.to_be_bytes());
            body.push(0x00);
            body.push(value.len() as u8);
            body.extend_from_slice(value);
        }
        let mut buf = vec![
            (page & 0x3f) | if subpage != 0 { 0x40 } else { 0 },
            subpage,
        ];
        buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
        buf.extend_from_slice(&body);
        LogPage::parse(&buf).expect("fixture page must parse")
    }

    #[test]
    fn test_supported_pages() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x03, 0x00, 0x02, 0x0d];
        let page = LogPage::parse(&buf).expect("parse");
        let Some(Ok(DecodedPage::Supported(s))) = decode(&page) else {
            panic!("expected supported pages decode");
        };
        assert_eq!(s.pairs, vec![(0x00, 0), (0x02, 0), (0x0d, 0)]);
        buf[4] = 0x41; // malformed page code byte gets masked
        let page = LogPage::parse(&buf).expect("parse");
        let Some(Ok(DecodedPage::Supported(s))) = decode(&page) else {
            panic!("expected supported pages decode");
        };
        assert_eq!(s.pairs[0].0, 0x01);
    }

    #[test]
    fn test_error_counters() {
        let page = build_page(
            0x03,
            0,
            &[(0x0003, &[0x00, 0x2a]), (0x0006, &[0x01])],
        );
        let Some(Ok(DecodedPage::ErrorCounters(c))) = decode(&page) else {
            panic!("expected counters decode");
        };
        assert_eq!(c.counters, vec![(3, 0x2a), (6, 1)]);
        let text = c.to_string();
        assert!(text.contains("Total errors corrected = 42"), "{text}");
        assert!(text.contains("Total uncorrected errors = 1"), "{text}");
    }

    #[test]
    fn test_temperature() {
        let page = build_page(
            0x0d,
            0,
            &[(0x0000, &[0x00, 0x23]), (0x0001, &[0x00, 0xff])],
        );
        let Some(Ok(DecodedPage::Temperature(t))) = decode(&page) else {
            panic!("expected temperature decode");
        };
        assert_eq!(t.current_c, Some(0x23));
        assert_eq!(t.reference_c, None);
        assert!(t.to_string().contains("= 35 C"));
    }

    #[test]
    fn test_self_test_skips_unused() {
        let used: &[u8] = &[
            0x24, 0x01, 0x00, 0x64, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0x04, 0x40, 0x81, 0x00,
        ];
        let unused = [0u8; 16];
        let page = build_page(0x10, 0, &[(0x0001, used), (0x0002, &unused)]);
        let Some(Ok(DecodedPage::SelfTest(st))) = decode(&page) else {
            panic!("expected self-test decode");
        };
        assert_eq!(st.entries.len(), 1);
        let e = &st.entries[0];
        assert_eq!(e.result, 0x4);
        assert_eq!(e.test_code, 1);
        assert_eq!(e.power_on_hours, 100);
        assert_eq!((e.sense_key, e.asc, e.ascq), (0x4, 0x40, 0x81));
    }

    #[test]
    fn test_info_exceptions() {
        let page = build_page(0x2f, 0, &[(0x0000, &[0x5d, 0x10, 0x2b])]);
        let Some(Ok(DecodedPage::InfoExceptions(ie))) = decode(&page) else {
            panic!("expected IE decode");
        };
        assert_eq!((ie.asc, ie.ascq), (0x5d, 0x10));
        assert_eq!(ie.recent_temp_c, Some(0x2b));
        assert!(ie.to_string().contains("impending failure"));
    }

    #[test]
    fn test_unknown_page_not_decoded() {
        let page = build_page(0x18, 0, &[]);
        assert!(decode(&page).is_none());
    }
}
