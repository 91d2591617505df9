// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub fn resolve_config_path(rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);

    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot get current working dir")?
            .join(p)
    };

    let canon = abs
        .canonicalize()
        .with_context(|| format!("failed to canonicalize path {abs:?}"))?;

    Ok(canon)
}

/// Parses the numeric argument style the sg utilities accept: plain
/// decimal, `0x`-prefixed hex, or a trailing `h` (`2fh`).
pub fn parse_num(s: &str) -> Result<u64> {
    let t = s.trim();
    if let Some(hexpart) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hexpart, 16)
            .with_context(|| format!("invalid hex number: {s}"));
    }
    if let Some(hexpart) = t.strip_suffix(['h', 'H']) {
        return u64::from_str_radix(hexpart, 16)
            .with_context(|| format!("invalid hex number: {s}"));
    }
    t.parse::<u64>()
        .with_context(|| format!("invalid number: {s}"))
}

/// `parse_num` constrained to a `u8` (page codes, buffer ids).
pub fn parse_num_u8(s: &str) -> Result<u8> {
    let v = parse_num(s)?;
    if v > u8::MAX as u64 {
        bail!("value out of range (max 255): {s}");
    }
    Ok(v as u8)
}

/// Parses byte sizes with the suffixes `sgs_dd` understands
/// (`k`, `m`, `g`, powers of two).
pub fn parse_size(s: &str) -> Result<u64> {
    let t = s.trim();
    let (digits, mult) = match t.chars().last() {
        Some('k') | Some('K') => (&t[..t.len() - 1], 1u64 << 10),
        Some('m') | Some('M') => (&t[..t.len() - 1], 1u64 << 20),
        Some('g') | Some('G') => (&t[..t.len() - 1], 1u64 << 30),
        _ => (t, 1),
    };
    let base = parse_num(digits)?;
    base.checked_mul(mult)
        .with_context(|| format!("size overflows u64: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_num_forms() {
        assert_eq!(parse_num("47").expect("dec"), 47);
        assert_eq!(parse_num("0x2f").expect("hex"), 0x2f);
        assert_eq!(parse_num("2fh").expect("suffix hex"), 0x2f);
        assert!(parse_num("zz").is_err());
    }

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("512").expect("plain"), 512);
        assert_eq!(parse_size("4k").expect("kib"), 4096);
        assert_eq!(parse_size("1M").expect("mib"), 1 << 20);
    }
}
