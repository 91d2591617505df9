// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Enumeration of SCSI generic nodes through sysfs.
//!
//! Each `/sys/class/scsi_generic/sgN/device` symlink resolves to the
//! SCSI device's sysfs directory, whose name is the H:C:T:L tuple and
//! which carries the identification attributes plus the sibling block
//! and tape class directories.

use std::{fmt, fs, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use serde::Serialize;

const SYSFS_SCSI_GENERIC: &str = "/sys/class/scsi_generic";

/// host:channel:target:lun address of a SCSI device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Hctl {
    pub host: u32,
    pub channel: u32,
    pub target: u32,
    pub lun: u64,
}

impl FromStr for Hctl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let [h, c, t, l] = parts.as_slice() else {
            bail!("expected h:c:t:l, got {s:?}");
        };
        Ok(Self {
            host: h.parse().context("bad host")?,
            channel: c.parse().context("bad channel")?,
            target: t.parse().context("bad target")?,
            lun: l.parse().context("bad lun")?,
        })
    }
}

impl fmt::Display for Hctl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.host, self.channel, self.target, self.lun
        )
    }
}

/// One sg node with everything sysfs knows about it.
#[derive(Debug, Clone, Serialize)]
pub struct ScsiGenericNode {
    /// Class name, e.g. `sg0`.
    pub name: String,
    /// Character device path, e.g. `/dev/sg0`.
    pub dev_path: PathBuf,
    pub hctl: Option<Hctl>,
    pub vendor: String,
    pub model: String,
    pub revision: String,
    /// Peripheral device type from the `type` attribute.
    pub device_type: Option<u8>,
    /// Sibling block device names (`sda`, ...).
    pub block_siblings: Vec<String>,
    /// Sibling tape class names (`st0`, `nst0`, ...).
    pub tape_siblings: Vec<String>,
}

impl ScsiGenericNode {
    /// The node `sg_map` pairs this sg device with: the first block
    /// sibling, else the first tape sibling.
    pub fn primary_node(&self) -> Option<PathBuf> {
        if let Some(b) = self.block_siblings.first() {
            return Some(PathBuf::from(format!("/dev/{b}")));
        }
        self.tape_siblings
            .first()
            .map(|t| PathBuf::from(format!("/dev/{t}")))
    }

    fn sg_index(&self) -> u32 {
        self.name
            .strip_prefix("sg")
            .and_then(|n| n.parse().ok())
            .unwrap_or(u32::MAX)
    }
}

fn read_attr(dir: &std::path::Path, name: &str) -> String {
    fs::read_to_string(dir.join(name))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn list_dir_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Walk `/sys/class/scsi_generic` and collect every sg node, ordered by
/// sg index. An absent sysfs class yields an empty list, not an error
/// (the sg module may simply not be loaded).
pub fn enumerate() -> Result<Vec<ScsiGenericNode>> {
    let class_dir = PathBuf::from(SYSFS_SCSI_GENERIC);
    let entries = match fs::read_dir(&class_dir) {
        Ok(rd) => rd,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(vec![]);
        },
        Err(err) => {
            return Err(err)
                .with_context(|| format!("reading {}", class_dir.display()));
        },
    };

    let mut nodes = vec![];
    for entry in entries {
        let entry = entry.context("reading scsi_generic entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let device_dir = entry.path().join("device");

        // the directory the `device` link points at is named h:c:t:l
        let hctl = fs::read_link(&device_dir)
            .ok()
            .and_then(|target| {
                target
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
            })
            .and_then(|leaf| leaf.parse::<Hctl>().ok());

        let device_type = {
            let t = read_attr(&device_dir, "type");
            t.parse::<u8>().ok()
        };

        nodes.push(ScsiGenericNode {
            dev_path: PathBuf::from(format!("/dev/{name}")),
            hctl,
            vendor: read_attr(&device_dir, "vendor"),
            model: read_attr(&device_dir, "model"),
            revision: read_attr(&device_dir, "rev"),
            device_type,
            block_siblings: list_dir_names(&device_dir.join("block")),
            tape_siblings: list_dir_names(&device_dir.join("scsi_tape")),
            name,
        });
    }

    nodes.sort_by_key(|n| n.sg_index());
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hctl_parse() {
        let h: Hctl = "2:0:1:3".parse().expect("parse");
        assert_eq!(
            h,
            Hctl {
                host: 2,
                channel: 0,
                target: 1,
                lun: 3
            }
        );
        assert_eq!(h.to_string(), "2:0:1:3");
        assert!("1:2:3".parse::<Hctl>().is_err());
        assert!("a:b:c:d".parse::<Hctl>().is_err());
    }

    #[test]
    fn test_primary_node_preference() {
        let mut node = ScsiGenericNode {
            name: "sg1".into(),
            dev_path: "/dev/sg1".into(),
            hctl: None,
            vendor: String::new(),
            model: String::new(),
            revision: String::new(),
            device_type: Some(0),
            block_siblings: vec!["sda".into()],
            tape_siblings: vec!["st0".into()],
        };
        assert_eq!(node.primary_node(), Some(PathBuf::from("/dev/sda")));
        node.block_siblings.clear();
        assert_eq!(node.primary_node(), Some(PathBuf::from("/dev/st0")));
        node.tape_siblings.clear();
        assert_eq!(node.primary_node(), None);
    }
}
