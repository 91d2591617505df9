// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use sg_utils_rs::cfg::config::Config;

#[test]
fn test_load_repo_config() {
    let cfg = Config::load_from_file("tests/config.yaml").expect("load");
    assert_eq!(cfg.device.timeout, Duration::from_secs(30));
    assert_eq!(cfg.device.sense_len, 64);
    assert_eq!(cfg.dd.queue_depth, 8);
    assert!(cfg.verbose());
}

#[test]
fn test_yaml_yesno_aliases() {
    let yaml = r#"
device:
  TimeoutSeconds: 5
  SenseBufferLength: 32
  MaxAllocationLength: 4096
  Verbose: "true"
"#;
    let mut cfg: Config = serde_yaml::from_str(yaml).expect("parse");
    cfg.validate_and_normalize().expect("valid");
    assert!(cfg.verbose());
    assert_eq!(cfg.dd.block_size, 512); // defaulted section
}

#[test]
fn test_invalid_rejected() {
    let yaml = r#"
device:
  TimeoutSeconds: 0
  SenseBufferLength: 64
  MaxAllocationLength: 4096
"#;
    let mut cfg: Config = serde_yaml::from_str(yaml).expect("parse");
    assert!(cfg.validate_and_normalize().is_err());
}
