// tests/_integration_entry.rs
#![allow(clippy::all)]

mod integration_tests {
    pub mod common;
    pub mod live_inquiry;
    pub mod live_logs;
    pub mod live_turs;
    pub mod scan_sysfs;
}
