// tests/_unit_entry.rs
#![allow(clippy::all)]

mod unit_tests {
    pub mod common;
    pub mod test_cdbs;
    pub mod test_config;
    pub mod test_inquiry;
    pub mod test_log_pages;
    pub mod test_luns;
    pub mod test_modes;
    pub mod test_sense;
}
