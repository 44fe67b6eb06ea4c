//! High-level operations.
//!
//! This module contains the implementation of the xapian-bridge commands.

pub mod doctor;
pub mod setup;

pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use setup::{decide_build, library_file_name, setup, BuildDecision, SetupOptions, SetupResult};
