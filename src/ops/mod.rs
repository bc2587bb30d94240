//! High-level operations.
//!
//! This module contains the implementation of nativemod commands.

pub mod build;
pub mod doctor;

pub use build::{build, host_builder, BuildOptions, BuildOutcome};
pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
