//! Command implementations

pub mod build;
pub mod c;
pub mod completions;
pub mod doctor;
pub mod fortran;
pub mod toolchain;
