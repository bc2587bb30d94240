//! Core data structures for nativemod.
//!
//! - [`Os`]: the platform every toolchain decision branches on
//! - [`BuildRequest`]: what to build and where

pub mod platform;
pub mod request;

pub use platform::Os;
pub use request::{BuildRequest, ModuleLanguage};
