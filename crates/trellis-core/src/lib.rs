//! Core types, policy enums, and error types for the Trellis layout engine.
//!
//! This crate provides the vocabulary shared by the other trellis crates:
//! - Layout axes and geometry (`Rect`, `SafeAreaInsets`)
//! - Size policy kinds and anchor/safe-area enums
//! - Flow and linear orientation enums
//! - Error types

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
