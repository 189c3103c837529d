//! Shared helper functions

pub mod helpers;

pub use helpers::*;
