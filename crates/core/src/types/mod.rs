//! Core types for Vendora.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{MAX_AMOUNT, cents_to_decimal, is_valid_amount, resolve_amount};
pub use status::*;
