//! Core types for Shopfloor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod label;
pub mod price;
pub mod status;

pub use contact::{ContactError, Email, Phone};
pub use id::*;
pub use label::{Arrangement, BarcodeFormat, LabelStyle, PaperType, SymbolKind, TextAlign};
pub use price::Price;
pub use status::*;
