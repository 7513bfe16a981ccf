//! Units of measure for the purchasing domain.
//!
//! Conversion is factor-based within a measurement category: a quantity in
//! some unit corresponds to `quantity * factor` in the category's base
//! unit. Converting between categories is a domain error; callers that want
//! softer behavior handle it themselves.

pub mod uom;

pub use uom::{Uom, UomCategory, convert};
