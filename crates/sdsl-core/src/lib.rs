#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the SDSL analysis crates.
//!
//! Identifiers in shader sources repeat heavily across a composition (every
//! mixin in a hierarchy mentions the same stream and member names), so names
//! are interned once and compared as [`Symbol`] handles everywhere else.

mod interner;


pub use interner::{Interner, Symbol};
