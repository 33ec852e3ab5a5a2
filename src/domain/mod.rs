//! Pure domain types with minimal dependencies
//!
//! This module contains the geometry and capture types used throughout the
//! engine. Nothing here performs IO, scrolling or drawing.

pub mod capture;
pub mod geometry;

pub use capture::*;
pub use geometry::*;
