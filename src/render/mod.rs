//! Compositing of captured frames
//!
//! - Outline geometry for rounded and squircle corners
//! - Stitching, padding and corner clipping using tiny-skia

pub mod geometry;
pub mod image;
