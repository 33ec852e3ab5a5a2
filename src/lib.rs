//! Scrolling screenshot capture and compositing
//!
//! Captures an element, a region, the visible area or a whole scrolling page
//! as one image, by scrolling the page, grabbing the viewport repeatedly and
//! stitching the frames onto a canvas. Optional padding and rounded or
//! squircle corners are applied before the canvas is encoded.
//!
//! The page and its screenshot primitive are abstract ([`page::Page`] and
//! [`page::FrameSource`]); [`simulated`] provides an in-memory page.

pub mod acquisition;
pub mod capture;
pub mod config;
pub mod domain;
pub mod encode;
pub mod engine;
pub mod error;
pub mod page;
pub mod planner;
pub mod render;
pub mod simulated;

pub use config::CaptureConfig;
pub use engine::capture;
pub use error::{CaptureError, Result};
