//! Captured frame handling

pub mod image;

pub use self::image::FrameImage;
