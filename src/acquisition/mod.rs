//! Scroll-driven acquisition of viewport frames
//!
//! Two modes share the same building blocks:
//! - [`grid`]: scroll to each planned tile in turn (element and region capture)
//! - [`scroll`]: keep scrolling one viewport at a time until the end of the
//!   content (full page and scroll container capture)
//!
//! Steps are strictly sequential: the next scroll is never issued before the
//! previous frame has been captured and cropped, since scroll position is
//! shared page state. Page state touched by a run is restored by
//! [`guard::PageGuard`] on every exit path.

pub mod grid;
pub mod guard;
pub mod scroll;
pub mod settle;
pub mod suppress;

use crate::capture::FrameImage;
use crate::domain::{Document, PixelRect, Placement, Rect, Viewport, to_device_pixels};
use crate::error::{CaptureError, Result};
use crate::page::FrameSource;

pub use grid::acquire_grid;
pub use scroll::{ScrollCapture, acquire_scrolling};

/// Invoke the capture primitive and decode what it returns
async fn capture_frame<F: FrameSource>(source: &mut F, index: usize) -> Result<FrameImage> {
    let data_uri = source
        .capture_visible_frame()
        .await
        .map_err(|e| CaptureError::acquisition(index, &e))?;
    FrameImage::from_data_uri(&data_uri)
        .map_err(|e| CaptureError::invalid_frame(index, format!("{e:#}")))
}

/// Source crop and destination placement for one frame.
///
/// `footprint` is where the content appears in the captured viewport and
/// `destination` is where it belongs relative to the capture origin. If the
/// footprint runs past the image edge, the placement shifts by the same amount
/// that was cropped away.
fn crop_and_place(
    index: usize,
    image: &FrameImage,
    footprint: Rect<Viewport>,
    destination: Rect<Document>,
    dpr: f64,
) -> Result<(PixelRect, Placement)> {
    let footprint_px = to_device_pixels(footprint, dpr);
    let crop = footprint_px.intersect(image.bounds()).ok_or_else(|| {
        CaptureError::invalid_frame(
            index,
            format!(
                "content at {:?} lies outside the {}x{} frame",
                footprint_px,
                image.width(),
                image.height()
            ),
        )
    })?;
    let origin = to_device_pixels(destination, dpr);
    let placement = Placement {
        x: origin.left + (crop.left - footprint_px.left),
        y: origin.top + (crop.top - footprint_px.top),
    };
    Ok((crop, placement))
}
