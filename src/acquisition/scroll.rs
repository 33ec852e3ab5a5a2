//! Unbounded-scroll acquisition: capture, scroll one viewport, repeat until the end

use crate::config::CaptureConfig;
use crate::domain::{CapturedFrame, Document, Rect, ScrollOffset, Size, Viewport};
use crate::error::{CaptureError, Result};
use crate::page::{FrameSource, Page, ScrollContainer};

use super::guard::PageGuard;
use super::settle::settle;
use super::{capture_frame, crop_and_place};

/// Frames of a scrolling capture and the content area they cover
#[derive(Debug)]
pub struct ScrollCapture {
    pub frames: Vec<CapturedFrame>,
    /// Covered content, starting at the top of the container
    pub content_size: Size<Document>,
}

/// Capture `container` from its top until the content end is on screen.
///
/// `scrollHeight` is re-read every iteration so content that grows while
/// capturing is still picked up. Each frame contributes only rows not covered
/// by earlier frames, so a final scroll clamped at the content end does not
/// duplicate content.
///
/// The loop ends early, without error, when the scroll position moves less
/// than `stuck_scroll_threshold_px` for `stuck_scroll_attempts` consecutive
/// iterations, or after `max_frames` frames. The last recorded frame is
/// marked final either way.
pub async fn acquire_scrolling<P: Page, F: FrameSource>(
    page: &mut P,
    source: &mut F,
    container: &ScrollContainer,
    config: &CaptureConfig,
) -> Result<ScrollCapture> {
    let dpr = page.device_pixel_ratio();
    let mut guard = PageGuard::new(page, container.clone(), config.hide_scrollbars);
    let client = guard
        .client_rect(container)
        .ok_or_else(|| CaptureError::TargetNotFound(format!("{container:?}")))?;

    let left = guard.original_scroll().left;
    guard.scroll_to(ScrollOffset::new(left, 0.0));

    log::info!(
        "Capturing {:?} by scrolling, viewport {}x{} at dpr {}",
        container,
        client.width,
        client.height,
        dpr
    );

    let mut frames: Vec<CapturedFrame> = Vec::new();
    let mut covered = 0.0_f64;
    let mut stuck = 0u32;
    let mut index = 0usize;

    loop {
        if config.hide_fixed_elements && (index > 0 || !config.keep_fixed_in_first_frame) {
            guard.hide_fixed_elements();
        }
        let delay = if index == 0 {
            config.initial_settle_delay()
        } else {
            config.settle_delay()
        };
        settle(&mut *guard, delay, config.animation_frames).await;

        let scroll_top = guard.scroll_offset().top;
        let scroll_height = guard.scroll_size(container).height;
        let viewport_height = client.height;

        let image = capture_frame(source, index).await?;

        let start_y = covered.max(scroll_top);
        let remaining = (scroll_height - start_y).max(0.0);
        let contribution = remaining
            .min(scroll_top + viewport_height - start_y)
            .max(0.0);
        let at_bottom =
            (scroll_top + viewport_height - scroll_height).abs() < config.bottom_tolerance_px;
        let mut is_last = at_bottom || scroll_height - scroll_top <= viewport_height;
        if !is_last && index + 1 >= config.max_frames as usize {
            log::warn!(
                "Reached the limit of {} frames at scroll {}, finishing capture",
                config.max_frames,
                scroll_top
            );
            is_last = true;
        }

        if contribution > 0.0 {
            let footprint = Rect::<Viewport>::new(
                client.x,
                client.y + (start_y - scroll_top),
                client.width,
                contribution,
            );
            let destination = Rect::<Document>::new(0.0, start_y, client.width, contribution);
            let (crop, placement) = crop_and_place(index, &image, footprint, destination, dpr)?;

            log::debug!(
                "Frame {} at scroll {}: rows {}..{} of {}, crop {:?} -> {:?}",
                index,
                scroll_top,
                start_y,
                start_y + contribution,
                scroll_height,
                crop,
                placement
            );

            frames.push(CapturedFrame {
                image: image.rgba,
                placement,
                crop,
                is_last_frame: is_last,
                last_frame_height: contribution,
            });
            covered = start_y + contribution;
        } else {
            log::debug!("Frame {} at scroll {} adds no new rows", index, scroll_top);
        }

        if is_last {
            mark_last(&mut frames);
            break;
        }

        guard.scroll_to(ScrollOffset::new(left, scroll_top + viewport_height));
        let moved = guard.scroll_offset().top - scroll_top;
        if moved < config.stuck_scroll_threshold_px {
            stuck += 1;
            if stuck >= config.stuck_scroll_attempts {
                log::warn!(
                    "Scroll position stuck at {} after {} attempts, finishing capture",
                    scroll_top,
                    stuck
                );
                mark_last(&mut frames);
                break;
            }
        } else {
            stuck = 0;
        }
        index += 1;
    }

    drop(guard);

    log::info!(
        "Captured {} frame(s) covering {}x{}",
        frames.len(),
        client.width,
        covered
    );

    Ok(ScrollCapture {
        frames,
        content_size: Size::new(client.width, covered),
    })
}

fn mark_last(frames: &mut [CapturedFrame]) {
    if let Some(last) = frames.last_mut() {
        last.is_last_frame = true;
    }
}
