//! Fixed-grid acquisition: one scroll and capture per planned tile

use crate::config::CaptureConfig;
use crate::domain::{CapturedFrame, ScrollOffset, document_rect_of, viewport_rect_of};
use crate::error::{CaptureError, Result};
use crate::page::{FrameSource, Page, ScrollContainer};
use crate::planner::TilePlan;

use super::guard::PageGuard;
use super::settle::settle;
use super::{capture_frame, crop_and_place};

/// Capture every tile of `plan` by scrolling `container` to it.
///
/// A single tile that is already fully on screen is captured without
/// scrolling, and fixed elements stay visible for it when
/// `keep_fixed_in_first_frame` is set. Otherwise they are hidden for every
/// tile. Tiles near the content end may not reach the viewport origin
/// because the page clamps the scroll; the crop uses the offset actually
/// reached.
pub async fn acquire_grid<P: Page, F: FrameSource>(
    page: &mut P,
    source: &mut F,
    container: &ScrollContainer,
    plan: &TilePlan,
    config: &CaptureConfig,
) -> Result<Vec<CapturedFrame>> {
    if plan.tiles.is_empty() {
        return Err(CaptureError::EmptyCapture);
    }

    let dpr = page.device_pixel_ratio();
    let mut guard = PageGuard::new(page, container.clone(), config.hide_scrollbars);
    let client = guard
        .client_rect(container)
        .ok_or_else(|| CaptureError::TargetNotFound(format!("{container:?}")))?;

    let visible = document_rect_of(client.size().to_rect(), guard.scroll_offset());
    let skip_scroll =
        plan.is_single_tile() && visible.contains_rect(&plan.tiles[0].document_rect());

    log::info!(
        "Capturing {} tile(s) ({}x{}) of {:?} at dpr {}",
        plan.tiles.len(),
        plan.columns,
        plan.rows,
        plan.capture_rect,
        dpr
    );

    let mut frames = Vec::with_capacity(plan.tiles.len());
    for (index, tile) in plan.tiles.iter().enumerate() {
        let tile_rect = tile.document_rect();

        if !skip_scroll {
            guard.scroll_to(ScrollOffset::new(tile.document_x, tile.document_y));
        }
        // A scrolled-to tile starts at the viewport origin, under any fixed header
        let keep_fixed = skip_scroll && config.keep_fixed_in_first_frame;
        if config.hide_fixed_elements && !keep_fixed {
            guard.hide_fixed_elements();
        }
        let delay = if index == 0 {
            config.initial_settle_delay()
        } else {
            config.settle_delay()
        };
        settle(&mut *guard, delay, config.animation_frames).await;

        let scroll = guard.scroll_offset();
        let footprint = viewport_rect_of(tile_rect, scroll).translate(client.x, client.y);

        let image = capture_frame(source, index).await?;
        let destination = tile_rect.translate(-plan.capture_rect.x, -plan.capture_rect.y);
        let (crop, placement) = crop_and_place(index, &image, footprint, destination, dpr)?;

        log::debug!(
            "Tile ({}, {}) at scroll ({}, {}): crop {:?} -> {:?}",
            tile.column,
            tile.row,
            scroll.left,
            scroll.top,
            crop,
            placement
        );

        frames.push(CapturedFrame {
            image: image.rgba,
            placement,
            crop,
            is_last_frame: index + 1 == plan.tiles.len(),
            last_frame_height: tile.height,
        });
    }

    drop(guard);
    Ok(frames)
}
