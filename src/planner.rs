//! Tile planning: split a document-space capture region into viewport-sized tiles

use crate::domain::{CaptureTile, Document, Rect, Size, Viewport, clamp_rect_to_bounds};

/// Ordered tiles covering a capture region
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlan {
    /// Target expanded by the capture margin
    pub capture_rect: Rect<Document>,
    /// Row-major: top-to-bottom, then left-to-right within a row
    pub tiles: Vec<CaptureTile>,
    pub columns: u32,
    pub rows: u32,
}

impl TilePlan {
    /// The region fits in one viewport, so no scrolling between captures is needed
    pub fn is_single_tile(&self) -> bool {
        self.tiles.len() == 1
    }
}

/// Plan the tiles needed to capture `target` grown by `margin_px`.
///
/// Interior tiles are exactly one viewport in size. Tiles in the last column
/// and row are clipped to the capture region's far edge, never padded, so the
/// tiles cover the region without gaps or overlap.
pub fn plan_tiles(target: Rect<Document>, viewport: Size<Viewport>, margin_px: f64) -> TilePlan {
    tile_region(target.expand(margin_px.max(0.0)), viewport)
}

/// Like [`plan_tiles`], but the grown region is first clamped to `bounds`,
/// usually the scrollable content, so no tile reaches past what the page can
/// show.
pub fn plan_tiles_within(
    target: Rect<Document>,
    viewport: Size<Viewport>,
    margin_px: f64,
    bounds: Rect<Document>,
) -> TilePlan {
    let grown = target.expand(margin_px.max(0.0));
    let capture_rect = clamp_rect_to_bounds(grown, bounds);
    if capture_rect != grown {
        log::debug!("Clamped capture region {:?} to {:?}", grown, capture_rect);
    }
    tile_region(capture_rect, viewport)
}

fn tile_region(capture_rect: Rect<Document>, viewport: Size<Viewport>) -> TilePlan {
    if capture_rect.is_empty() {
        return TilePlan {
            capture_rect,
            tiles: Vec::new(),
            columns: 0,
            rows: 0,
        };
    }

    let fits = capture_rect.width <= viewport.width && capture_rect.height <= viewport.height;
    if fits || viewport.width <= 0.0 || viewport.height <= 0.0 {
        if !fits {
            log::warn!("Viewport has no area, capturing {:?} as a single tile", capture_rect);
        }
        return TilePlan {
            capture_rect,
            tiles: vec![CaptureTile {
                document_x: capture_rect.x,
                document_y: capture_rect.y,
                width: capture_rect.width,
                height: capture_rect.height,
                column: 0,
                row: 0,
            }],
            columns: 1,
            rows: 1,
        };
    }

    let columns = (capture_rect.width / viewport.width).ceil() as u32;
    let rows = (capture_rect.height / viewport.height).ceil() as u32;

    let mut tiles = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        let top = capture_rect.y + row as f64 * viewport.height;
        let height = viewport.height.min(capture_rect.bottom() - top);
        for column in 0..columns {
            let left = capture_rect.x + column as f64 * viewport.width;
            let width = viewport.width.min(capture_rect.right() - left);
            tiles.push(CaptureTile {
                document_x: left,
                document_y: top,
                width,
                height,
                column,
                row,
            });
        }
    }

    log::debug!(
        "Planned {}x{} tiles for {:?} with viewport {}x{}",
        columns,
        rows,
        capture_rect,
        viewport.width,
        viewport.height
    );

    TilePlan {
        capture_rect,
        tiles,
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: f64, height: f64) -> Size<Viewport> {
        Size::new(width, height)
    }

    #[test]
    fn test_tall_element_splits_into_rows() {
        let plan = plan_tiles(Rect::new(0.0, 0.0, 800.0, 1500.0), viewport(800.0, 600.0), 0.0);
        assert_eq!(plan.tiles.len(), 3);
        assert_eq!((plan.columns, plan.rows), (1, 3));

        let spans: Vec<_> = plan
            .tiles
            .iter()
            .map(|t| (t.row, t.document_y, t.height))
            .collect();
        assert_eq!(
            spans,
            vec![(0, 0.0, 600.0), (1, 600.0, 600.0), (2, 1200.0, 300.0)]
        );
    }

    #[test]
    fn test_region_within_viewport_is_single_tile() {
        let target = Rect::new(40.0, 900.0, 300.0, 200.0);
        let plan = plan_tiles(target, viewport(800.0, 600.0), 0.0);
        assert!(plan.is_single_tile());
        assert_eq!(plan.tiles[0].document_rect(), target);
    }

    #[test]
    fn test_margin_expands_capture_rect() {
        let plan = plan_tiles(Rect::new(100.0, 100.0, 800.0, 600.0), viewport(800.0, 600.0), 10.0);
        assert_eq!(plan.capture_rect, Rect::new(90.0, 90.0, 820.0, 620.0));
        assert_eq!((plan.columns, plan.rows), (2, 2));
        let last = plan.tiles.last().copied().unwrap();
        assert_eq!((last.width, last.height), (20.0, 20.0));
    }

    #[test]
    fn test_row_major_order() {
        let plan = plan_tiles(Rect::new(0.0, 0.0, 1000.0, 1000.0), viewport(400.0, 400.0), 0.0);
        let order: Vec<_> = plan.tiles.iter().map(|t| (t.row, t.column)).collect();
        assert_eq!(
            order,
            vec![
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2)
            ]
        );
    }

    #[test]
    fn test_tiles_cover_exactly_without_overlap() {
        let cases = [
            (Rect::new(0.0, 0.0, 1920.0, 5000.0), viewport(1280.0, 720.0)),
            (Rect::new(13.5, 7.25, 333.0, 999.0), viewport(100.0, 250.0)),
            (Rect::new(0.0, 0.0, 800.0, 600.0), viewport(800.0, 600.0)),
            (Rect::new(5.0, 5.0, 2401.0, 1.0), viewport(800.0, 600.0)),
        ];
        for (target, vp) in cases {
            let plan = plan_tiles(target, vp, 0.0);
            let area: f64 = plan.tiles.iter().map(CaptureTile::area).sum();
            let expected = plan.capture_rect.width * plan.capture_rect.height;
            assert!((area - expected).abs() < 1e-6, "{area} != {expected}");

            for (i, a) in plan.tiles.iter().enumerate() {
                assert!(a.width > 0.0 && a.height > 0.0);
                assert!(a.width <= vp.width && a.height <= vp.height);
                assert!(plan.capture_rect.contains_rect(&a.document_rect()));
                for b in &plan.tiles[i + 1..] {
                    assert!(a.document_rect().intersect(b.document_rect()).is_none());
                }
            }
        }
    }

    #[test]
    fn test_margin_is_clamped_to_content() {
        let content = Rect::new(0.0, 0.0, 800.0, 2000.0);
        let plan = plan_tiles_within(
            Rect::new(0.0, 1800.0, 800.0, 200.0),
            viewport(800.0, 600.0),
            20.0,
            content,
        );
        assert_eq!(plan.capture_rect, Rect::new(0.0, 1780.0, 800.0, 220.0));
        assert!(plan.is_single_tile());
    }

    #[test]
    fn test_empty_target_plans_nothing() {
        let plan = plan_tiles(Rect::new(10.0, 10.0, 0.0, 50.0), viewport(800.0, 600.0), 0.0);
        assert!(plan.tiles.is_empty());
    }
}
