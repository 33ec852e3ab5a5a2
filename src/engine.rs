//! Capture entry point: resolve the target, acquire frames, stitch, encode

use crate::acquisition::{acquire_grid, acquire_scrolling};
use crate::config::CaptureConfig;
use crate::domain::{
    CaptureResult, CaptureTarget, CapturedFrame, Document, ElementId, Rect, Size,
    document_rect_of,
};
use crate::encode::encode;
use crate::error::{CaptureError, Result};
use crate::page::{FrameSource, Page, ScrollContainer};
use crate::planner::plan_tiles_within;
use crate::render::image::stitch;

/// Content overflowing its container by less than this is not scrollable
const SCROLLABLE_SLACK_PX: f64 = 1.0;

/// Capture `target` from `page` and encode it in the configured format.
///
/// A missing target fails with [`CaptureError::NoTarget`] before the page is
/// touched. Otherwise the page's scroll position, overflow styles and element
/// visibility are restored before this returns, whether it succeeds or not.
pub async fn capture<P: Page, F: FrameSource>(
    page: &mut P,
    source: &mut F,
    target: Option<&CaptureTarget>,
    config: &CaptureConfig,
) -> Result<CaptureResult> {
    let target = target.ok_or(CaptureError::NoTarget)?;
    let dpr = page.device_pixel_ratio();

    let (frames, content_size) = match target {
        CaptureTarget::Element(id) => {
            let container = page.scroll_container_of(id);
            let rect = element_rect(page, id, &container)?;
            capture_region(page, source, container, rect, config.margin_px, config).await?
        }
        CaptureTarget::Region(rect) => {
            capture_region(
                page,
                source,
                ScrollContainer::Document,
                *rect,
                config.margin_px,
                config,
            )
            .await?
        }
        CaptureTarget::Visible => {
            let container = ScrollContainer::Document;
            let client = page
                .client_rect(&container)
                .ok_or_else(|| CaptureError::TargetNotFound("document".to_string()))?;
            let rect = document_rect_of(client.size().to_rect(), page.scroll_offset(&container));
            capture_region(page, source, container, rect, 0.0, config).await?
        }
        CaptureTarget::FullPage => {
            let container = full_page_container(page);
            let capture = acquire_scrolling(page, source, &container, config).await?;
            (capture.frames, capture.content_size)
        }
        CaptureTarget::ScrollContainer(id) => {
            let container = ScrollContainer::Element(id.clone());
            if page.client_rect(&container).is_none() {
                return Err(CaptureError::TargetNotFound(id.to_string()));
            }
            let capture = acquire_scrolling(page, source, &container, config).await?;
            (capture.frames, capture.content_size)
        }
    };

    if frames.is_empty() || content_size.width <= 0.0 || content_size.height <= 0.0 {
        return Err(CaptureError::EmptyCapture);
    }

    let canvas = stitch(
        &frames,
        content_size,
        dpr,
        &config.padding,
        &config.corners,
        config.format,
    );
    log::info!(
        "Stitched {} frame(s) into {}x{} {} image",
        frames.len(),
        canvas.width(),
        canvas.height(),
        config.format
    );

    encode(&canvas, config.format, config.quality)
}

/// Document rectangle of an element inside its scroll container
fn element_rect<P: Page>(
    page: &P,
    id: &ElementId,
    container: &ScrollContainer,
) -> Result<Rect<Document>> {
    let client = page
        .bounding_client_rect(id)
        .ok_or_else(|| CaptureError::TargetNotFound(id.to_string()))?;
    let origin = page
        .client_rect(container)
        .ok_or_else(|| CaptureError::TargetNotFound(format!("{container:?}")))?;
    let relative = client.translate(-origin.x, -origin.y);
    Ok(document_rect_of(relative, page.scroll_offset(container)))
}

async fn capture_region<P: Page, F: FrameSource>(
    page: &mut P,
    source: &mut F,
    container: ScrollContainer,
    rect: Rect<Document>,
    margin_px: f64,
    config: &CaptureConfig,
) -> Result<(Vec<CapturedFrame>, Size<Document>)> {
    let client = page
        .client_rect(&container)
        .ok_or_else(|| CaptureError::TargetNotFound(format!("{container:?}")))?;
    let content = page.scroll_size(&container).to_rect();
    let plan = plan_tiles_within(rect, client.size(), margin_px, content);
    if plan.tiles.is_empty() {
        return Err(CaptureError::EmptyCapture);
    }

    let frames = acquire_grid(page, source, &container, &plan, config).await?;
    Ok((frames, plan.capture_rect.size()))
}

/// The document when it scrolls, else the largest scrollable element inside it.
///
/// Single-page apps often pin the document to the viewport and scroll an
/// inner element instead.
fn full_page_container<P: Page>(page: &P) -> ScrollContainer {
    let document = ScrollContainer::Document;
    if overflow_height(page, &document).is_some() {
        return document;
    }

    let inner = page
        .scrollable_elements()
        .into_iter()
        .map(ScrollContainer::Element)
        .filter_map(|container| {
            overflow_height(page, &container)?;
            let client = page.client_rect(&container)?;
            Some((client.width * client.height, container))
        })
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, container)| container);

    match inner {
        Some(container) => {
            log::info!("Document does not scroll, capturing {:?} instead", container);
            container
        }
        None => document,
    }
}

/// How far a container's content reaches past its visible height, if at all
fn overflow_height<P: Page>(page: &P, container: &ScrollContainer) -> Option<f64> {
    let client = page.client_rect(container)?;
    let overflow = page.scroll_size(container).height - client.height;
    (overflow > SCROLLABLE_SLACK_PX).then_some(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameImage;
    use crate::domain::{Color, CornerStyle, ImageFormat, PaddingSpec, ScrollOffset, Viewport};
    use crate::page::OverflowTarget;
    use crate::simulated::SimulatedPage;
    use image::RgbaImage;

    /// Every pixel distinct, so any misplaced row or column shows up
    fn document(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let high = ((y / 256) * 16 + x / 256) as u8;
            image::Rgba([(x % 256) as u8, (y % 256) as u8, high, 255])
        })
    }

    fn config() -> CaptureConfig {
        CaptureConfig {
            hide_scrollbars: true,
            ..CaptureConfig::default()
        }
    }

    fn decode(result: &CaptureResult) -> RgbaImage {
        FrameImage::from_data_uri(&result.data_url).unwrap().rgba
    }

    fn crop(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
        image::imageops::crop_imm(image, x, y, width, height).to_image()
    }

    /// Document pinned to the viewport, with a scrolling feed at (100, 50)
    fn pinned_page() -> SimulatedPage {
        let backdrop = RgbaImage::from_pixel(800, 600, image::Rgba([90, 90, 90, 255]));
        let feed = Rect::new(100.0, 50.0, 400.0, 500.0);
        SimulatedPage::new(backdrop, 1.0, Size::new(800.0, 600.0))
            .with_scroll_container("feed", feed, document(400, 2000))
            .with_element_in("feed", "post", Rect::new(0.0, 900.0, 400.0, 700.0))
    }

    async fn run(
        page: &mut SimulatedPage,
        target: CaptureTarget,
        config: &CaptureConfig,
    ) -> Result<CaptureResult> {
        let mut camera = page.camera();
        capture(page, &mut camera, Some(&target), config).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_tall_element_is_stitched_from_three_tiles() {
        for dpr in [1.0, 2.0] {
            let scale = dpr as u32;
            let viewport = Size::new(800.0, 600.0);
            let mut page = SimulatedPage::new(document(800 * scale, 3000 * scale), dpr, viewport)
                .with_element("article", Rect::new(0.0, 500.0, 800.0, 1500.0));

            let target = CaptureTarget::Element(ElementId::new("article"));
            let result = run(&mut page, target, &config()).await.unwrap();

            assert_eq!(page.captures(), 3);
            assert_eq!((result.width, result.height), (800 * scale, 1500 * scale));
            let expected = crop(&page.document(), 0, 500 * scale, 800 * scale, 1500 * scale);
            assert!(decode(&result) == expected, "mismatch at dpr {dpr}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_spanning_columns_and_rows() {
        let mut page = SimulatedPage::new(document(1000, 1000), 1.0, Size::new(400.0, 300.0));
        let region = Rect::new(50.0, 50.0, 700.0, 500.0);

        let result = run(&mut page, CaptureTarget::Region(region), &config()).await.unwrap();

        assert_eq!(page.captures(), 4);
        assert!(decode(&result) == crop(&page.document(), 50, 50, 700, 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_at_content_end_uses_clamped_scroll() {
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0));
        let region = Rect::new(0.0, 2500.0, 800.0, 500.0);

        let result = run(&mut page, CaptureTarget::Region(region), &config()).await.unwrap();

        assert_eq!(page.captures(), 1);
        assert!(decode(&result) == crop(&page.document(), 0, 2500, 800, 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_margin_is_clamped_to_document() {
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0))
            .with_element("footer", Rect::new(0.0, 2900.0, 800.0, 100.0));
        let config = CaptureConfig {
            margin_px: 20.0,
            ..config()
        };

        let result = run(&mut page, CaptureTarget::Element(ElementId::new("footer")), &config)
            .await
            .unwrap();

        assert_eq!((result.width, result.height), (800, 120));
        assert!(decode(&result) == crop(&page.document(), 0, 2880, 800, 120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_area_is_captured_without_scrolling() {
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0));
        page.set_scroll(ScrollOffset::new(0.0, 700.0));

        let result = run(&mut page, CaptureTarget::Visible, &config()).await.unwrap();

        assert_eq!(page.captures(), 1);
        assert_eq!(page.current_scroll(), ScrollOffset::new(0.0, 700.0));
        assert!(decode(&result) == crop(&page.document(), 0, 700, 800, 600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_header_never_covers_scrolled_element() {
        let red = Color::rgb(255, 0, 0);
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0))
            .with_element("article", Rect::new(0.0, 1000.0, 800.0, 1500.0))
            .with_fixed_element("header", Rect::<Viewport>::new(0.0, 0.0, 800.0, 60.0), red);

        let target = CaptureTarget::Element(ElementId::new("article"));
        let result = run(&mut page, target, &config()).await.unwrap();

        assert!(decode(&result) == crop(&page.document(), 0, 1000, 800, 1500));
        assert_eq!(page.style_visibility("header"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_capture_keeps_fixed_header() {
        let red = Color::rgb(255, 0, 0);
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0))
            .with_fixed_element("header", Rect::<Viewport>::new(0.0, 0.0, 800.0, 60.0), red);
        page.set_scroll(ScrollOffset::new(0.0, 700.0));

        let result = run(&mut page, CaptureTarget::Visible, &config()).await.unwrap();
        let image = decode(&result);

        assert_eq!(image.get_pixel(400, 10).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(400, 60), page.document().get_pixel(400, 760));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_container_is_captured_to_its_end() {
        let mut page = pinned_page();
        page.set_container_scroll("feed", ScrollOffset::new(0.0, 120.0));
        let feed = OverflowTarget::Container(ScrollContainer::Element(ElementId::new("feed")));

        let target = CaptureTarget::ScrollContainer(ElementId::new("feed"));
        let result = run(&mut page, target, &config()).await.unwrap();

        assert_eq!(page.captures(), 4);
        assert_eq!((result.width, result.height), (400, 2000));
        assert!(Some(decode(&result)) == page.container_content("feed"));
        assert_eq!(page.container_scroll("feed"), Some(ScrollOffset::new(0.0, 120.0)));
        assert_eq!(page.style_overflow(&feed), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_page_falls_back_to_inner_container() {
        let mut page = pinned_page();

        let result = run(&mut page, CaptureTarget::FullPage, &config()).await.unwrap();

        assert!(Some(decode(&result)) == page.container_content("feed"));
        assert_eq!(page.current_scroll(), ScrollOffset::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_inside_scroll_container() {
        let mut page = pinned_page();
        page.set_container_scroll("feed", ScrollOffset::new(0.0, 120.0));

        let target = CaptureTarget::Element(ElementId::new("post"));
        let result = run(&mut page, target, &config()).await.unwrap();

        assert_eq!(page.captures(), 2);
        let content = page.container_content("feed").unwrap();
        assert!(decode(&result) == crop(&content, 0, 900, 400, 700));
        assert_eq!(page.container_scroll("feed"), Some(ScrollOffset::new(0.0, 120.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_scroll_container() {
        let mut page = pinned_page();

        let target = CaptureTarget::ScrollContainer(ElementId::new("sidebar"));
        let err = run(&mut page, target, &config()).await.unwrap_err();

        assert!(matches!(err, CaptureError::TargetNotFound(_)));
        assert_eq!(page.captures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_page_reproduces_document() {
        for dpr in [1.0, 2.0] {
            let scale = dpr as u32;
            let viewport = Size::new(300.0, 400.0);
            let mut page = SimulatedPage::new(document(300 * scale, 1000 * scale), dpr, viewport);
            page.set_scroll(ScrollOffset::new(0.0, 250.0));

            let result = run(&mut page, CaptureTarget::FullPage, &config()).await.unwrap();

            assert_eq!(page.captures(), 3);
            assert!(decode(&result) == page.document(), "mismatch at dpr {dpr}");
            assert_eq!(page.current_scroll(), ScrollOffset::new(0.0, 250.0));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_page_picks_up_lazy_content() {
        let extra = RgbaImage::from_pixel(300, 200, image::Rgba([0, 0, 255, 255]));
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0))
            .with_lazy_content(extra);

        let result = run(&mut page, CaptureTarget::FullPage, &config()).await.unwrap();

        assert_eq!(result.height, 1200);
        assert!(decode(&result) == page.document());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_header_appears_once() {
        let red = Color::rgb(255, 0, 0);
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0))
            .with_fixed_element("header", Rect::<Viewport>::new(0.0, 0.0, 300.0, 40.0), red);

        let result = run(&mut page, CaptureTarget::FullPage, &config()).await.unwrap();
        let image = decode(&result);

        let red_rows = (0..image.height())
            .filter(|&y| image.get_pixel(150, y).0 == [255, 0, 0, 255])
            .count();
        assert_eq!(red_rows, 40);
        assert_eq!(image.get_pixel(150, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(150, 400), page.document().get_pixel(150, 400));
        assert_eq!(page.style_visibility("header"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_header_hidden_everywhere_when_not_kept() {
        let red = Color::rgb(255, 0, 0);
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0))
            .with_fixed_element("header", Rect::<Viewport>::new(0.0, 0.0, 300.0, 40.0), red);
        let config = CaptureConfig {
            keep_fixed_in_first_frame: false,
            ..config()
        };

        let result = run(&mut page, CaptureTarget::FullPage, &config).await.unwrap();

        assert!(decode(&result) == page.document());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_scroll_stops_after_three_attempts() {
        let mut page = SimulatedPage::new(document(300, 3000), 1.0, Size::new(300.0, 400.0))
            .with_scroll_locked();

        let result = run(&mut page, CaptureTarget::FullPage, &config()).await.unwrap();

        assert_eq!(page.captures(), 3);
        assert_eq!((result.width, result.height), (300, 400));
        assert!(decode(&result) == crop(&page.document(), 0, 0, 300, 400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_settle_before_capture() {
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0));
        let config = config();

        run(&mut page, CaptureTarget::FullPage, &config).await.unwrap();

        let ticks = page.frames_at_capture();
        assert_eq!(ticks.len(), 3);
        let frames = config.animation_frames as usize;
        assert!(ticks[0] >= frames);
        assert!(ticks.windows(2).all(|w| w[1] - w[0] >= frames));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_restored_after_failed_capture() {
        let mut page = SimulatedPage::new(document(1000, 1000), 1.0, Size::new(400.0, 300.0))
            .with_fixed_element("nav", Rect::new(0.0, 0.0, 400.0, 30.0), Color::rgb(0, 0, 0))
            .with_failing_capture(2);
        page.set_scroll(ScrollOffset::new(0.0, 150.0));
        page.set_style_overflow(OverflowTarget::Body, "auto");

        let region = Rect::new(50.0, 50.0, 700.0, 500.0);
        let err = run(&mut page, CaptureTarget::Region(region), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Acquisition { frame: 1, .. }), "{err}");
        assert_eq!(page.captures(), 2);
        assert_eq!(page.current_scroll(), ScrollOffset::new(0.0, 150.0));
        assert_eq!(page.style_overflow(&OverflowTarget::Body).as_deref(), Some("auto"));
        assert_eq!(
            page.style_overflow(&OverflowTarget::Container(ScrollContainer::Document)),
            None
        );
        assert_eq!(page.style_visibility("nav"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_target_leaves_page_untouched() {
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0));
        page.set_scroll(ScrollOffset::new(0.0, 120.0));
        let mut camera = page.camera();

        let err = capture(&mut page, &mut camera, None, &config()).await.unwrap_err();

        assert!(matches!(err, CaptureError::NoTarget));
        assert_eq!(page.captures(), 0);
        assert_eq!(page.current_scroll(), ScrollOffset::new(0.0, 120.0));
        assert_eq!(page.style_overflow(&OverflowTarget::Body), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_element() {
        let mut page = SimulatedPage::new(document(300, 1000), 1.0, Size::new(300.0, 400.0));

        let err = run(&mut page, CaptureTarget::Element(ElementId::new("nope")), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::TargetNotFound(_)));
        assert_eq!(page.captures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jpeg_with_padding_and_corners() {
        let mut page = SimulatedPage::new(document(800, 3000), 1.0, Size::new(800.0, 600.0))
            .with_element("card", Rect::new(100.0, 100.0, 400.0, 300.0));
        let config = CaptureConfig {
            format: ImageFormat::Jpeg,
            quality: 80,
            padding: PaddingSpec::uniform(16.0, Color::rgb(30, 30, 30)),
            corners: CornerStyle {
                radius: 12.0,
                use_squircle: true,
                smoothing: 0.6,
            },
            ..config()
        };

        let result = run(&mut page, CaptureTarget::Element(ElementId::new("card")), &config)
            .await
            .unwrap();

        assert!(result.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(result.blob.mime_type, "image/jpeg");
        assert_eq!((result.width, result.height), (432, 332));
        let image = decode(&result);
        // Clipped corners are flattened onto white, the padding stays dark
        let corner = image.get_pixel(0, 0).0[0] as i32;
        let ring = image.get_pixel(8, 166).0[0] as i32;
        assert!(corner > ring + 100, "corner {corner}, padding {ring}");
    }
}
