//! Stitching captured frames into one canvas using tiny-skia
//!
//! Frames are copied pixel-for-pixel onto the content area, then the padding
//! ring is filled and the corner clip applied. No scrolling or IO happens
//! here; everything works on frames that were already captured.

use image::RgbaImage;
use tiny_skia::{ColorU8, FillRule, Mask, Paint, PathBuilder, Pixmap, Transform};

use super::geometry::{Outline, Segment, rounded_rect_outline, squircle_outline};
use crate::domain::{
    CapturedFrame, CornerStyle, Document, ImageFormat, PaddingSpec, PixelRect, Size,
    device_length,
};

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back.
///
/// tiny-skia works on premultiplied pixels, so colors are premultiplied on
/// the way in and demultiplied on the way out.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(mut pixmap) = Pixmap::new(w, h) else {
        return;
    };

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    f(&mut pixmap);

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
}

/// Convert an outline to a tiny-skia path
pub fn outline_path(outline: &Outline) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(outline.start.x as f32, outline.start.y as f32);
    for segment in &outline.segments {
        match *segment {
            Segment::Line(p) => pb.line_to(p.x as f32, p.y as f32),
            Segment::Cubic(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
        }
    }
    pb.close();
    pb.finish()
}

/// Clip outline for a `width` x `height` canvas, `None` when corners are square
pub fn corner_outline(width: u32, height: u32, corners: &CornerStyle, dpr: f64) -> Option<Outline> {
    let radius = corners.radius * dpr;
    if radius <= 0.0 {
        return None;
    }
    let (w, h) = (width as f64, height as f64);
    Some(if corners.use_squircle {
        squircle_outline(w, h, radius, corners.smoothing)
    } else {
        rounded_rect_outline(w, h, radius)
    })
}

/// Padding widths in device pixels: (top, right, bottom, left)
fn padding_px(padding: &PaddingSpec, dpr: f64) -> (u32, u32, u32, u32) {
    (
        device_length(padding.top.max(0.0), dpr),
        device_length(padding.right.max(0.0), dpr),
        device_length(padding.bottom.max(0.0), dpr),
        device_length(padding.left.max(0.0), dpr),
    )
}

/// Draw frames onto a new canvas sized for `content_size` plus padding, then
/// fill the padding ring and clip the corners.
pub fn stitch(
    frames: &[CapturedFrame],
    content_size: Size<Document>,
    dpr: f64,
    padding: &PaddingSpec,
    corners: &CornerStyle,
    format: ImageFormat,
) -> RgbaImage {
    let content_w = device_length(content_size.width, dpr);
    let content_h = device_length(content_size.height, dpr);
    let (pad_top, pad_right, pad_bottom, pad_left) = padding_px(padding, dpr);

    let width = content_w + pad_left + pad_right;
    let height = content_h + pad_top + pad_bottom;
    let mut canvas = RgbaImage::new(width, height);

    let content = PixelRect::new(
        pad_left as i32,
        pad_top as i32,
        (pad_left + content_w) as i32,
        (pad_top + content_h) as i32,
    );

    for frame in frames {
        draw_frame(&mut canvas, frame, content);
    }

    if !padding.is_empty() && (!padding.transparent_padding || !format.supports_alpha()) {
        fill_padding(&mut canvas, content, padding);
    }

    if let Some(outline) = corner_outline(width, height, corners, dpr) {
        clip_to_outline(&mut canvas, &outline);
    }

    log::debug!(
        "Stitched {} frame(s) into {}x{} canvas ({}x{} content)",
        frames.len(),
        width,
        height,
        content_w,
        content_h
    );

    canvas
}

/// Copy a frame's crop to its placement, clipped to the content area
fn draw_frame(canvas: &mut RgbaImage, frame: &CapturedFrame, content: PixelRect) {
    let Some(source) = frame
        .crop
        .intersect(PixelRect::from_size(frame.image.width(), frame.image.height()))
    else {
        return;
    };
    let offset_x = content.left + frame.placement.x - frame.crop.left;
    let offset_y = content.top + frame.placement.y - frame.crop.top;

    let Some(target) = source.translate(offset_x, offset_y).intersect(content) else {
        return;
    };
    let Some(dims) = target.dimensions() else {
        return;
    };

    let sub = image::imageops::crop_imm(
        &frame.image,
        (target.left - offset_x) as u32,
        (target.top - offset_y) as u32,
        dims.width(),
        dims.height(),
    )
    .to_image();
    image::imageops::replace(canvas, &sub, target.left as i64, target.top as i64);
}

/// Fill the ring between the canvas edge and the content area (even-odd)
fn fill_padding(canvas: &mut RgbaImage, content: PixelRect, padding: &PaddingSpec) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let [r, g, b, a] = padding.color.to_rgba_u8();

    with_pixmap(canvas, |pixmap| {
        let mut pb = PathBuilder::new();
        if let Some(outer) = tiny_skia::Rect::from_xywh(0.0, 0.0, w, h) {
            pb.push_rect(outer);
        }
        if let Some(inner) = tiny_skia::Rect::from_ltrb(
            content.left as f32,
            content.top as f32,
            content.right as f32,
            content.bottom as f32,
        ) {
            pb.push_rect(inner);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = false;
        pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    });
}

/// Make everything outside `outline` transparent
fn clip_to_outline(canvas: &mut RgbaImage, outline: &Outline) {
    let (w, h) = (canvas.width(), canvas.height());
    let Some(path) = outline_path(outline) else {
        return;
    };
    let Some(mut mask) = Mask::new(w, h) else {
        return;
    };
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());

    with_pixmap(canvas, |pixmap| pixmap.apply_mask(&mask));
}
