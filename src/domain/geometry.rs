//! Geometric types for capture regions and coordinate spaces
//!
//! Rectangles measured in CSS pixels are tagged with the space they live in
//! (`Viewport` or `Document`), so a viewport-relative box can never be passed
//! where a document-relative one is expected. Device (backing-store) pixels
//! use the integer [`PixelRect`]. Every conversion between spaces is one of the
//! free functions at the bottom of this module.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::num::NonZeroU32;

/// Marker for a coordinate space measured in CSS pixels
pub trait Space: Copy + Clone + Debug + Default + PartialEq {}

/// Relative to the top-left corner of the visible viewport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport;

/// Relative to the top-left corner of the scrolled content
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Document;

impl Space for Viewport {}
impl Space for Document {}

/// Rectangle in CSS pixels, in the coordinate space `S`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect<S: Space> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    space: PhantomData<S>,
}

impl<S: Space> Rect<S> {
    /// Create a new rectangle; negative sizes collapse to zero
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            space: PhantomData,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size<S> {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect<S>) -> Option<Rect<S>> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Translate the rectangle by the given offset
    pub fn translate(&self, dx: f64, dy: f64) -> Rect<S> {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expand(&self, margin: f64) -> Rect<S> {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Whether `other` lies completely inside this rectangle
    pub fn contains_rect(&self, other: &Rect<S>) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Width and height in CSS pixels, in the coordinate space `S`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size<S: Space> {
    pub width: f64,
    pub height: f64,
    space: PhantomData<S>,
}

impl<S: Space> Size<S> {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            space: PhantomData,
        }
    }

    /// Rectangle of this size anchored at the origin
    pub fn to_rect(self) -> Rect<S> {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Scroll position of a container: the document point shown at the
/// container's top-left corner
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

impl ScrollOffset {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Rectangle in device pixels (left/top inclusive, right/bottom exclusive)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle covering a whole image of the given size
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, clamp_i32(width as f64), clamp_i32(height as f64))
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: PixelRect) -> Option<PixelRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(PixelRect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Translate the rectangle by the given offset
    pub fn translate(&self, x: i32, y: i32) -> PixelRect {
        PixelRect {
            left: self.left + x,
            top: self.top + y,
            right: self.right + x,
            bottom: self.bottom + y,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Convert to dimensions (NonZeroU32 width and height)
    pub fn dimensions(self) -> Option<RectDimension> {
        let width = NonZeroU32::new(self.width().max(0).unsigned_abs())?;
        let height = NonZeroU32::new(self.height().max(0).unsigned_abs())?;
        Some(RectDimension { width, height })
    }
}

/// Non-zero dimensions of a rectangle
#[derive(Clone, Copy, Debug)]
pub struct RectDimension {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl RectDimension {
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

/// Values this close to an integer are treated as that integer, so float
/// noise (`0.1 * 3.0`) never turns into an extra pixel row.
const SNAP_EPSILON: f64 = 1e-6;

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        value
    }
}

fn clamp_i32(value: f64) -> i32 {
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Document-space box of an element, from its viewport-relative bounding box
/// and the scroll offset it was measured at.
///
/// Must be recomputed after every scroll; nothing here is cached.
pub fn document_rect_of(client_rect: Rect<Viewport>, scroll: ScrollOffset) -> Rect<Document> {
    Rect::new(
        client_rect.x + scroll.left,
        client_rect.y + scroll.top,
        client_rect.width,
        client_rect.height,
    )
}

/// Viewport-relative position of a document-space box at the given scroll offset
pub fn viewport_rect_of(document_rect: Rect<Document>, scroll: ScrollOffset) -> Rect<Viewport> {
    Rect::new(
        document_rect.x - scroll.left,
        document_rect.y - scroll.top,
        document_rect.width,
        document_rect.height,
    )
}

/// Scale a CSS-pixel rectangle to device pixels.
///
/// Origins are floored and sizes ceiled, so adjacent tiles can overlap by a
/// pixel but never leave a seam between them.
pub fn to_device_pixels<S: Space>(rect: Rect<S>, dpr: f64) -> PixelRect {
    let left = clamp_i32(snap(rect.x * dpr).floor());
    let top = clamp_i32(snap(rect.y * dpr).floor());
    let width = clamp_i32(snap(rect.width * dpr).ceil());
    let height = clamp_i32(snap(rect.height * dpr).ceil());
    PixelRect::new(left, top, left.saturating_add(width), top.saturating_add(height))
}

/// Device-pixel length of a CSS length, ceiled the same way as rectangle sizes
pub fn device_length(css: f64, dpr: f64) -> u32 {
    snap(css * dpr).ceil().clamp(0.0, u32::MAX as f64) as u32
}

/// Intersect `rect` with an enclosing `bounds` rectangle of the same space.
///
/// A rectangle entirely outside `bounds` collapses to an empty rectangle at the
/// nearest point of `bounds`.
pub fn clamp_rect_to_bounds<S: Space>(rect: Rect<S>, bounds: Rect<S>) -> Rect<S> {
    let left = rect.x.clamp(bounds.x, bounds.right().max(bounds.x));
    let top = rect.y.clamp(bounds.y, bounds.bottom().max(bounds.y));
    let right = rect.right().clamp(left, bounds.right().max(left));
    let bottom = rect.bottom().clamp(top, bounds.bottom().max(top));
    Rect::new(left, top, right - left, bottom - top)
}
