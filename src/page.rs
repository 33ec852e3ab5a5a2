//! Interfaces the engine consumes from the page being captured
//!
//! The engine never talks to a browser directly. Scroll state, overflow
//! styles, fixed-element visibility and animation-frame ticks come through
//! [`Page`]; the single-shot screenshot primitive comes through
//! [`FrameSource`]. Both are injected, so tests can drive the engine with an
//! in-memory page and a canned capture primitive.

use std::future::Future;

use crate::domain::{Document, ElementId, Rect, ScrollOffset, Size, Viewport};

/// The element whose scroll position the acquisition loop drives
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollContainer {
    /// The window / scrolling element of the document
    Document,
    /// A scrollable element inside the document
    Element(ElementId),
}

/// Element whose `overflow` style is changed for the duration of a capture
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OverflowTarget {
    Body,
    Container(ScrollContainer),
}

/// Scroll, style and element access for the page being captured.
///
/// All methods except [`Page::animation_frame`] are synchronous reads or
/// writes of page state.
pub trait Page {
    /// Ratio between device pixels and CSS pixels
    fn device_pixel_ratio(&self) -> f64;

    /// Visible box of a scroll container in viewport coordinates
    /// (`None` if the container no longer exists)
    fn client_rect(&self, container: &ScrollContainer) -> Option<Rect<Viewport>>;

    fn scroll_offset(&self, container: &ScrollContainer) -> ScrollOffset;

    /// Request a scroll position; the page may clamp it to its content bounds
    fn scroll_to(&mut self, container: &ScrollContainer, offset: ScrollOffset);

    /// Full scrollable content size (`scrollWidth` x `scrollHeight`)
    fn scroll_size(&self, container: &ScrollContainer) -> Size<Document>;

    /// Viewport-relative bounding box of an element
    fn bounding_client_rect(&self, element: &ElementId) -> Option<Rect<Viewport>>;

    /// Nearest scrollable ancestor of an element
    fn scroll_container_of(&self, element: &ElementId) -> ScrollContainer;

    /// Elements other than the document that scroll their own content
    fn scrollable_elements(&self) -> Vec<ElementId>;

    /// Inline `overflow` style (`None` when unset)
    fn overflow(&self, target: &OverflowTarget) -> Option<String>;

    fn set_overflow(&mut self, target: &OverflowTarget, value: Option<&str>);

    /// Fixed and sticky positioned elements currently in the document
    fn fixed_elements(&self) -> Vec<ElementId>;

    /// Inline `visibility` style (`None` when unset)
    fn visibility(&self, element: &ElementId) -> Option<String>;

    fn set_visibility(&mut self, element: &ElementId, value: Option<&str>);

    /// Resolve on the next animation frame
    fn animation_frame(&mut self) -> impl Future<Output = ()>;
}

/// Single-shot capture of the visible viewport.
///
/// Resolves to an image data URI reflecting exactly what is on screen when
/// called.
pub trait FrameSource {
    fn capture_visible_frame(&mut self) -> impl Future<Output = anyhow::Result<String>>;
}
