//! In-memory page backed by a tall raster
//!
//! The document is one image in device pixels. The simulated viewport shows a
//! window of it at the current scroll offset, with fixed elements painted on
//! top unless they are hidden. Inner scroll containers have their own content
//! raster, drawn at a fixed box of the viewport at their own scroll offset.
//! [`SimulatedPage`] implements [`Page`];
//! [`SimulatedCamera`] implements [`FrameSource`] over the same state, the way
//! a browser's screenshot primitive sees the same tab the page script scrolls.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;

use crate::domain::{
    Color, Document, ElementId, Rect, ScrollOffset, Size, Viewport, device_length,
    to_device_pixels, viewport_rect_of,
};
use crate::encode;
use crate::page::{FrameSource, OverflowTarget, Page, ScrollContainer};

#[derive(Clone, Debug)]
struct FixedElement {
    id: ElementId,
    rect: Rect<Viewport>,
    color: Color,
}

/// Scrollable element with its own content, fixed in the viewport
#[derive(Clone, Debug)]
struct InnerContainer {
    id: ElementId,
    client: Rect<Viewport>,
    content: RgbaImage,
    scroll: ScrollOffset,
}

#[derive(Debug)]
struct PageState {
    document: RgbaImage,
    dpr: f64,
    viewport: Size<Viewport>,
    scroll: ScrollOffset,
    scroll_locked: bool,
    overflow: HashMap<OverflowTarget, String>,
    visibility: HashMap<ElementId, String>,
    /// Element boxes in the content space of their scroll container
    elements: HashMap<ElementId, (ScrollContainer, Rect<Document>)>,
    containers: Vec<InnerContainer>,
    fixed: Vec<FixedElement>,
    lazy_content: Option<RgbaImage>,
    fail_on_capture: Option<usize>,
    captures: usize,
    animation_frames: usize,
    frames_at_capture: Vec<usize>,
}

impl PageState {
    fn content_size(&self) -> Size<Document> {
        self.css_size(&self.document)
    }

    fn container(&self, id: &ElementId) -> Option<&InnerContainer> {
        self.containers.iter().find(|c| &c.id == id)
    }

    fn css_size(&self, image: &RgbaImage) -> Size<Document> {
        Size::new(
            image.width() as f64 / self.dpr,
            image.height() as f64 / self.dpr,
        )
    }

    /// Visible box, content size and scroll offset of a scroll container
    fn scroller(
        &self,
        container: &ScrollContainer,
    ) -> Option<(Rect<Viewport>, Size<Document>, ScrollOffset)> {
        match container {
            ScrollContainer::Document => {
                Some((self.viewport.to_rect(), self.content_size(), self.scroll))
            }
            ScrollContainer::Element(id) => self
                .container(id)
                .map(|c| (c.client, self.css_size(&c.content), c.scroll)),
        }
    }

    fn scroll_to(&mut self, container: &ScrollContainer, offset: ScrollOffset) {
        if self.scroll_locked {
            return;
        }
        let Some((client, content, _)) = self.scroller(container) else {
            return;
        };
        let clamped = ScrollOffset::new(
            offset.left.clamp(0.0, (content.width - client.width).max(0.0)),
            offset.top.clamp(0.0, (content.height - client.height).max(0.0)),
        );
        match container {
            ScrollContainer::Document => self.scroll = clamped,
            ScrollContainer::Element(id) => {
                if let Some(c) = self.containers.iter_mut().find(|c| &c.id == id) {
                    c.scroll = clamped;
                }
            }
        }
    }

    /// Crop of `content` at `scroll`, `width` x `height` device pixels
    fn window(
        &self,
        content: &RgbaImage,
        scroll: ScrollOffset,
        width: u32,
        height: u32,
    ) -> RgbaImage {
        let origin = to_device_pixels(
            Rect::<Document>::new(scroll.left, scroll.top, 0.0, 0.0),
            self.dpr,
        );
        image::imageops::crop_imm(
            content,
            origin.left.max(0) as u32,
            origin.top.max(0) as u32,
            width,
            height,
        )
        .to_image()
    }

    /// Pixels currently on screen
    fn render_viewport(&self) -> RgbaImage {
        let width = device_length(self.viewport.width, self.dpr);
        let height = device_length(self.viewport.height, self.dpr);
        let mut frame = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));

        let window = self.window(&self.document, self.scroll, width, height);
        image::imageops::replace(&mut frame, &window, 0, 0);

        for container in &self.containers {
            let px = to_device_pixels(container.client, self.dpr);
            let (Ok(w), Ok(h)) = (u32::try_from(px.width()), u32::try_from(px.height())) else {
                continue;
            };
            let window = self.window(&container.content, container.scroll, w, h);
            image::imageops::replace(&mut frame, &window, px.left as i64, px.top as i64);
        }

        for element in &self.fixed {
            if self.visibility.get(&element.id).map(String::as_str) == Some("hidden") {
                continue;
            }
            let px = to_device_pixels(element.rect, self.dpr);
            let color = image::Rgba(element.color.to_rgba_u8());
            for y in px.top.max(0)..px.bottom.min(height as i32) {
                for x in px.left.max(0)..px.right.min(width as i32) {
                    frame.put_pixel(x as u32, y as u32, color);
                }
            }
        }

        frame
    }

    /// Append lazily loaded rows below the current document
    fn load_lazy_content(&mut self) {
        let Some(extra) = self.lazy_content.take() else {
            return;
        };
        let width = self.document.width().max(extra.width());
        let height = self.document.height() + extra.height();
        let mut grown = RgbaImage::new(width, height);
        image::imageops::replace(&mut grown, &self.document, 0, 0);
        image::imageops::replace(&mut grown, &extra, 0, self.document.height() as i64);
        log::debug!(
            "Simulated page grew from {} to {} rows",
            self.document.height(),
            height
        );
        self.document = grown;
    }
}

/// Scrollable page over an in-memory document raster
#[derive(Clone, Debug)]
pub struct SimulatedPage {
    state: Rc<RefCell<PageState>>,
}

impl SimulatedPage {
    /// `document` is in device pixels; `viewport` is in CSS pixels
    pub fn new(document: RgbaImage, dpr: f64, viewport: Size<Viewport>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PageState {
                document,
                dpr: if dpr > 0.0 { dpr } else { 1.0 },
                viewport,
                scroll: ScrollOffset::default(),
                scroll_locked: false,
                overflow: HashMap::new(),
                visibility: HashMap::new(),
                elements: HashMap::new(),
                containers: Vec::new(),
                fixed: Vec::new(),
                lazy_content: None,
                fail_on_capture: None,
                captures: 0,
                animation_frames: 0,
                frames_at_capture: Vec::new(),
            })),
        }
    }

    /// Named element occupying `rect` of the document
    pub fn with_element(self, id: &str, rect: Rect<Document>) -> Self {
        self.state
            .borrow_mut()
            .elements
            .insert(ElementId::new(id), (ScrollContainer::Document, rect));
        self
    }

    /// Scrollable element shown at `client`, scrolling over `content`
    /// (device pixels)
    pub fn with_scroll_container(
        self,
        id: &str,
        client: Rect<Viewport>,
        content: RgbaImage,
    ) -> Self {
        self.state.borrow_mut().containers.push(InnerContainer {
            id: ElementId::new(id),
            client,
            content,
            scroll: ScrollOffset::default(),
        });
        self
    }

    /// Named element occupying `rect` of scroll container `container`'s content
    pub fn with_element_in(self, container: &str, id: &str, rect: Rect<Document>) -> Self {
        let parent = ScrollContainer::Element(ElementId::new(container));
        self.state
            .borrow_mut()
            .elements
            .insert(ElementId::new(id), (parent, rect));
        self
    }

    /// Fixed-position element painted over the viewport at `rect`
    pub fn with_fixed_element(self, id: &str, rect: Rect<Viewport>, color: Color) -> Self {
        self.state.borrow_mut().fixed.push(FixedElement {
            id: ElementId::new(id),
            rect,
            color,
        });
        self
    }

    /// Rows appended to the document right after the first capture
    pub fn with_lazy_content(self, extra: RgbaImage) -> Self {
        self.state.borrow_mut().lazy_content = Some(extra);
        self
    }

    /// Ignore every scroll request
    pub fn with_scroll_locked(self) -> Self {
        self.state.borrow_mut().scroll_locked = true;
        self
    }

    /// Make the `n`-th capture (1-based) fail
    pub fn with_failing_capture(self, n: usize) -> Self {
        self.state.borrow_mut().fail_on_capture = Some(n);
        self
    }

    /// Capture primitive sharing this page's state
    pub fn camera(&self) -> SimulatedCamera {
        SimulatedCamera {
            state: Rc::clone(&self.state),
        }
    }

    pub fn set_scroll(&self, offset: ScrollOffset) {
        self.state.borrow_mut().scroll = offset;
    }

    pub fn set_style_overflow(&self, target: OverflowTarget, value: &str) {
        self.state
            .borrow_mut()
            .overflow
            .insert(target, value.to_string());
    }

    pub fn current_scroll(&self) -> ScrollOffset {
        self.state.borrow().scroll
    }

    pub fn set_container_scroll(&self, id: &str, offset: ScrollOffset) {
        let mut state = self.state.borrow_mut();
        if let Some(c) = state.containers.iter_mut().find(|c| c.id.0 == id) {
            c.scroll = offset;
        }
    }

    pub fn container_scroll(&self, id: &str) -> Option<ScrollOffset> {
        self.state
            .borrow()
            .container(&ElementId::new(id))
            .map(|c| c.scroll)
    }

    /// Content raster of an inner scroll container
    pub fn container_content(&self, id: &str) -> Option<RgbaImage> {
        self.state
            .borrow()
            .container(&ElementId::new(id))
            .map(|c| c.content.clone())
    }

    pub fn style_overflow(&self, target: &OverflowTarget) -> Option<String> {
        self.state.borrow().overflow.get(target).cloned()
    }

    pub fn style_visibility(&self, id: &str) -> Option<String> {
        self.state.borrow().visibility.get(&ElementId::new(id)).cloned()
    }

    pub fn captures(&self) -> usize {
        self.state.borrow().captures
    }

    /// Animation frames that had elapsed when each capture was taken
    pub fn frames_at_capture(&self) -> Vec<usize> {
        self.state.borrow().frames_at_capture.clone()
    }

    /// Current document raster
    pub fn document(&self) -> RgbaImage {
        self.state.borrow().document.clone()
    }
}

impl Page for SimulatedPage {
    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().dpr
    }

    fn client_rect(&self, container: &ScrollContainer) -> Option<Rect<Viewport>> {
        self.state
            .borrow()
            .scroller(container)
            .map(|(client, _, _)| client)
    }

    fn scroll_offset(&self, container: &ScrollContainer) -> ScrollOffset {
        self.state
            .borrow()
            .scroller(container)
            .map(|(_, _, scroll)| scroll)
            .unwrap_or_default()
    }

    fn scroll_to(&mut self, container: &ScrollContainer, offset: ScrollOffset) {
        self.state.borrow_mut().scroll_to(container, offset);
    }

    fn scroll_size(&self, container: &ScrollContainer) -> Size<Document> {
        self.state
            .borrow()
            .scroller(container)
            .map(|(_, content, _)| content)
            .unwrap_or_default()
    }

    fn bounding_client_rect(&self, element: &ElementId) -> Option<Rect<Viewport>> {
        let state = self.state.borrow();
        let (parent, rect) = state.elements.get(element)?;
        let (client, _, scroll) = state.scroller(parent)?;
        Some(viewport_rect_of(*rect, scroll).translate(client.x, client.y))
    }

    fn scroll_container_of(&self, element: &ElementId) -> ScrollContainer {
        self.state
            .borrow()
            .elements
            .get(element)
            .map(|(parent, _)| parent.clone())
            .unwrap_or(ScrollContainer::Document)
    }

    fn scrollable_elements(&self) -> Vec<ElementId> {
        self.state
            .borrow()
            .containers
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    fn overflow(&self, target: &OverflowTarget) -> Option<String> {
        self.style_overflow(target)
    }

    fn set_overflow(&mut self, target: &OverflowTarget, value: Option<&str>) {
        let mut state = self.state.borrow_mut();
        match value {
            Some(value) => {
                state.overflow.insert(target.clone(), value.to_string());
            }
            None => {
                state.overflow.remove(target);
            }
        }
    }

    fn fixed_elements(&self) -> Vec<ElementId> {
        self.state.borrow().fixed.iter().map(|f| f.id.clone()).collect()
    }

    fn visibility(&self, element: &ElementId) -> Option<String> {
        self.state.borrow().visibility.get(element).cloned()
    }

    fn set_visibility(&mut self, element: &ElementId, value: Option<&str>) {
        let mut state = self.state.borrow_mut();
        match value {
            Some(value) => {
                state.visibility.insert(element.clone(), value.to_string());
            }
            None => {
                state.visibility.remove(element);
            }
        }
    }

    async fn animation_frame(&mut self) {
        self.state.borrow_mut().animation_frames += 1;
        tokio::task::yield_now().await;
    }
}

/// Screenshot primitive of a [`SimulatedPage`]
#[derive(Clone, Debug)]
pub struct SimulatedCamera {
    state: Rc<RefCell<PageState>>,
}

impl FrameSource for SimulatedCamera {
    async fn capture_visible_frame(&mut self) -> anyhow::Result<String> {
        let frame = {
            let mut state = self.state.borrow_mut();
            state.captures += 1;
            let elapsed = state.animation_frames;
            state.frames_at_capture.push(elapsed);
            if state.fail_on_capture == Some(state.captures) {
                anyhow::bail!("tab was closed during capture {}", state.captures);
            }
            let frame = state.render_viewport();
            state.load_lazy_content();
            frame
        };

        let mut png = Vec::new();
        encode::write_png(&mut png, &frame)?;
        Ok(encode::data_url("image/png", &png))
    }
}
