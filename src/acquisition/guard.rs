//! Scope-exit restoration of page state mutated by a capture

use std::ops::{Deref, DerefMut};

use crate::domain::ScrollOffset;
use crate::page::{OverflowTarget, Page, ScrollContainer};

use super::suppress::HiddenElements;

/// Exclusive handle on the page for one acquisition run.
///
/// Records the scroll position and overflow styles on creation. When dropped
/// (normal return, `?` early exit, panic, or the future being dropped) it
/// restores hidden elements, overflow styles and the scroll position, in that
/// order.
pub struct PageGuard<'a, P: Page> {
    page: &'a mut P,
    container: ScrollContainer,
    original_scroll: ScrollOffset,
    original_overflow: Vec<(OverflowTarget, Option<String>)>,
    hidden: HiddenElements,
}

impl<'a, P: Page> PageGuard<'a, P> {
    /// Take over `page`, optionally hiding scrollbars on the body and container
    pub fn new(page: &'a mut P, container: ScrollContainer, hide_scrollbars: bool) -> Self {
        let original_scroll = page.scroll_offset(&container);

        let original_overflow: Vec<_> = [
            OverflowTarget::Body,
            OverflowTarget::Container(container.clone()),
        ]
        .into_iter()
        .map(|target| {
            let value = page.overflow(&target);
            (target, value)
        })
        .collect();

        if hide_scrollbars {
            for (target, _) in &original_overflow {
                page.set_overflow(target, Some("hidden"));
            }
        }

        log::debug!(
            "Acquired page for {:?}, scroll at ({}, {})",
            container,
            original_scroll.left,
            original_scroll.top
        );

        Self {
            page,
            container,
            original_scroll,
            original_overflow,
            hidden: HiddenElements::default(),
        }
    }

    pub fn original_scroll(&self) -> ScrollOffset {
        self.original_scroll
    }

    /// Hide fixed/sticky elements until the guard is dropped
    pub fn hide_fixed_elements(&mut self) {
        self.hidden.hide_fixed(&mut *self.page);
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        self.page.scroll_offset(&self.container)
    }

    pub fn scroll_to(&mut self, offset: ScrollOffset) {
        let container = self.container.clone();
        self.page.scroll_to(&container, offset);
    }

    fn restore(&mut self) {
        if !self.hidden.is_empty() {
            log::debug!("Restoring {} hidden element(s)", self.hidden.len());
        }
        self.hidden.restore(&mut *self.page);
        for (target, value) in self.original_overflow.drain(..) {
            self.page.set_overflow(&target, value.as_deref());
        }
        self.page.scroll_to(&self.container, self.original_scroll);

        let restored = self.page.scroll_offset(&self.container);
        if restored != self.original_scroll {
            log::warn!(
                "Scroll position restored to ({}, {}) instead of ({}, {})",
                restored.left,
                restored.top,
                self.original_scroll.left,
                self.original_scroll.top
            );
        }
    }
}

impl<P: Page> Deref for PageGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.page
    }
}

impl<P: Page> DerefMut for PageGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.page
    }
}

impl<P: Page> Drop for PageGuard<'_, P> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Color, ElementId, Rect, Size};
    use crate::simulated::SimulatedPage;
    use image::RgbaImage;

    fn page() -> SimulatedPage {
        SimulatedPage::new(RgbaImage::new(100, 1000), 1.0, Size::new(100.0, 200.0))
            .with_fixed_element("header", Rect::new(0.0, 0.0, 100.0, 10.0), Color::WHITE)
            .with_fixed_element("toast", Rect::new(0.0, 150.0, 100.0, 50.0), Color::WHITE)
    }

    #[test]
    fn test_drop_restores_page_state() {
        let mut page = page();
        page.set_scroll(ScrollOffset::new(0.0, 300.0));
        page.set_style_overflow(OverflowTarget::Body, "scroll");
        page.set_visibility(&ElementId::new("toast"), Some("hidden"));

        {
            let mut guard = PageGuard::new(&mut page, ScrollContainer::Document, true);
            guard.hide_fixed_elements();
            guard.scroll_to(ScrollOffset::new(0.0, 700.0));
            assert_eq!(guard.scroll_offset(), ScrollOffset::new(0.0, 700.0));
        }

        assert_eq!(page.current_scroll(), ScrollOffset::new(0.0, 300.0));
        assert_eq!(page.style_overflow(&OverflowTarget::Body).as_deref(), Some("scroll"));
        assert_eq!(
            page.style_overflow(&OverflowTarget::Container(ScrollContainer::Document)),
            None
        );
        assert_eq!(page.style_visibility("header"), None);
        // Already hidden before the capture, so it stays hidden
        assert_eq!(page.style_visibility("toast").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_scrollbars_hidden_while_guard_lives() {
        let mut page = page();
        let guard = PageGuard::new(&mut page, ScrollContainer::Document, true);
        assert_eq!(guard.overflow(&OverflowTarget::Body).as_deref(), Some("hidden"));
        assert_eq!(
            guard
                .overflow(&OverflowTarget::Container(ScrollContainer::Document))
                .as_deref(),
            Some("hidden")
        );
    }

    #[test]
    fn test_hiding_twice_records_once() {
        let mut page = page();
        let mut hidden = HiddenElements::default();
        hidden.hide_fixed(&mut page);
        hidden.hide_fixed(&mut page);
        assert_eq!(hidden.len(), 2);
        assert_eq!(page.style_visibility("header").as_deref(), Some("hidden"));

        hidden.restore(&mut page);
        assert!(hidden.is_empty());
        assert_eq!(page.style_visibility("header"), None);
    }
}
