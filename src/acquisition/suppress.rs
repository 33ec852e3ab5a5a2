//! Hiding fixed and sticky elements so they are not repeated in every tile

use crate::domain::ElementId;
use crate::page::Page;

const HIDDEN: &str = "hidden";

/// Elements hidden during one capture, with their original inline visibility.
///
/// Owned by a single acquisition run; never shared between captures.
#[derive(Debug, Default)]
pub struct HiddenElements {
    hidden: Vec<(ElementId, Option<String>)>,
}

impl HiddenElements {
    /// Hide every fixed/sticky element not already hidden by this run.
    ///
    /// Re-enumerates on each call, so elements inserted mid-capture are caught too.
    pub fn hide_fixed<P: Page>(&mut self, page: &mut P) {
        for element in page.fixed_elements() {
            if self.hidden.iter().any(|(id, _)| id == &element) {
                continue;
            }
            let original = page.visibility(&element);
            if original.as_deref() == Some(HIDDEN) {
                continue;
            }
            page.set_visibility(&element, Some(HIDDEN));
            log::debug!("Hid fixed element {}", element);
            self.hidden.push((element, original));
        }
    }

    /// Put back the original visibility of everything this run hid
    pub fn restore<P: Page>(&mut self, page: &mut P) {
        for (element, original) in self.hidden.drain(..).rev() {
            page.set_visibility(&element, original.as_deref());
        }
    }

    pub fn len(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }
}
