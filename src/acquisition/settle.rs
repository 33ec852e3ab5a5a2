//! Waiting for layout and paint to settle between scroll and capture

use std::time::Duration;

use crate::page::Page;

/// Sleep for `delay`, then wait for `frames` animation-frame ticks.
///
/// Must complete before every capture that follows a scroll or style change.
pub async fn settle<P: Page>(page: &mut P, delay: Duration, frames: u32) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    for _ in 0..frames {
        page.animation_frame().await;
    }
}
