//! Renderer for running without a screen.
//!
//! Reports a fixed viewport and counts redraw requests.  The daemon uses it
//! so server-defined controls still get real pixel geometry and the local
//! pointer console can hit them.

use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::app::ports::{RenderSink, Viewport};

pub struct HeadlessRenderer {
    viewport: Viewport,
    redraws: AtomicU64,
}

impl HeadlessRenderer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            redraws: AtomicU64::new(0),
        }
    }

    /// Redraw requests so far.
    pub fn redraws(&self) -> u64 {
        self.redraws.load(Ordering::Relaxed)
    }
}

impl RenderSink for HeadlessRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn request_redraw(&self) {
        let n = self.redraws.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("RENDER: redraw #{n}");
    }
}
