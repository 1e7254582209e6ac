//! Headless display sink.
//!
//! Stands in for the panel driver: frames and text are logged, and the last
//! rendered text is kept so screens can be inspected.

use std::sync::{Mutex, PoisonError};

use cyfi_core::{Frame, FrameSink};

pub struct LogDisplay {
    width: u32,
    height: u32,
    last_text: Mutex<Vec<String>>,
}

impl LogDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        log::info!("Display: Headless {}x{} display", width, height);
        Self {
            width,
            height,
            last_text: Mutex::new(Vec::new()),
        }
    }

    pub fn last_text(&self) -> Vec<String> {
        self.last_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FrameSink for LogDisplay {
    fn show_frame(&self, frame: &Frame) {
        if frame.width != self.width || frame.height != self.height {
            log::debug!(
                "Display: {}x{} frame on {}x{} panel",
                frame.width,
                frame.height,
                self.width,
                self.height
            );
        }
        log::trace!("Display: frame ({:?})", frame.delay);
    }

    fn show_text(&self, lines: &[String]) {
        log::info!("Display: {}", lines.join(" | "));
        *self.last_text.lock().unwrap_or_else(PoisonError::into_inner) = lines.to_vec();
    }

    fn clear(&self) {
        log::debug!("Display: clear");
        self.last_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
