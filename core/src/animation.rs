//! Animation playback with cooperative cancellation.
//!
//! Loops check their stop condition between frames, so stopping takes at
//! most one frame delay. A missing or broken asset is logged and its visual
//! skipped; callers never block on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

/// Delay used for frames that do not carry one.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("animation not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("animation has no frames: {0}")]
    Empty(PathBuf),
}

/// One decoded frame, RGBA8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Frame>,
}

impl Animation {
    pub fn new(path: &Path, frames: Vec<Frame>) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::Empty(path.to_path_buf()));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }
}

/// Decodes animation assets.
pub trait AnimationLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Animation, AnimationError>;
}

/// The physical display, as far as the startup sequence is concerned.
pub trait FrameSink: Send + Sync {
    fn show_frame(&self, frame: &Frame);
    fn show_text(&self, lines: &[String]);
    fn clear(&self);
}

/// Plays assets from an [`AnimationLoader`] onto a [`FrameSink`].
pub struct Animator {
    loader: Arc<dyn AnimationLoader>,
    sink: Arc<dyn FrameSink>,
}

impl Animator {
    pub fn new(loader: Arc<dyn AnimationLoader>, sink: Arc<dyn FrameSink>) -> Self {
        Self { loader, sink }
    }

    pub fn sink(&self) -> &Arc<dyn FrameSink> {
        &self.sink
    }

    fn load(&self, path: &Path) -> Option<Animation> {
        match self.loader.load(path) {
            Ok(animation) => {
                log::info!(
                    "Animator: Displaying {} ({} frames)",
                    path.display(),
                    animation.frames().len()
                );
                Some(animation)
            }
            Err(e) => {
                log::error!("Animator: Skipping animation: {}", e);
                None
            }
        }
    }

    /// Loop `path` until `stop` returns true. `stop` is checked before every
    /// frame. Returns `true` if the loop ended because of `stop`, `false` if
    /// the asset could not be played.
    pub fn play_until<F>(&self, path: &Path, stop: F) -> bool
    where
        F: Fn() -> bool,
    {
        if stop() {
            return true;
        }
        let Some(animation) = self.load(path) else {
            return false;
        };
        loop {
            for frame in animation.frames() {
                if stop() {
                    log::debug!("Animator: Stopped {}", path.display());
                    return true;
                }
                self.sink.show_frame(frame);
                thread::sleep(frame.delay);
            }
        }
    }

    /// Play every frame of `path` once.
    pub fn play_once(&self, path: &Path) -> bool {
        let Some(animation) = self.load(path) else {
            return false;
        };
        for frame in animation.frames() {
            self.sink.show_frame(frame);
            thread::sleep(frame.delay);
        }
        true
    }

    /// Show the first frame of `path` and keep it up for `hold`. Nothing is
    /// shown and nothing waited for if the asset is unavailable.
    pub fn show_still(&self, path: &Path, hold: Duration) -> bool {
        let Some(animation) = self.load(path) else {
            return false;
        };
        if let Some(frame) = animation.frames().first() {
            self.sink.show_frame(frame);
        }
        thread::sleep(hold);
        true
    }

    /// Run [`Animator::play_until`] on its own thread.
    pub fn spawn_until<F>(
        self: &Arc<Self>,
        path: PathBuf,
        stop: F,
    ) -> std::io::Result<JoinHandle<bool>>
    where
        F: Fn() -> bool + Send + 'static,
    {
        let animator = Arc::clone(self);
        thread::Builder::new()
            .name("cyfi-animation".to_string())
            .spawn(move || animator.play_until(&path, stop))
    }
}
