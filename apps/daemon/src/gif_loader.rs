//! GIF decoding for startup animations.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use cyfi_core::animation::DEFAULT_FRAME_DELAY;
use cyfi_core::{Animation, AnimationError, AnimationLoader, Frame};

/// Decodes GIFs into fully composited RGBA frames.
pub struct GifLoader;

impl AnimationLoader for GifLoader {
    fn load(&self, path: &Path) -> Result<Animation, AnimationError> {
        let decode_error = |e: gif::DecodingError| AnimationError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AnimationError::NotFound(path.to_path_buf()),
            _ => AnimationError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(BufReader::new(file)).map_err(decode_error)?;

        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        let mut canvas = vec![0u8; (width * height * 4) as usize];
        let mut frames = Vec::new();

        while let Some(frame) = decoder.read_next_frame().map_err(decode_error)? {
            let region = Region::of(frame, width, height);
            region.blit(&frame.buffer, &mut canvas, width);
            frames.push(Frame {
                width,
                height,
                rgba: canvas.clone(),
                delay: frame_delay(frame.delay),
            });
            if frame.dispose == gif::DisposalMethod::Background {
                region.clear(&mut canvas, width);
            }
        }

        log::debug!("GifLoader: Decoded {} frames from {}", frames.len(), path.display());
        Animation::new(path, frames)
    }
}

/// GIF delays are in hundredths of a second; 0 means "unspecified".
fn frame_delay(centis: u16) -> Duration {
    match centis {
        0 => DEFAULT_FRAME_DELAY,
        n => Duration::from_millis(u64::from(n) * 10),
    }
}

/// Frame rectangle clipped to the logical screen.
struct Region {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    /// Row stride of the frame buffer
    stride: u32,
}

impl Region {
    fn of(frame: &gif::Frame<'_>, screen_width: u32, screen_height: u32) -> Self {
        let left = u32::from(frame.left).min(screen_width);
        let top = u32::from(frame.top).min(screen_height);
        Self {
            left,
            top,
            width: u32::from(frame.width).min(screen_width - left),
            height: u32::from(frame.height).min(screen_height - top),
            stride: u32::from(frame.width),
        }
    }

    /// Copy opaque pixels of `buffer` onto `canvas`.
    fn blit(&self, buffer: &[u8], canvas: &mut [u8], screen_width: u32) {
        for y in 0..self.height {
            for x in 0..self.width {
                let src = ((y * self.stride + x) * 4) as usize;
                let Some(pixel) = buffer.get(src..src + 4) else {
                    continue;
                };
                if pixel[3] == 0 {
                    continue;
                }
                let dst = (((self.top + y) * screen_width + self.left + x) * 4) as usize;
                canvas[dst..dst + 4].copy_from_slice(pixel);
            }
        }
    }

    fn clear(&self, canvas: &mut [u8], screen_width: u32) {
        for y in 0..self.height {
            let start = (((self.top + y) * screen_width + self.left) * 4) as usize;
            let end = start + (self.width * 4) as usize;
            canvas[start..end].fill(0);
        }
    }
}
