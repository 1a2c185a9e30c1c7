//! Interfaces the controller drives. The GTK layer implements them in
//! `ui::surface`; tests use recording fakes.

use std::path::Path;
use std::time::Duration;

use image::RgbaImage;

use super::animation::Animation;
use crate::error::DecodeError;

/// Result of decoding one file.
#[derive(Clone)]
pub enum Decoded {
    Static(RgbaImage),
    Animated(Animation),
}

impl Decoded {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Decoded::Static(image) => image.dimensions(),
            Decoded::Animated(animation) => animation.dimensions(),
        }
    }
}

pub trait Decoder {
    fn decode(&self, path: &Path) -> Result<Decoded, DecodeError>;
}

pub trait RenderSurface {
    /// Shows `image` scaled by `scale`.
    fn render(&self, image: &RgbaImage, scale: f64);
    fn clear(&self);
}

/// Two channels: the position/zoom line, and messages that stay up until
/// the next message or user action.
pub trait StatusReporter {
    fn position(&self, line: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait Viewport {
    /// Space left for the image once other panels are subtracted.
    fn available_size(&self) -> (u32, u32);
    fn window_size(&self) -> (u32, u32);
}

/// Handle for a pending delayed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Delayed callbacks on the UI thread.
///
/// Expired timers are handed back to `ImageController::on_timer`; the
/// scheduler itself never calls into the controller while it is borrowed.
pub trait Scheduler {
    fn schedule(&self, delay: Duration) -> TimerId;
    fn cancel(&self, id: TimerId);
}
