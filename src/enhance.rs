//! Brightness/contrast adjustments of the displayed bitmap.

use image::{imageops, RgbaImage};

/// Accumulated adjustment, each component in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustment {
    pub brightness: f64,
    pub contrast: f64,
}

impl Adjustment {
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 0.0
    }

    /// Adds deltas, clamping each component to `[-1, 1]`.
    pub fn offset(self, brightness: f64, contrast: f64) -> Self {
        Self {
            brightness: (self.brightness + brightness).clamp(-1.0, 1.0),
            contrast: (self.contrast + contrast).clamp(-1.0, 1.0),
        }
    }
}

/// Applies `adjustment` to a copy of `original`.
///
/// Always starts from the unedited pixels so repeated tweaks do not
/// accumulate rounding loss.
pub fn apply(original: &RgbaImage, adjustment: Adjustment) -> RgbaImage {
    let mut image = if adjustment.brightness != 0.0 {
        imageops::brighten(original, (adjustment.brightness * 255.0).round() as i32)
    } else {
        original.clone()
    };
    if adjustment.contrast != 0.0 {
        image = imageops::contrast(&image, (adjustment.contrast * 100.0) as f32);
    }
    image
}
