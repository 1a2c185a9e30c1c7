//! Zoom arithmetic: fit-to-window factors and sanity bands.

use crate::config::ZoomSettings;
use crate::error::{Result, ViewerError};

/// Which axis a fit should fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Show the whole image, picking the axis from the aspect ratios.
    #[default]
    Both,
    Width,
    Height,
}

/// A requested zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomTarget {
    Fit(FitMode),
    Percent(f64),
}

/// Zoom of the displayed image relative to its native size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub percent: f64,
    /// Set once the user picks a zoom; automatic refits are skipped while
    /// it is set.
    pub user_overridden: bool,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            percent: 1.0,
            user_overridden: false,
        }
    }
}

impl ZoomState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min_step_px: f64,
    pub min_absolute_px: f64,
    pub max_window_factor: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::from(&ZoomSettings::default())
    }
}

impl From<&ZoomSettings> for ZoomLimits {
    fn from(settings: &ZoomSettings) -> Self {
        Self {
            min_step_px: settings.min_step_px,
            min_absolute_px: settings.min_absolute_px,
            max_window_factor: settings.max_window_factor,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZoomEngine {
    limits: ZoomLimits,
}

impl ZoomEngine {
    pub fn new(limits: ZoomLimits) -> Self {
        Self { limits }
    }

    /// Zoom factor that fits `native` into `available`.
    ///
    /// Images already fitting are shown at native size unless an axis is
    /// forced or overzoom is on. Otherwise portrait-ish images (narrower
    /// than the viewport) fill the height, the rest fill the width.
    pub fn fit_percent(
        &self,
        native: (u32, u32),
        available: (u32, u32),
        fit: FitMode,
        overzoom: bool,
    ) -> f64 {
        let (native_w, native_h) = (native.0 as f64, native.1 as f64);
        let (avail_w, avail_h) = (available.0 as f64, available.1 as f64);
        if native_w <= 0.0 || native_h <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
            return 1.0;
        }

        let forced = fit != FitMode::Both;
        if native_w <= avail_w && native_h <= avail_h && !forced && !overzoom {
            return 1.0;
        }

        let narrower = native_w / native_h < avail_w / avail_h;
        if (narrower && !forced) || fit == FitMode::Height {
            avail_h / native_h
        } else {
            avail_w / native_w
        }
    }

    /// Scales `current` by `1 + delta`, rejecting results outside the band.
    pub fn apply_delta(
        &self,
        current: f64,
        delta: f64,
        native: (u32, u32),
        window: (u32, u32),
    ) -> Result<f64> {
        let percent = current * (1.0 + delta);
        self.check_band(percent, native, window, self.limits.min_step_px)
    }

    /// Validates an explicitly requested percent.
    pub fn apply_absolute(&self, percent: f64, native: (u32, u32), window: (u32, u32)) -> Result<f64> {
        self.check_band(percent, native, window, self.limits.min_absolute_px)
    }

    fn check_band(
        &self,
        percent: f64,
        native: (u32, u32),
        window: (u32, u32),
        min_px: f64,
    ) -> Result<f64> {
        if !percent.is_finite() || percent <= 0.0 {
            return Err(ViewerError::Unzoomable);
        }
        let shown_w = native.0 as f64 * percent;
        let shown_h = native.1 as f64 * percent;

        if shown_w.min(shown_h) < min_px {
            return Err(ViewerError::Unzoomable);
        }

        let factor = self.limits.max_window_factor;
        let too_wide = window.0 > 0 && shown_w > window.0 as f64 * factor;
        let too_tall = window.1 > 0 && shown_h > window.1 as f64 * factor;
        if too_wide || too_tall {
            return Err(ViewerError::Unzoomable);
        }
        Ok(percent)
    }
}

/// Parses a numeric prefix typed before a zoom command.
///
/// A leading zero inverts the rest: `"04"` means a quarter. Anything else is
/// a literal multiplier.
pub fn parse_zoom_count(text: &str) -> Result<f64> {
    let parse_error = || ViewerError::Parse(text.to_string());

    let value = match text.strip_prefix('0') {
        Some(rest) => {
            let divisor: f64 = rest.parse().map_err(|_| parse_error())?;
            1.0 / divisor
        }
        None => text.parse().map_err(|_| parse_error())?,
    };

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(parse_error())
    }
}
