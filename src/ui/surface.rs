// GTK implementations of the viewer collaborators.
// The controller never touches widgets directly; these adapters translate
// its calls into Picture/Label updates and glib timeouts.

use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::prelude::*;
use gtk4::{glib, ApplicationWindow, Box as GtkBox, Label, Picture};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::viewer::{RenderSurface, Scheduler, StatusReporter, TimerId, Viewport};

/// Fallback size before the window is first allocated
pub const DEFAULT_WIDTH: i32 = 1024;
pub const DEFAULT_HEIGHT: i32 = 768;

/// Create a GDK texture from an RGBA bitmap
fn create_texture_from_rgba(image: &RgbaImage) -> Option<Texture> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let bytes = glib::Bytes::from(image.as_raw().as_slice());
    let texture = MemoryTexture::new(
        width as i32,
        height as i32,
        MemoryFormat::R8g8b8a8,
        &bytes,
        (width * 4) as usize,
    );
    Some(texture.upcast())
}

/// Shows bitmaps in a Picture sized to the requested zoom
pub struct PictureSurface {
    picture: Picture,
}

impl PictureSurface {
    pub fn new(picture: Picture) -> Self {
        Self { picture }
    }
}

impl RenderSurface for PictureSurface {
    fn render(&self, image: &RgbaImage, scale: f64) {
        let (width, height) = image.dimensions();
        let shown_w = (width as f64 * scale).round().max(1.0) as u32;
        let shown_h = (height as f64 * scale).round().max(1.0) as u32;

        // The Picture shows its paintable at natural size, so zoom is baked
        // into the texture.
        let texture = if (shown_w, shown_h) == (width, height) {
            create_texture_from_rgba(image)
        } else {
            let filter = if scale < 1.0 {
                FilterType::Triangle
            } else {
                FilterType::Nearest
            };
            create_texture_from_rgba(&imageops::resize(image, shown_w, shown_h, filter))
        };
        let Some(texture) = texture else {
            tracing::warn!("Skipping empty bitmap");
            return;
        };
        self.picture.set_paintable(Some(&texture));
    }

    fn clear(&self) {
        self.picture.set_paintable(None::<&Texture>);
    }
}

/// Status bar with a message label and a position/zoom label.
/// Errors get the `error` CSS class until the message is replaced.
pub struct StatusBar {
    message: Label,
    position: Label,
}

impl StatusBar {
    pub fn new(message: Label, position: Label) -> Self {
        Self { message, position }
    }

    /// Drop the current message, called before each user action
    pub fn clear_message(&self) {
        self.message.remove_css_class("error");
        self.message.set_text("");
    }
}

impl StatusReporter for StatusBar {
    fn position(&self, line: &str) {
        self.position.set_text(line);
    }

    fn info(&self, message: &str) {
        tracing::debug!("Status: {}", message);
        self.message.remove_css_class("error");
        self.message.set_text(message);
    }

    fn error(&self, message: &str) {
        self.message.add_css_class("error");
        self.message.set_text(message);
    }
}

/// Window size minus the status bar
pub struct WindowViewport {
    window: ApplicationWindow,
    status_bar: GtkBox,
}

impl WindowViewport {
    pub fn new(window: ApplicationWindow, status_bar: GtkBox) -> Self {
        Self { window, status_bar }
    }
}

impl Viewport for WindowViewport {
    fn available_size(&self) -> (u32, u32) {
        let (width, height) = self.window_size();
        let bar = self.status_bar.height().max(0) as u32;
        (width, height.saturating_sub(bar))
    }

    fn window_size(&self) -> (u32, u32) {
        let mut width = self.window.width();
        let mut height = self.window.height();
        if width <= 0 || height <= 0 {
            let (default_w, default_h) = self.window.default_size();
            width = if default_w > 0 { default_w } else { DEFAULT_WIDTH };
            height = if default_h > 0 { default_h } else { DEFAULT_HEIGHT };
        }
        (width as u32, height as u32)
    }
}

/// Callback receiving expired timers
pub type TimerSink = Box<dyn Fn(TimerId)>;

/// One-shot timers on the glib main loop
pub struct GlibScheduler {
    next_id: Cell<u64>,
    sources: Rc<RefCell<HashMap<TimerId, glib::SourceId>>>,
    sink: Rc<RefCell<Option<TimerSink>>>,
}

impl GlibScheduler {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            sources: Rc::new(RefCell::new(HashMap::new())),
            sink: Rc::new(RefCell::new(None)),
        }
    }

    /// Connect the callback that receives expired timers
    pub fn connect_expired<F>(&self, callback: F)
    where
        F: Fn(TimerId) + 'static,
    {
        *self.sink.borrow_mut() = Some(Box::new(callback));
    }
}

impl Default for GlibScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for GlibScheduler {
    fn schedule(&self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);

        let sources = self.sources.clone();
        let sink = self.sink.clone();
        let source = glib::timeout_add_local_once(delay, move || {
            // The source is finished once this runs; forget it before the
            // sink can schedule or cancel anything.
            sources.borrow_mut().remove(&id);
            if let Some(ref callback) = *sink.borrow() {
                callback(id);
            }
        });
        self.sources.borrow_mut().insert(id, source);
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(source) = self.sources.borrow_mut().remove(&id) {
            source.remove();
        }
    }
}
