//! The image controller: navigation, zoom, playback and edits.
//!
//! All public operations are infallible from the caller's point of view.
//! Internally each one is a `try_*` function returning `Result`; the public
//! wrapper turns any error into exactly one status message, and state is
//! only committed once every fallible step has succeeded.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::animation::{AnimationPlayer, PlaybackState};
use super::collaborators::{
    Decoded, Decoder, RenderSurface, Scheduler, StatusReporter, TimerId, Viewport,
};
use super::command::{Command, ListEnd};
use super::input::CountBuffer;
use super::path_store::{PathStore, Shuffle};
use super::zoom::{parse_zoom_count, FitMode, ZoomEngine, ZoomLimits, ZoomState, ZoomTarget};
use crate::config::Settings;
use crate::enhance::{self, Adjustment};
use crate::error::{DecodeError, Result, ViewerError};
use crate::scanner::{self, ScanConfig};
use crate::{fileactions, image_loader};

/// Everything the controller talks to but does not own.
#[derive(Clone)]
pub struct ViewerContext {
    pub decoder: Rc<dyn Decoder>,
    pub surface: Rc<dyn RenderSurface>,
    pub status: Rc<dyn StatusReporter>,
    pub viewport: Rc<dyn Viewport>,
    pub scheduler: Rc<dyn Scheduler>,
    /// While set, navigation and zoom requests are ignored.
    pub thumbnail_mode: Rc<Cell<bool>>,
    pub count: Rc<RefCell<CountBuffer>>,
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub autoplay: bool,
    pub overzoom: bool,
    pub zoom_step: f64,
    pub slideshow_delay: Duration,
    pub limits: ZoomLimits,
    pub search_case_sensitive: bool,
    /// How `:path` commands populate the new file list.
    pub scan: ScanConfig,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ViewerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            autoplay: settings.general.autoplay_animations,
            overzoom: settings.general.overzoom,
            zoom_step: settings.zoom.step,
            slideshow_delay: settings.slideshow.delay(),
            limits: ZoomLimits::from(&settings.zoom),
            search_case_sensitive: settings.general.search_case_sensitive,
            scan: ScanConfig::from(settings),
        }
    }
}

enum Content {
    Static {
        original: RgbaImage,
        edited: Option<(Adjustment, RgbaImage)>,
    },
    Animated(AnimationPlayer),
}

struct DisplayedImage {
    path: PathBuf,
    content: Content,
}

impl DisplayedImage {
    fn bitmap(&self) -> &RgbaImage {
        match &self.content {
            Content::Static {
                edited: Some((_, image)),
                ..
            } => image,
            Content::Static { original, .. } => original,
            Content::Animated(player) => &player.current_frame().image,
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        match &self.content {
            Content::Static { original, .. } => original.dimensions(),
            Content::Animated(player) => player.dimensions(),
        }
    }

    fn is_edited(&self) -> bool {
        matches!(
            self.content,
            Content::Static {
                edited: Some(_),
                ..
            }
        )
    }

    fn playback(&self) -> Option<PlaybackState> {
        match &self.content {
            Content::Animated(player) => Some(player.state()),
            Content::Static { .. } => None,
        }
    }
}

struct Slideshow {
    timer: Option<TimerId>,
    start_index: usize,
    delay: Duration,
}

pub struct ImageController {
    ctx: ViewerContext,
    options: ViewerOptions,
    paths: PathStore,
    engine: ZoomEngine,
    zoom: ZoomState,
    display: Option<DisplayedImage>,
    slideshow: Option<Slideshow>,
    search: Option<String>,
}

impl ImageController {
    pub fn new(ctx: ViewerContext, options: ViewerOptions) -> Self {
        Self {
            engine: ZoomEngine::new(options.limits),
            ctx,
            options,
            paths: PathStore::default(),
            zoom: ZoomState::default(),
            display: None,
            slideshow: None,
            search: None,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn paths(&self) -> &PathStore {
        &self.paths
    }

    pub fn current_index(&self) -> Option<usize> {
        self.paths.index()
    }

    /// Path of the image on screen, if any.
    pub fn displayed_path(&self) -> Option<&Path> {
        self.display.as_ref().map(|display| display.path.as_path())
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.display.as_ref().and_then(DisplayedImage::playback)
    }

    pub fn autoplay(&self) -> bool {
        self.options.autoplay
    }

    pub fn is_edited(&self) -> bool {
        self.display.as_ref().is_some_and(DisplayedImage::is_edited)
    }

    pub fn slideshow_active(&self) -> bool {
        self.slideshow.is_some()
    }

    // --- reporting -------------------------------------------------------

    fn report(&self, result: Result<()>) {
        if let Err(err) = result {
            self.report_error(&err);
        }
    }

    fn report_error(&self, err: &ViewerError) {
        let message = if err.is_warning() {
            format!("Warning: {err}")
        } else {
            format!("Error: {err}")
        };
        warn!("{}", message);
        self.ctx.status.error(&message);
    }

    fn status_line(&self) -> String {
        let Some(display) = self.display.as_ref() else {
            return "No image".to_string();
        };
        let name = display
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut line = format!(
            "{}/{}  {}  {:.0}%",
            self.paths.index().map_or(0, |index| index + 1),
            self.paths.len(),
            name,
            self.zoom.percent * 100.0
        );
        if display.is_edited() {
            line.push_str("  [edited]");
        }
        if display.playback() == Some(PlaybackState::Paused) {
            line.push_str("  [paused]");
        }
        if self.slideshow.is_some() {
            line.push_str("  [slideshow]");
        }
        line
    }

    fn report_status(&self) {
        self.ctx.status.position(&self.status_line());
    }

    fn blocked(&self) -> bool {
        self.ctx.thumbnail_mode.get()
    }

    fn take_count(&self) -> Result<Option<usize>> {
        self.ctx.count.borrow_mut().take_count()
    }

    /// Puts a count given with a `:`-command into the count buffer.
    fn preset_count(&self, count: Option<usize>) {
        if let Some(count) = count {
            let mut buffer = self.ctx.count.borrow_mut();
            buffer.clear();
            count.to_string().chars().for_each(|digit| {
                buffer.push(digit);
            });
        }
    }

    // --- display lifecycle -----------------------------------------------

    fn render(&self) {
        if let Some(display) = self.display.as_ref() {
            self.ctx.surface.render(display.bitmap(), self.zoom.percent);
        }
    }

    /// Drops the displayed image, cancelling its animation timer.
    fn release(&mut self) {
        if let Some(DisplayedImage {
            content: Content::Animated(player),
            ..
        }) = self.display.as_mut()
        {
            player.stop(self.ctx.scheduler.as_ref());
        }
        self.display = None;
    }

    fn decode(&self, path: &Path) -> Result<Decoded> {
        if !path.exists() {
            return Err(ViewerError::FileVanished(path.to_path_buf()));
        }
        self.ctx.decoder.decode(path).map_err(|err| match err {
            DecodeError::Vanished(path) => ViewerError::FileVanished(path),
            other => ViewerError::Decode(other),
        })
    }

    /// Decodes `path` and puts it on screen.
    ///
    /// With `keep_zoom` an explicit user zoom survives the reload.
    fn load(&mut self, path: PathBuf, keep_zoom: bool) -> Result<()> {
        self.release();
        let decoded = match self.decode(&path) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.ctx.surface.clear();
                return Err(err);
            }
        };

        let native = decoded.dimensions();
        if !(keep_zoom && self.zoom.user_overridden) {
            self.zoom.reset();
            self.zoom.percent = self.engine.fit_percent(
                native,
                self.ctx.viewport.available_size(),
                FitMode::Both,
                self.options.overzoom,
            );
        }

        let content = match decoded {
            Decoded::Static(original) => Content::Static {
                original,
                edited: None,
            },
            Decoded::Animated(animation) => {
                let mut player = AnimationPlayer::new(animation);
                let scheduler = self.ctx.scheduler.as_ref();
                if self.options.autoplay {
                    player.start(scheduler);
                } else {
                    player.pause(scheduler);
                }
                Content::Animated(player)
            }
        };
        debug!(
            "Showing {} at {:.3} ({}x{})",
            path.display(),
            self.zoom.percent,
            native.0,
            native.1
        );
        self.display = Some(DisplayedImage { path, content });
        self.render();
        self.report_status();
        Ok(())
    }

    /// Shows the current entry. A file that is gone or undecodable is
    /// reported, dropped from the list, and the previous entry is tried once.
    fn show_current(&mut self) -> Result<()> {
        let path = self.paths.current().ok_or(ViewerError::EmptyList)?.to_path_buf();
        let err = match self.load(path.clone(), false) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        self.report_error(&err);

        let Some(removed) = self.paths.remove(&path) else {
            return Ok(());
        };
        if self.paths.is_empty() {
            return Ok(());
        }
        let previous = removed.checked_sub(1).unwrap_or(self.paths.len() - 1);
        self.paths.select(previous)?;
        let retry = self.paths.current().ok_or(ViewerError::EmptyList)?.to_path_buf();
        info!("Falling back to {}", retry.display());
        self.load(retry.clone(), false).inspect_err(|_| {
            self.paths.remove(&retry);
        })
    }

    // --- file list -------------------------------------------------------

    /// Replaces the file list and shows the entry at `index`.
    pub fn set_paths(&mut self, paths: Vec<PathBuf>, index: usize) {
        self.stop_slideshow();
        self.release();
        self.paths.replace(paths, index);
        if self.paths.is_empty() {
            self.ctx.surface.clear();
            self.report(Err(ViewerError::EmptyList));
            return;
        }
        let result = self.show_current();
        self.report(result);
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.paths.set_shuffle(enabled.then(Shuffle::from_clock));
    }

    /// Shows `path`, which must be part of the file list.
    pub fn navigate_to(&mut self, path: &Path) {
        if self.blocked() {
            return;
        }
        let result = self.try_navigate_to(path);
        self.report(result);
    }

    fn try_navigate_to(&mut self, path: &Path) -> Result<()> {
        let index = self
            .paths
            .position_of(path)
            .ok_or_else(|| ViewerError::FileVanished(path.to_path_buf()))?;
        self.paths.select(index)?;
        self.show_current()
    }

    fn ensure_unedited(&self, force: bool) -> Result<()> {
        if !force && self.is_edited() {
            return Err(ViewerError::EditInProgress);
        }
        Ok(())
    }

    /// Moves `delta` entries, multiplied by a pending numeric prefix.
    pub fn move_by(&mut self, delta: isize, force: bool) {
        if self.blocked() {
            return;
        }
        let result = self.try_move_by(delta, force);
        self.report(result);
    }

    fn try_move_by(&mut self, delta: isize, force: bool) -> Result<()> {
        let count = self.take_count()?.unwrap_or(1);
        let count = isize::try_from(count).map_err(|_| ViewerError::Parse(count.to_string()))?;
        self.advance(delta.saturating_mul(count), force)
    }

    fn advance(&mut self, steps: isize, force: bool) -> Result<()> {
        self.ensure_unedited(force)?;
        self.paths.move_by(steps, true)?;
        self.show_current()
    }

    /// Jumps to `position` (1-based), the numeric prefix, or an end of the
    /// list, in that order of preference.
    pub fn jump(&mut self, position: Option<usize>, fallback: ListEnd, force: bool) {
        if self.blocked() {
            return;
        }
        let result = self.try_jump(position, fallback, force);
        self.report(result);
    }

    fn try_jump(&mut self, position: Option<usize>, fallback: ListEnd, force: bool) -> Result<()> {
        let counted = self.take_count()?;
        self.ensure_unedited(force)?;
        if self.paths.is_empty() {
            return Err(ViewerError::EmptyList);
        }
        let position = position.or(counted).unwrap_or(match fallback {
            ListEnd::First => 1,
            ListEnd::Last => self.paths.len(),
        });
        self.paths.jump_to(position)?;
        self.show_current()
    }

    // --- search ----------------------------------------------------------

    fn name_matches(&self, path: &Path, pattern: &str) -> bool {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy()) else {
            return false;
        };
        name.contains(pattern)
            || (!self.options.search_case_sensitive
                && name.to_lowercase().contains(&pattern.to_lowercase()))
    }

    /// Searches file names for `pattern` and shows the first match after
    /// the current image, wrapping around the list.
    pub fn search(&mut self, pattern: &str) {
        if self.blocked() {
            return;
        }
        self.search = Some(pattern.to_string());
        let result = self.try_search_next(true);
        self.report(result);
    }

    /// Moves to the next (or previous) match of the last search. A numeric
    /// prefix skips ahead that many matches.
    pub fn search_next(&mut self, forward: bool) {
        if self.blocked() {
            return;
        }
        let result = self.try_search_next(forward);
        self.report(result);
    }

    fn try_search_next(&mut self, forward: bool) -> Result<()> {
        let repeat = self.take_count()?.unwrap_or(1).max(1);
        let pattern = self.search.clone().ok_or(ViewerError::NoSearch)?;
        let current = self.paths.index().ok_or(ViewerError::EmptyList)?;
        let len = self.paths.len();

        // Walk the list starting after the current entry, so the current
        // entry itself comes last.
        let matches: Vec<usize> = (1..=len)
            .map(|offset| {
                if forward {
                    (current + offset) % len
                } else {
                    (current + len - offset % len) % len
                }
            })
            .filter(|&index| self.name_matches(&self.paths.paths()[index], &pattern))
            .collect();
        if matches.is_empty() {
            return Err(ViewerError::NoSearchResults(pattern));
        }

        self.ensure_unedited(false)?;
        let target = matches[(repeat - 1) % matches.len()];
        debug!("Search '{}': {} matches, showing {}", pattern, matches.len(), target + 1);
        self.paths.select(target)?;
        self.show_current()
    }

    // --- opening paths ---------------------------------------------------

    /// Replaces the file list with `path`: a file opens with its directory
    /// around it, a directory opens with its images. `~` is expanded.
    pub fn open_path(&mut self, path: &Path) {
        if self.blocked() {
            return;
        }
        let result = self.try_open_path(path);
        self.report(result);
    }

    fn try_open_path(&mut self, path: &Path) -> Result<()> {
        let path = scanner::expand_home(path);
        if !path.exists() {
            return Err(ViewerError::InvalidPath(path));
        }
        self.ensure_unedited(false)?;
        let config = self.options.scan.clone();
        let population = if path.is_dir() {
            scanner::populate_directory(&path, config)?
        } else {
            scanner::populate(&[path], config)?
        };
        if population.paths.is_empty() {
            return Err(ViewerError::EmptyList);
        }
        self.set_paths(population.paths, population.index);
        Ok(())
    }

    // --- zoom ------------------------------------------------------------

    fn native_size(&self) -> Result<(u32, u32)> {
        self.display
            .as_ref()
            .map(DisplayedImage::dimensions)
            .ok_or(ViewerError::EmptyList)
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.options.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-self.options.zoom_step);
    }

    /// Zooms relative to the current percent. Out-of-band results are
    /// rejected and the previous percent stays.
    pub fn zoom_by(&mut self, delta: f64) {
        if self.blocked() {
            return;
        }
        let result = self.try_zoom_by(delta);
        self.report(result);
    }

    fn try_zoom_by(&mut self, delta: f64) -> Result<()> {
        let native = self.native_size()?;
        let percent = self.engine.apply_delta(
            self.zoom.percent,
            delta,
            native,
            self.ctx.viewport.window_size(),
        )?;
        self.zoom = ZoomState {
            percent,
            user_overridden: true,
        };
        self.render();
        self.report_status();
        Ok(())
    }

    /// Zooms to a fit or an explicit percent. A pending numeric prefix
    /// replaces `target` with that percent.
    pub fn zoom_to(&mut self, target: ZoomTarget) {
        if self.blocked() {
            return;
        }
        let result = self.try_zoom_to(target);
        self.report(result);
    }

    fn try_zoom_to(&mut self, target: ZoomTarget) -> Result<()> {
        let counted = self.ctx.count.borrow_mut().take();
        let target = match counted {
            Some(digits) => ZoomTarget::Percent(parse_zoom_count(&digits)?),
            None => target,
        };
        let native = self.native_size()?;
        let window = self.ctx.viewport.window_size();

        let (percent, user_overridden) = match target {
            ZoomTarget::Fit(mode) => {
                let fit = self.engine.fit_percent(
                    native,
                    self.ctx.viewport.available_size(),
                    mode,
                    self.options.overzoom,
                );
                (self.engine.apply_absolute(fit, native, window)?, false)
            }
            ZoomTarget::Percent(percent) => {
                (self.engine.apply_absolute(percent, native, window)?, true)
            }
        };
        self.zoom = ZoomState {
            percent,
            user_overridden,
        };
        self.render();
        self.report_status();
        Ok(())
    }

    /// Recomputes the fit after a viewport change, unless the user zoomed.
    pub fn refit(&mut self) {
        if self.zoom.user_overridden {
            return;
        }
        let Ok(native) = self.native_size() else {
            return;
        };
        self.zoom.percent = self.engine.fit_percent(
            native,
            self.ctx.viewport.available_size(),
            FitMode::Both,
            self.options.overzoom,
        );
        self.render();
        self.report_status();
    }

    pub fn toggle_overzoom(&mut self) {
        self.options.overzoom = !self.options.overzoom;
        self.zoom.user_overridden = false;
        self.refit();
    }

    // --- animation -------------------------------------------------------

    /// Flips the autoplay preference and applies it to a shown animation.
    pub fn toggle_animation(&mut self) {
        if self.blocked() || self.paths.is_empty() {
            return;
        }
        self.options.autoplay = !self.options.autoplay;
        let scheduler = self.ctx.scheduler.as_ref();
        if let Some(DisplayedImage {
            content: Content::Animated(player),
            ..
        }) = self.display.as_mut()
        {
            if self.options.autoplay {
                player.resume(scheduler);
            } else {
                player.pause(scheduler);
            }
        }
        self.render();
        self.report_status();
    }

    /// Delivers an expired timer from the scheduler.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.slideshow.as_ref().and_then(|show| show.timer) == Some(id) {
            self.slideshow_tick();
            return;
        }
        let scheduler = self.ctx.scheduler.as_ref();
        let advanced = match self.display.as_mut() {
            Some(DisplayedImage {
                content: Content::Animated(player),
                ..
            }) => player.on_timer(id, scheduler),
            _ => false,
        };
        if advanced {
            self.render();
        }
    }

    // --- slideshow -------------------------------------------------------

    /// Starts or stops the slideshow. A numeric prefix sets the delay in
    /// seconds.
    pub fn toggle_slideshow(&mut self) {
        if self.slideshow.is_some() {
            self.stop_slideshow();
            self.ctx.status.info("Slideshow stopped");
            return;
        }
        let result = self.try_start_slideshow();
        self.report(result);
    }

    fn try_start_slideshow(&mut self) -> Result<()> {
        if let Some(seconds) = self.take_count()? {
            self.options.slideshow_delay = Duration::from_secs(seconds.max(1) as u64);
        }
        let start_index = self.paths.index().ok_or(ViewerError::EmptyList)?;
        let delay = self.options.slideshow_delay;
        self.slideshow = Some(Slideshow {
            timer: Some(self.ctx.scheduler.schedule(delay)),
            start_index,
            delay,
        });
        self.ctx
            .status
            .info(&format!("Slideshow started ({:.1}s)", delay.as_secs_f64()));
        Ok(())
    }

    fn stop_slideshow(&mut self) {
        if let Some(Slideshow {
            timer: Some(id), ..
        }) = self.slideshow.take()
        {
            self.ctx.scheduler.cancel(id);
        }
    }

    fn slideshow_tick(&mut self) {
        if let Some(show) = self.slideshow.as_mut() {
            show.timer = None;
        }
        if self.blocked() {
            self.rearm_slideshow();
            return;
        }
        if let Err(err) = self.advance(1, false) {
            self.stop_slideshow();
            self.report_error(&err);
            return;
        }
        let Some(start_index) = self.slideshow.as_ref().map(|show| show.start_index) else {
            return;
        };
        if self.paths.index() == Some(start_index) {
            self.ctx.status.info("Info: back at beginning of slideshow");
        }
        self.rearm_slideshow();
    }

    fn rearm_slideshow(&mut self) {
        let scheduler = self.ctx.scheduler.as_ref();
        if let Some(show) = self.slideshow.as_mut() {
            show.timer = Some(scheduler.schedule(show.delay));
        }
    }

    // --- edits -----------------------------------------------------------

    /// Adds to the brightness/contrast of the shown static image.
    pub fn adjust(&mut self, brightness: f64, contrast: f64) {
        if self.blocked() {
            return;
        }
        let result = self.try_adjust(brightness, contrast);
        self.report(result);
    }

    fn try_adjust(&mut self, brightness: f64, contrast: f64) -> Result<()> {
        let display = self.display.as_mut().ok_or(ViewerError::EmptyList)?;
        let Content::Static { original, edited } = &mut display.content else {
            return Err(ViewerError::NotEditable);
        };
        let adjustment = edited
            .as_ref()
            .map(|(adjustment, _)| *adjustment)
            .unwrap_or_default()
            .offset(brightness, contrast);
        *edited = if adjustment.is_identity() {
            None
        } else {
            Some((adjustment, enhance::apply(original, adjustment)))
        };
        self.render();
        self.report_status();
        Ok(())
    }

    /// Writes the edited pixels back to the file.
    pub fn save_edits(&mut self) {
        let result = self.try_save_edits();
        self.report(result);
    }

    fn try_save_edits(&mut self) -> Result<()> {
        let Some(shown) = self.display.as_mut() else {
            return Err(ViewerError::EmptyList);
        };
        let Content::Static { original, edited } = &mut shown.content else {
            return Err(ViewerError::NotEditable);
        };
        let Some((_, image)) = edited.as_ref() else {
            return Ok(());
        };
        image_loader::save_image(&shown.path, image)?;
        if let Some((_, image)) = edited.take() {
            *original = image;
        }
        let saved = shown.path.display().to_string();
        info!("Saved edits to {}", saved);
        self.ctx.status.info(&format!("Saved {saved}"));
        self.report_status();
        Ok(())
    }

    /// Throws away unsaved edits and reloads the file.
    pub fn discard_edits(&mut self) {
        let Some(path) = self.display.as_ref().map(|display| display.path.clone()) else {
            return;
        };
        let result = self.load(path, true);
        self.report(result);
    }

    // --- file actions ----------------------------------------------------

    /// Renames every file in the list after `template`.
    pub fn rename_all(&mut self, template: &str) {
        if self.blocked() {
            return;
        }
        let result = self.try_rename_all(template);
        self.report(result);
    }

    /// Every file is checked before the first rename. Should a rename fail
    /// part way, the list still follows the files that did move.
    fn try_rename_all(&mut self, template: &str) -> Result<()> {
        let plan = fileactions::plan_renames(self.paths.paths(), template)?;
        let mut paths = self.paths.paths().to_vec();
        let mut renamed = 0;
        let mut outcome = Ok(());
        for (slot, target) in paths.iter_mut().zip(plan) {
            if let Err(err) = fileactions::rename_file(slot, &target) {
                outcome = Err(ViewerError::from(err));
                break;
            }
            *slot = target;
            renamed += 1;
        }

        let index = self.paths.index().unwrap_or(0);
        if let (Some(shown), Some(path)) = (self.display.as_mut(), paths.get(index)) {
            shown.path = path.clone();
        }
        self.paths.replace(paths, index);
        info!("Renamed {} of {} files", renamed, self.paths.len());
        outcome?;
        self.ctx.status.info(&format!("Renamed {renamed} files"));
        self.report_status();
        Ok(())
    }

    /// Text to put on the clipboard for the current file.
    pub fn clipboard_text(&self, absolute: bool) -> Option<String> {
        self.paths
            .current()
            .map(|path| fileactions::clipboard_text(path, absolute))
    }

    /// Runs a parsed `:`-command. Clipboard and quit are handled by the UI.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Move {
                delta,
                count,
                force,
            } => {
                self.preset_count(count);
                self.move_by(delta, force);
            }
            Command::Jump {
                position,
                fallback,
                force,
            } => self.jump(position, fallback, force),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::Zoom(target) => self.zoom_to(target),
            Command::ToggleAnimation => self.toggle_animation(),
            Command::ToggleOverzoom => self.toggle_overzoom(),
            Command::Slideshow => self.toggle_slideshow(),
            Command::Brightness(value) => self.adjust(value, 0.0),
            Command::Contrast(value) => self.adjust(0.0, value),
            Command::Save => self.save_edits(),
            Command::Discard => self.discard_edits(),
            Command::Format(template) => self.rename_all(&template),
            Command::Search(pattern) => self.search(&pattern),
            Command::SearchNext { forward, count } => {
                self.preset_count(count);
                self.search_next(forward);
            }
            Command::OpenPath(path) => self.open_path(&path),
            Command::CopyName { .. } | Command::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::animation::tests::{animation, ManualScheduler};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeDecoder {
        images: RefCell<HashMap<PathBuf, Decoded>>,
    }

    impl Decoder for FakeDecoder {
        fn decode(&self, path: &Path) -> std::result::Result<Decoded, DecodeError> {
            self.images
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| DecodeError::Unsupported(path.to_path_buf()))
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        renders: RefCell<Vec<((u32, u32), f64)>>,
        clears: Cell<usize>,
    }

    impl RenderSurface for RecordingSurface {
        fn render(&self, image: &RgbaImage, scale: f64) {
            self.renders.borrow_mut().push((image.dimensions(), scale));
        }

        fn clear(&self) {
            self.clears.set(self.clears.get() + 1);
        }
    }

    #[derive(Default)]
    struct RecordingStatus {
        positions: RefCell<Vec<String>>,
        infos: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
    }

    impl StatusReporter for RecordingStatus {
        fn position(&self, line: &str) {
            self.positions.borrow_mut().push(line.to_string());
        }

        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }
    }

    struct FixedViewport;

    impl Viewport for FixedViewport {
        fn available_size(&self) -> (u32, u32) {
            (800, 600)
        }

        fn window_size(&self) -> (u32, u32) {
            (800, 620)
        }
    }

    struct Harness {
        dir: TempDir,
        decoder: Rc<FakeDecoder>,
        surface: Rc<RecordingSurface>,
        status: Rc<RecordingStatus>,
        scheduler: Rc<ManualScheduler>,
        thumbnail_mode: Rc<Cell<bool>>,
        count: Rc<RefCell<CountBuffer>>,
        controller: ImageController,
    }

    impl Harness {
        fn new(options: ViewerOptions) -> Self {
            let decoder = Rc::new(FakeDecoder::default());
            let surface = Rc::new(RecordingSurface::default());
            let status = Rc::new(RecordingStatus::default());
            let scheduler = Rc::new(ManualScheduler::default());
            let thumbnail_mode = Rc::new(Cell::new(false));
            let count = Rc::new(RefCell::new(CountBuffer::default()));
            let ctx = ViewerContext {
                decoder: decoder.clone(),
                surface: surface.clone(),
                status: status.clone(),
                viewport: Rc::new(FixedViewport),
                scheduler: scheduler.clone(),
                thumbnail_mode: thumbnail_mode.clone(),
                count: count.clone(),
            };
            Self {
                dir: tempfile::tempdir().unwrap(),
                decoder,
                surface,
                status,
                scheduler,
                thumbnail_mode,
                count,
                controller: ImageController::new(ctx, options),
            }
        }

        /// Creates the file on disk and registers what it decodes to.
        fn add(&self, name: &str, decoded: Option<Decoded>) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"placeholder").unwrap();
            if let Some(decoded) = decoded {
                self.decoder.images.borrow_mut().insert(path.clone(), decoded);
            }
            path
        }

        fn add_still(&self, name: &str, size: (u32, u32)) -> PathBuf {
            let image = RgbaImage::from_pixel(size.0, size.1, image::Rgba([9, 9, 9, 255]));
            self.add(name, Some(Decoded::Static(image)))
        }

        fn errors(&self) -> Vec<String> {
            self.status.errors.borrow().clone()
        }

        fn type_count(&self, digits: &str) {
            let mut count = self.count.borrow_mut();
            for digit in digits.chars() {
                count.push(digit);
            }
        }

        fn pending_timers(&self) -> usize {
            self.scheduler.pending.borrow().len()
        }
    }

    fn three_files(harness: &Harness) -> Vec<PathBuf> {
        vec![
            harness.add_still("a.jpg", (400, 300)),
            harness.add_still("b.png", (400, 300)),
            harness.add("c.gif", Some(Decoded::Animated(animation(&[40, 60, 80])))),
        ]
    }

    #[test]
    fn test_navigation_scenario_with_autoplay() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths.clone(), 0);
        assert_eq!(h.controller.current_index(), Some(0));

        h.controller.move_by(1, false);
        assert_eq!(h.controller.current_index(), Some(1));
        assert_eq!(h.controller.displayed_path(), Some(paths[1].as_path()));

        h.controller.navigate_to(&paths[2]);
        assert_eq!(h.controller.playback_state(), Some(PlaybackState::Playing));
        assert_eq!(h.pending_timers(), 1);
        assert!(h.errors().is_empty());
        assert_eq!(h.status.positions.borrow().last().unwrap(), "3/3  c.gif  100%");
    }

    #[test]
    fn test_animation_paused_without_autoplay() {
        let options = ViewerOptions {
            autoplay: false,
            ..ViewerOptions::default()
        };
        let mut h = Harness::new(options);
        let paths = three_files(&h);
        h.controller.set_paths(paths.clone(), 0);

        h.controller.navigate_to(&paths[2]);
        assert_eq!(h.controller.playback_state(), Some(PlaybackState::Paused));
        assert_eq!(h.pending_timers(), 0);
        // Frame 0 is on screen.
        assert_eq!(h.surface.renders.borrow().last().unwrap().0, (4, 3));
    }

    #[test]
    fn test_leaving_animation_cancels_timer() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 2);
        assert_eq!(h.pending_timers(), 1);

        h.controller.move_by(1, false);
        assert_eq!(h.controller.current_index(), Some(0));
        assert_eq!(h.controller.playback_state(), None);
        assert_eq!(h.pending_timers(), 0);
    }

    #[test]
    fn test_timer_advances_frames_and_renders() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 2);
        let renders_before = h.surface.renders.borrow().len();

        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert_eq!(h.surface.renders.borrow().len(), renders_before + 1);
        assert_eq!(h.pending_timers(), 1);

        // A stale id does nothing.
        h.controller.on_timer(id);
        assert_eq!(h.surface.renders.borrow().len(), renders_before + 1);
    }

    #[test]
    fn test_vanished_file_falls_back_to_previous() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths.clone(), 1);
        std::fs::remove_file(&paths[2]).unwrap();

        h.controller.move_by(1, false);

        let errors = h.errors();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("file not accessible"));
        assert_eq!(h.controller.paths().len(), 2);
        assert!(h.controller.paths().position_of(&paths[2]).is_none());
        assert_eq!(h.controller.current_index(), Some(1));
        assert_eq!(h.controller.displayed_path(), Some(paths[1].as_path()));
        // The error stays the latest message; the hop only updates the
        // position line.
        assert!(h.status.infos.borrow().is_empty());
        assert_eq!(h.status.positions.borrow().last().unwrap(), "2/2  b.png  100%");
    }

    #[test]
    fn test_vanished_first_entry_wraps_back_to_last() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        std::fs::remove_file(&paths[0]).unwrap();

        h.controller.set_paths(paths.clone(), 0);
        assert_eq!(h.errors().len(), 1);
        assert_eq!(h.controller.displayed_path(), Some(paths[2].as_path()));
    }

    #[test]
    fn test_fallback_hops_only_once() {
        let mut h = Harness::new(ViewerOptions::default());
        let good = h.add_still("a.jpg", (10, 10));
        let broken = h.add("b.png", None);
        let gone = h.add_still("c.png", (10, 10));
        std::fs::remove_file(&gone).unwrap();

        h.controller.set_paths(vec![good, broken, gone], 0);
        h.controller.move_by(-1, false);

        // c vanished and the fallback b is undecodable: both are reported
        // and dropped, without hopping on to a.
        assert_eq!(h.errors().len(), 2);
        assert_eq!(h.controller.paths().len(), 1);
        assert_eq!(h.controller.displayed_path(), None);
    }

    #[test]
    fn test_unsupported_file_is_reported_and_dropped() {
        let mut h = Harness::new(ViewerOptions::default());
        let a = h.add_still("a.jpg", (10, 10));
        let bad = h.add("notes.txt", None);
        h.controller.set_paths(vec![a.clone(), bad], 1);

        let errors = h.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error: unsupported format"));
        assert_eq!(h.controller.displayed_path(), Some(a.as_path()));
    }

    #[test]
    fn test_empty_list_reports() {
        let mut h = Harness::new(ViewerOptions::default());
        h.controller.set_paths(Vec::new(), 0);
        h.controller.move_by(1, false);
        assert_eq!(h.errors().len(), 2);
        assert!(h.errors()[1].contains("no images"));
        assert_eq!(h.surface.clears.get(), 1);
    }

    #[test]
    fn test_count_multiplies_move() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![
            h.add_still("1.png", (10, 10)),
            h.add_still("2.png", (10, 10)),
            h.add_still("3.png", (10, 10)),
            h.add_still("4.png", (10, 10)),
        ];
        h.controller.set_paths(paths, 0);

        h.type_count("3");
        h.controller.move_by(1, false);
        assert_eq!(h.controller.current_index(), Some(3));
        assert!(h.count.borrow().is_empty());

        h.type_count("2");
        h.controller.move_by(-1, false);
        assert_eq!(h.controller.current_index(), Some(1));
    }

    #[test]
    fn test_jump_with_count_and_fallbacks() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 0);

        h.controller.jump(None, ListEnd::Last, false);
        assert_eq!(h.controller.current_index(), Some(2));

        h.type_count("2");
        h.controller.jump(None, ListEnd::Last, false);
        assert_eq!(h.controller.current_index(), Some(1));

        h.type_count("9");
        h.controller.jump(None, ListEnd::First, false);
        assert_eq!(h.controller.current_index(), Some(1));
        let errors = h.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Warning: unsupported index 9"));
    }

    #[test]
    fn test_edit_blocks_navigation_until_forced() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 0);

        h.controller.adjust(0.2, 0.0);
        assert!(h.controller.is_edited());

        h.controller.move_by(1, false);
        assert_eq!(h.controller.current_index(), Some(0));
        assert!(h.errors().last().unwrap().contains("add ! to force"));

        h.controller.move_by(1, true);
        assert_eq!(h.controller.current_index(), Some(1));
        assert!(!h.controller.is_edited());
    }

    #[test]
    fn test_animations_cannot_be_edited() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 2);
        h.controller.adjust(0.1, 0.0);
        assert!(h.errors().last().unwrap().contains("cannot be edited"));
        assert!(!h.controller.is_edited());
    }

    #[test]
    fn test_undoing_adjustment_clears_edit_marker() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 0);
        h.controller.adjust(0.0, 0.5);
        h.controller.adjust(0.0, -0.5);
        assert!(!h.controller.is_edited());
    }

    #[test]
    fn test_save_edits_writes_file() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("photo.png", (20, 20));
        h.controller.set_paths(vec![path.clone()], 0);

        h.controller.adjust(0.3, 0.0);
        h.controller.save_edits();
        assert!(!h.controller.is_edited());
        assert!(h.errors().is_empty(), "{:?}", h.errors());
        assert_eq!(image::open(&path).unwrap().to_rgba8().dimensions(), (20, 20));
    }

    #[test]
    fn test_discard_edits_keeps_user_zoom() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("photo.png", (400, 300));
        h.controller.set_paths(vec![path], 0);

        h.controller.zoom_in();
        h.controller.adjust(0.3, 0.0);
        h.controller.discard_edits();
        assert!(!h.controller.is_edited());
        assert_eq!(h.controller.zoom().percent, 1.25);
    }

    #[test]
    fn test_rejected_zoom_keeps_percent() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("wide.png", (200, 80));
        h.controller.set_paths(vec![path], 0);
        assert_eq!(h.controller.zoom().percent, 1.0);

        h.controller.zoom_by(-0.5);
        assert_eq!(h.controller.zoom().percent, 1.0);
        assert!(!h.controller.zoom().user_overridden);
        let errors = h.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Warning: object cannot be zoomed"));
    }

    #[test]
    fn test_zoom_keeps_animation_playing() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 2);
        let timer = h.scheduler.pending.borrow().first().copied();

        h.controller.zoom_to(ZoomTarget::Percent(20.0));
        assert_eq!(h.controller.zoom().percent, 20.0);
        assert_eq!(h.controller.playback_state(), Some(PlaybackState::Playing));
        assert_eq!(h.scheduler.pending.borrow().first().copied(), timer);
    }

    #[test]
    fn test_zoom_count_inverts_with_leading_zero() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("big.png", (400, 400));
        h.controller.set_paths(vec![path], 0);

        h.type_count("04");
        h.controller.zoom_to(ZoomTarget::Fit(FitMode::Both));
        assert_eq!(h.controller.zoom().percent, 0.25);
        assert!(h.controller.zoom().user_overridden);
        assert!(h.count.borrow().is_empty());
    }

    #[test]
    fn test_bad_zoom_count_is_reported() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("big.png", (400, 400));
        h.controller.set_paths(vec![path], 0);

        h.type_count("00");
        h.controller.zoom_to(ZoomTarget::Fit(FitMode::Both));
        assert_eq!(h.controller.zoom().percent, 1.0);
        assert!(h.errors()[0].contains("cannot parse '00'"));
        assert!(h.count.borrow().is_empty());
    }

    #[test]
    fn test_user_zoom_survives_refit_until_reset() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![
            h.add_still("small.png", (400, 300)),
            h.add_still("other.png", (400, 300)),
        ];
        h.controller.set_paths(paths, 0);

        h.controller.zoom_in();
        h.controller.refit();
        assert_eq!(h.controller.zoom().percent, 1.25);

        h.controller.toggle_overzoom();
        assert!(!h.controller.zoom().user_overridden);
        assert_eq!(h.controller.zoom().percent, 2.0);

        h.controller.toggle_overzoom();
        h.controller.zoom_in();
        h.controller.move_by(1, false);
        assert_eq!(h.controller.zoom(), ZoomState::default());
    }

    #[test]
    fn test_fit_width_and_height() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("tall.png", (1000, 2000));
        h.controller.set_paths(vec![path], 0);
        assert_eq!(h.controller.zoom().percent, 0.3);

        h.controller.zoom_to(ZoomTarget::Fit(FitMode::Width));
        assert_eq!(h.controller.zoom().percent, 0.8);
        assert!(!h.controller.zoom().user_overridden);
    }

    #[test]
    fn test_thumbnail_mode_blocks_commands() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 0);
        let lines = h.status.positions.borrow().len();

        h.thumbnail_mode.set(true);
        h.controller.move_by(1, false);
        h.controller.zoom_in();
        h.controller.toggle_animation();
        assert_eq!(h.controller.current_index(), Some(0));
        assert_eq!(h.controller.zoom().percent, 1.0);
        assert!(h.controller.autoplay());
        assert_eq!(h.status.positions.borrow().len(), lines);
    }

    #[test]
    fn test_toggle_animation_pauses_and_resumes() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 2);

        h.controller.toggle_animation();
        assert!(!h.controller.autoplay());
        assert_eq!(h.controller.playback_state(), Some(PlaybackState::Paused));
        assert_eq!(h.pending_timers(), 0);
        assert!(h.status.positions.borrow().last().unwrap().ends_with("[paused]"));

        h.controller.toggle_animation();
        assert_eq!(h.controller.playback_state(), Some(PlaybackState::Playing));
        assert_eq!(h.pending_timers(), 1);
    }

    #[test]
    fn test_slideshow_laps_and_stops() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![h.add_still("1.png", (10, 10)), h.add_still("2.png", (10, 10))];
        h.controller.set_paths(paths, 0);

        h.type_count("5");
        h.controller.toggle_slideshow();
        assert!(h.controller.slideshow_active());
        assert_eq!(*h.scheduler.delays.borrow(), vec![Duration::from_secs(5)]);

        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert_eq!(h.controller.current_index(), Some(1));

        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert_eq!(h.controller.current_index(), Some(0));
        assert_eq!(
            h.status.infos.borrow().last().unwrap(),
            "Info: back at beginning of slideshow"
        );

        h.controller.toggle_slideshow();
        assert!(!h.controller.slideshow_active());
        assert_eq!(h.pending_timers(), 0);
    }

    #[test]
    fn test_slideshow_stops_on_unsaved_edit() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![h.add_still("1.png", (10, 10)), h.add_still("2.png", (10, 10))];
        h.controller.set_paths(paths, 0);
        h.controller.toggle_slideshow();
        h.controller.adjust(0.1, 0.1);

        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert!(!h.controller.slideshow_active());
        assert_eq!(h.controller.current_index(), Some(0));
        assert_eq!(h.pending_timers(), 0);
    }

    #[test]
    fn test_rename_all_updates_paths() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![h.add_still("x.png", (10, 10)), h.add_still("y.png", (10, 10))];
        h.controller.set_paths(paths, 1);

        h.controller.rename_all("pic_");
        assert!(h.errors().is_empty(), "{:?}", h.errors());
        let renamed = h.controller.paths().paths().to_vec();
        assert_eq!(renamed[0], h.dir.path().join("pic_001.png"));
        assert_eq!(renamed[1], h.dir.path().join("pic_002.png"));
        assert_eq!(h.controller.displayed_path(), Some(renamed[1].as_path()));
        assert_eq!(h.controller.clipboard_text(false).as_deref(), Some("pic_002.png"));
    }

    #[test]
    fn test_execute_move_command_with_count() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths, 0);

        h.controller.execute(Command::Move {
            delta: 1,
            count: Some(2),
            force: false,
        });
        assert_eq!(h.controller.current_index(), Some(2));
    }

    #[test]
    fn test_huge_count_wraps_without_overflow() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![
            h.add_still("1.png", (10, 10)),
            h.add_still("2.png", (10, 10)),
            h.add_still("3.png", (10, 10)),
            h.add_still("4.png", (10, 10)),
        ];
        h.controller.set_paths(paths, 1);

        h.type_count(&isize::MAX.to_string());
        h.controller.move_by(1, false);
        assert_eq!(h.controller.current_index(), Some(0));
        assert!(h.errors().is_empty(), "{:?}", h.errors());
    }

    #[test]
    fn test_rename_rejects_repeated_entries() {
        let mut h = Harness::new(ViewerOptions::default());
        let a = h.add_still("a.png", (10, 10));
        let b = h.add_still("b.png", (10, 10));
        let paths = vec![a.clone(), b.clone(), a.clone()];
        h.controller.set_paths(paths.clone(), 0);

        h.controller.rename_all("pic_");
        assert!(h.errors().last().unwrap().contains("appears more than once"));
        assert_eq!(h.controller.paths().paths(), paths.as_slice());
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_partial_rename_keeps_list_in_sync() {
        let mut h = Harness::new(ViewerOptions::default());
        let a = h.add_still("a.png", (10, 10));
        let b = h.add_still("b.png", (10, 10));
        let c = h.add_still("c.png", (10, 10));
        h.controller.set_paths(vec![a, b.clone(), c.clone()], 0);
        std::fs::remove_file(&b).unwrap();

        h.controller.rename_all("pic_");
        assert!(h.errors().last().unwrap().contains("failed to rename"));
        let first = h.dir.path().join("pic_001.png");
        assert!(first.exists());
        assert_eq!(h.controller.paths().paths(), &[first.clone(), b, c.clone()]);
        assert_eq!(h.controller.displayed_path(), Some(first.as_path()));
        assert!(c.exists());
    }

    #[test]
    fn test_navigate_to_unknown_path() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths.clone(), 1);

        h.controller.navigate_to(&h.dir.path().join("elsewhere.png"));
        assert!(h.errors()[0].contains("file not accessible"));
        assert_eq!(h.controller.current_index(), Some(1));
        assert_eq!(h.controller.displayed_path(), Some(paths[1].as_path()));
    }

    #[test]
    fn test_only_entry_vanished_empties_list() {
        let mut h = Harness::new(ViewerOptions::default());
        let gone = h.add_still("gone.png", (10, 10));
        std::fs::remove_file(&gone).unwrap();

        h.controller.set_paths(vec![gone], 0);
        assert_eq!(h.errors().len(), 1);
        assert!(h.controller.paths().is_empty());
        assert_eq!(h.controller.current_index(), None);
        assert_eq!(h.controller.displayed_path(), None);
        assert_eq!(h.surface.clears.get(), 1);
    }

    #[test]
    fn test_repeated_entry_vanishing_drops_both() {
        let mut h = Harness::new(ViewerOptions::default());
        let a = h.add_still("a.png", (10, 10));
        let b = h.add_still("b.png", (10, 10));
        h.controller.set_paths(vec![a.clone(), b.clone(), a.clone()], 2);
        assert_eq!(h.controller.displayed_path(), Some(a.as_path()));
        std::fs::remove_file(&a).unwrap();

        // Wraps onto the first a, whose fallback is the second a.
        h.controller.move_by(1, false);
        assert_eq!(h.errors().len(), 2);
        assert_eq!(h.controller.paths().paths(), &[b]);
        assert_eq!(h.controller.displayed_path(), None);
    }

    #[test]
    fn test_slideshow_waits_in_thumbnail_mode() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = vec![h.add_still("1.png", (10, 10)), h.add_still("2.png", (10, 10))];
        h.controller.set_paths(paths, 0);
        h.controller.toggle_slideshow();

        h.thumbnail_mode.set(true);
        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert_eq!(h.controller.current_index(), Some(0));
        assert!(h.controller.slideshow_active());
        assert_eq!(h.pending_timers(), 1);

        h.thumbnail_mode.set(false);
        let id = h.scheduler.fire();
        h.controller.on_timer(id);
        assert_eq!(h.controller.current_index(), Some(1));
    }

    #[test]
    fn test_refit_updates_position_line() {
        let mut h = Harness::new(ViewerOptions::default());
        let path = h.add_still("big.png", (1600, 1200));
        h.controller.set_paths(vec![path], 0);
        let lines = h.status.positions.borrow().len();

        h.controller.refit();
        assert_eq!(h.status.positions.borrow().len(), lines + 1);
        assert_eq!(h.status.positions.borrow().last().unwrap(), "1/1  big.png  50%");
    }

    fn search_files(h: &Harness) -> Vec<PathBuf> {
        vec![
            h.add_still("cat_1.png", (10, 10)),
            h.add_still("dog.png", (10, 10)),
            h.add_still("Cat_2.png", (10, 10)),
            h.add_still("bird.png", (10, 10)),
            h.add_still("cat_3.png", (10, 10)),
        ]
    }

    #[test]
    fn test_search_moves_through_matches() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = search_files(&h);
        h.controller.set_paths(paths, 1);

        h.controller.search("cat");
        assert_eq!(h.controller.current_index(), Some(4));

        // Wraps past the end, skipping the capitalised name.
        h.controller.search_next(true);
        assert_eq!(h.controller.current_index(), Some(0));

        h.controller.search_next(false);
        assert_eq!(h.controller.current_index(), Some(4));
        assert!(h.errors().is_empty(), "{:?}", h.errors());
    }

    #[test]
    fn test_search_count_skips_matches() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = search_files(&h);
        h.controller.set_paths(paths, 0);

        h.controller.execute(Command::Search("a".to_string()));
        assert_eq!(h.controller.current_index(), Some(2));

        h.controller.execute(Command::SearchNext {
            forward: true,
            count: Some(2),
        });
        assert_eq!(h.controller.current_index(), Some(0));
    }

    #[test]
    fn test_search_without_case() {
        let options = ViewerOptions {
            search_case_sensitive: false,
            ..ViewerOptions::default()
        };
        let mut h = Harness::new(options);
        let paths = search_files(&h);
        h.controller.set_paths(paths, 0);

        h.controller.search("CAT");
        assert_eq!(h.controller.current_index(), Some(2));
    }

    #[test]
    fn test_search_without_results() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = search_files(&h);
        h.controller.set_paths(paths, 3);

        h.controller.search_next(true);
        assert!(h.errors()[0].contains("no search results to navigate"));

        h.controller.search("fish");
        assert!(h.errors()[1].starts_with("Warning: no file matching 'fish'"));
        assert_eq!(h.controller.current_index(), Some(3));
    }

    #[test]
    fn test_open_path_file_pulls_in_directory() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(vec![paths[0].clone()], 0);
        assert_eq!(h.controller.paths().len(), 1);

        h.controller.execute(Command::OpenPath(paths[1].clone()));
        assert_eq!(h.controller.paths().paths(), paths.as_slice());
        assert_eq!(h.controller.current_index(), Some(1));
        assert_eq!(h.controller.displayed_path(), Some(paths[1].as_path()));
    }

    #[test]
    fn test_open_path_directory() {
        let mut h = Harness::new(ViewerOptions::default());
        let outer = h.add_still("outer.png", (10, 10));
        h.controller.set_paths(vec![outer], 0);
        std::fs::create_dir(h.dir.path().join("sub")).unwrap();
        let inner = h.add_still("sub/inner.png", (10, 10));

        h.controller.open_path(&h.dir.path().join("sub"));
        assert_eq!(h.controller.paths().paths(), &[inner.clone()]);
        assert_eq!(h.controller.displayed_path(), Some(inner.as_path()));
    }

    #[test]
    fn test_open_missing_path_keeps_list() {
        let mut h = Harness::new(ViewerOptions::default());
        let paths = three_files(&h);
        h.controller.set_paths(paths.clone(), 0);

        h.controller.open_path(&h.dir.path().join("nowhere"));
        assert!(h.errors()[0].starts_with("Error: not a valid path"));
        assert_eq!(h.controller.paths().paths(), paths.as_slice());
    }
}
