//! Frame-timer playback for animated images.

use std::time::Duration;

use image::RgbaImage;
use tracing::trace;

use super::collaborators::{Scheduler, TimerId};

/// One fully composited animation frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub delay: Duration,
}

/// Decoded animation. Always holds at least one frame.
#[derive(Clone)]
pub struct Animation {
    frames: Vec<Frame>,
}

impl Animation {
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        (!frames.is_empty()).then_some(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index % self.frames.len()]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].image.dimensions()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Drives an [`Animation`] through an injected [`Scheduler`].
///
/// At most one timer is pending at any time: every path that arms a timer
/// cancels the previous one first.
pub struct AnimationPlayer {
    animation: Animation,
    state: PlaybackState,
    frame: usize,
    timer: Option<TimerId>,
}

impl AnimationPlayer {
    pub fn new(animation: Animation) -> Self {
        Self {
            animation,
            state: PlaybackState::Stopped,
            frame: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn current_frame(&self) -> &Frame {
        self.animation.frame(self.frame)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.animation.dimensions()
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.timer
    }

    fn disarm(&mut self, scheduler: &dyn Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
    }

    fn arm(&mut self, scheduler: &dyn Scheduler) {
        self.disarm(scheduler);
        if self.animation.len() > 1 {
            self.timer = Some(scheduler.schedule(self.current_frame().delay));
        }
    }

    /// Begins (or restarts) playback from the current frame.
    pub fn start(&mut self, scheduler: &dyn Scheduler) {
        self.state = PlaybackState::Playing;
        self.arm(scheduler);
    }

    pub fn pause(&mut self, scheduler: &dyn Scheduler) {
        self.disarm(scheduler);
        self.state = PlaybackState::Paused;
    }

    pub fn resume(&mut self, scheduler: &dyn Scheduler) {
        self.start(scheduler);
    }

    pub fn stop(&mut self, scheduler: &dyn Scheduler) {
        self.disarm(scheduler);
        self.state = PlaybackState::Stopped;
    }

    /// Handles an expired timer. Returns true when the frame advanced and
    /// needs rendering; ticks for stale timers are ignored.
    pub fn on_timer(&mut self, id: TimerId, scheduler: &dyn Scheduler) -> bool {
        if self.timer != Some(id) || self.state != PlaybackState::Playing {
            return false;
        }
        self.timer = None;
        self.frame = (self.frame + 1) % self.animation.len();
        trace!(frame = self.frame, "Animation advanced");
        self.arm(scheduler);
        true
    }
}
