//! Toolkit-independent core of the viewer.

mod animation;
mod collaborators;
mod command;
mod controller;
mod input;
mod path_store;
mod zoom;

pub use animation::{Animation, Frame};
pub use collaborators::{Decoded, Decoder, RenderSurface, Scheduler, StatusReporter, TimerId, Viewport};
pub use command::{parse_command, Command, ListEnd};
pub use controller::{ImageController, ViewerContext, ViewerOptions};
pub use input::CountBuffer;
pub use path_store::Shuffle;
pub use zoom::{FitMode, ZoomTarget};
