pub mod keybindings;
pub mod surface;
pub mod window;

pub use window::{MainWindow, StartupState};
