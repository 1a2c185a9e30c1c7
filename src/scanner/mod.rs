//! Turning command line arguments into the list of images to show.

mod file_scanner;

pub use file_scanner::{expand_home, populate, populate_directory, ScanConfig};
