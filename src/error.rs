//! Error types shared by the viewer core.

use std::path::PathBuf;

use thiserror::Error;

/// Why a file could not be turned into a displayable image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file vanished: {}", .0.display())]
    Vanished(PathBuf),
    #[error("unsupported format: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("corrupt image data in {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// Failures of the rename/save helpers in `fileactions` and `image_loader`.
#[derive(Debug, Error)]
pub enum FileActionError {
    #[error("no files in path")]
    NoFiles,
    #[error("no exif data for {} available", .0.display())]
    MissingExif(PathBuf),
    #[error("target {} already exists", .0.display())]
    TargetExists(PathBuf),
    #[error("{} appears more than once", .0.display())]
    DuplicateSource(PathBuf),
    #[error("failed to rename {}: {source}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Everything that can go wrong inside the image controller.
///
/// None of these escape the controller: they are turned into status
/// messages at its boundary.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("no images in the file list")]
    EmptyList,
    #[error("unsupported index {position}, valid range is 1-{len}")]
    OutOfRange { position: usize, len: usize },
    #[error("cannot parse '{0}'")]
    Parse(String),
    #[error("image has been edited, add ! to force")]
    EditInProgress,
    #[error("file not accessible: {}", .0.display())]
    FileVanished(PathBuf),
    #[error("object cannot be zoomed (further)")]
    Unzoomable,
    #[error("animations cannot be edited")]
    NotEditable,
    #[error("no file matching '{0}'")]
    NoSearchResults(String),
    #[error("no search results to navigate")]
    NoSearch,
    #[error("not a valid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Scan(#[from] anyhow::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    FileAction(#[from] FileActionError),
}

impl ViewerError {
    /// Recoverable conditions are shown as warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::Unzoomable | Self::OutOfRange { .. } | Self::NoSearchResults(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
