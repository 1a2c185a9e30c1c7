//! File list population.
//!
//! A single file expands to every image in its directory, directories are
//! walked with walkdir when recursion is enabled, and anything the decoder
//! cannot read is filtered out by extension.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::UserDirs;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Settings;
use crate::image_loader::is_image;
use crate::viewer::Shuffle;

/// Configuration for populating the file list.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to walk directories recursively.
    pub recursive: bool,
    /// Shuffle the resulting list.
    pub shuffle: bool,
    /// A single file argument pulls in its whole directory.
    pub expand_single: bool,
    /// Include dot files.
    pub show_hidden: bool,
    /// Whether to follow symbolic links while walking.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            shuffle: false,
            expand_single: true,
            show_hidden: false,
            follow_symlinks: false,
        }
    }
}

impl From<&Settings> for ScanConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            recursive: settings.general.recursive,
            shuffle: settings.general.shuffle,
            expand_single: settings.general.expand_single,
            show_hidden: settings.general.show_hidden,
            follow_symlinks: false,
        }
    }
}

/// Populated file list and the position of the first argument in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Population {
    pub paths: Vec<PathBuf>,
    pub index: usize,
}

pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Lists the files of `dir`, sorted by path. Only the top level is
    /// read unless recursion is enabled.
    fn discover_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let show_hidden = self.config.show_hidden;
        walker
            .into_iter()
            .filter_entry(|entry| show_hidden || !Self::is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|entry| !entry.file_type().is_dir())
            .map(DirEntry::into_path)
            .collect()
    }

    /// Expands a lone argument: a file becomes its whole directory, a
    /// directory is walked when recursion is enabled.
    fn expand_single(&self, arg: &Path) -> Vec<PathBuf> {
        if arg.is_file() {
            let dir = match arg.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let config = ScanConfig {
                recursive: false,
                ..self.config.clone()
            };
            let mut paths = Self::with_config(config).discover_files(dir);
            // The argument itself stays even when it is a dot file.
            if !paths.iter().any(|path| path == arg) {
                paths.push(arg.to_path_buf());
                paths.sort();
            }
            paths
        } else if arg.is_dir() && self.config.recursive {
            self.discover_files(arg)
        } else {
            vec![arg.to_path_buf()]
        }
    }

    /// Builds the file list for `args`.
    pub fn populate(&self, args: &[PathBuf]) -> Result<Population> {
        let args = args
            .iter()
            .map(|arg| std::path::absolute(arg).with_context(|| format!("Invalid path {arg:?}")))
            .collect::<Result<Vec<_>>>()?;
        let first = args.first().cloned();

        let candidates = match args.as_slice() {
            [single] if self.config.expand_single => self.expand_single(single),
            _ => args.clone(),
        };

        let mut paths = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.is_file() {
                paths.push(candidate);
            } else if candidate.is_dir() && self.config.recursive {
                paths.extend(self.discover_files(&candidate));
            } else {
                debug!("Ignoring argument {}", candidate.display());
            }
        }
        Ok(self.finish(paths, first.as_deref()))
    }

    /// Builds the file list from the images in `dir`: its top level, or the
    /// whole tree when recursion is enabled.
    pub fn populate_directory(&self, dir: &Path) -> Result<Population> {
        let dir = std::path::absolute(dir).with_context(|| format!("Invalid path {dir:?}"))?;
        if !dir.is_dir() {
            bail!("Not a directory: {}", dir.display());
        }
        let paths = self.discover_files(&dir);
        Ok(self.finish(paths, None))
    }

    /// Filters out non-images and applies the shuffle. `first` ends up at
    /// the returned index.
    fn finish(&self, mut paths: Vec<PathBuf>, first: Option<&Path>) -> Population {
        paths.retain(|path| is_image(path));

        let mut index = first
            .and_then(|first| paths.iter().position(|path| path == first))
            .unwrap_or(0);

        if self.config.shuffle && !paths.is_empty() {
            // The requested image stays first, the rest is shuffled.
            paths.swap(0, index);
            Shuffle::from_clock().apply(&mut paths[1..]);
            index = 0;
        }

        info!("Populated {} images", paths.len());
        Population { paths, index }
    }
}

/// Builds the file list for `args` with `config`.
pub fn populate(args: &[PathBuf], config: ScanConfig) -> Result<Population> {
    FileScanner::with_config(config).populate(args)
}

/// Builds the file list from the images in `dir` with `config`.
pub fn populate_directory(dir: &Path, config: ScanConfig) -> Result<Population> {
    FileScanner::with_config(config).populate_directory(dir)
}

/// Replaces a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match UserDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}
