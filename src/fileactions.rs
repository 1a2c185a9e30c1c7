//! Actions applying directly to files: batch renaming and clipboard text.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FileActionError;

/// Text copied for `path`: the basename, or the absolute path.
pub fn clipboard_text(path: &Path, absolute: bool) -> String {
    if absolute {
        std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned()
    } else {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    }
}

fn exif_datetime(path: &Path) -> Option<exif::DateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY))?;
    match &field.value {
        exif::Value::Ascii(values) => values
            .first()
            .and_then(|value| exif::DateTime::from_ascii(value).ok()),
        _ => None,
    }
}

fn expand_template(template: &str, date: Option<&exif::DateTime>) -> String {
    let Some(date) = date else {
        return template.to_string();
    };
    template
        .replace("%Y", &format!("{:04}", date.year))
        .replace("%m", &format!("{:02}", date.month))
        .replace("%d", &format!("{:02}", date.day))
        .replace("%H", &format!("{:02}", date.hour))
        .replace("%M", &format!("{:02}", date.minute))
        .replace("%S", &format!("{:02}", date.second))
}

fn numbered_target(path: &Path, stem: &str, number: usize) -> PathBuf {
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{stem}{number:03}{extension}");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Works out the new name of every file: `<template><NNN><ext>` in its own
/// directory.
///
/// `%Y %m %d %H %M %S` in the template are filled from each file's EXIF
/// date. Nothing is renamed here; any problem with a file or a target is
/// reported before the caller touches the first file. Targets come back in
/// the order of `paths`.
pub fn plan_renames(paths: &[PathBuf], template: &str) -> Result<Vec<PathBuf>, FileActionError> {
    if paths.is_empty() {
        return Err(FileActionError::NoFiles);
    }

    let needs_exif = template.contains('%');
    let mut sources = HashSet::with_capacity(paths.len());
    let mut plan = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        if !sources.insert(path) {
            return Err(FileActionError::DuplicateSource(path.clone()));
        }
        let date = if needs_exif {
            Some(exif_datetime(path).ok_or_else(|| FileActionError::MissingExif(path.clone()))?)
        } else {
            None
        };
        let stem = expand_template(template, date.as_ref());
        let target = numbered_target(path, &stem, i + 1);
        if target != *path && target.exists() {
            return Err(FileActionError::TargetExists(target));
        }
        plan.push(target);
    }
    Ok(plan)
}

/// Renames one planned file.
pub fn rename_file(path: &Path, target: &Path) -> Result<(), FileActionError> {
    debug!("Renaming {} -> {}", path.display(), target.display());
    std::fs::rename(path, target).map_err(|source| FileActionError::Rename {
        path: path.to_path_buf(),
        source,
    })
}
