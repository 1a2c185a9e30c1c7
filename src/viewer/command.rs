//! Parsing of `:`-commands typed into the command line.

use std::path::PathBuf;

use super::zoom::{FitMode, ZoomTarget};
use crate::error::{Result, ViewerError};

/// Which end of the list `first`/`last` fall back to without a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Relative move; `count` multiplies the step.
    Move { delta: isize, count: Option<usize>, force: bool },
    /// Absolute 1-based position, or an end of the list.
    Jump { position: Option<usize>, fallback: ListEnd, force: bool },
    ZoomIn,
    ZoomOut,
    Zoom(ZoomTarget),
    ToggleAnimation,
    ToggleOverzoom,
    Slideshow,
    Brightness(f64),
    Contrast(f64),
    Save,
    Discard,
    Format(String),
    CopyName { absolute: bool },
    /// `/pattern`: jump to the next file whose name contains `pattern`.
    Search(String),
    /// Next or previous match of the last search; `count` skips matches.
    SearchNext { forward: bool, count: Option<usize> },
    /// A line starting with `/`, `~` or `.` after the colon.
    OpenPath(PathBuf),
    Quit,
}

fn parse_number<T: std::str::FromStr>(text: &str) -> Result<T> {
    text.parse().map_err(|_| ViewerError::Parse(text.to_string()))
}

fn optional_number<T: std::str::FromStr>(arg: Option<&str>) -> Result<Option<T>> {
    arg.map(parse_number).transpose()
}

fn required<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str> {
    arg.ok_or_else(|| ViewerError::Parse(format!("{name}: missing argument")))
}

/// Parses one command line. A leading `:` is optional; a trailing `!` on the
/// command name forces navigation past unsaved edits. A line opened with `/`
/// is a search, and a `:` line that looks like a path opens it.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if let Some(pattern) = line.strip_prefix('/') {
        if pattern.is_empty() {
            return Err(ViewerError::Parse("search: missing pattern".to_string()));
        }
        return Ok(Command::Search(pattern.to_string()));
    }
    let line = line.trim_start_matches(':').trim();
    if line.starts_with(['/', '~', '.']) {
        return Ok(Command::OpenPath(PathBuf::from(line)));
    }
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim()).filter(|rest| !rest.is_empty())),
        None => (line, None),
    };
    let (name, force) = match name.strip_suffix('!') {
        Some(name) => (name, true),
        None => (name, false),
    };

    let command = match name {
        "next" => Command::Move { delta: 1, count: optional_number(arg)?, force },
        "prev" => Command::Move { delta: -1, count: optional_number(arg)?, force },
        "first" => Command::Jump { position: None, fallback: ListEnd::First, force },
        "last" => Command::Jump { position: None, fallback: ListEnd::Last, force },
        "goto" => Command::Jump {
            position: Some(parse_number(required(name, arg)?)?),
            fallback: ListEnd::First,
            force,
        },
        "zoom_in" => Command::ZoomIn,
        "zoom_out" => Command::ZoomOut,
        "zoom_to" => Command::Zoom(ZoomTarget::Percent(parse_number(required(name, arg)?)?)),
        "fit" => Command::Zoom(ZoomTarget::Fit(FitMode::Both)),
        "fit_width" => Command::Zoom(ZoomTarget::Fit(FitMode::Width)),
        "fit_height" => Command::Zoom(ZoomTarget::Fit(FitMode::Height)),
        "toggle_animation" => Command::ToggleAnimation,
        "toggle_overzoom" => Command::ToggleOverzoom,
        "slideshow" => Command::Slideshow,
        "brightness" => Command::Brightness(parse_number(required(name, arg)?)?),
        "contrast" => Command::Contrast(parse_number(required(name, arg)?)?),
        "save" => Command::Save,
        "discard" => Command::Discard,
        "format" => Command::Format(required(name, arg)?.to_string()),
        "copy_name" => Command::CopyName { absolute: false },
        "copy_abspath" => Command::CopyName { absolute: true },
        "search_next" => Command::SearchNext { forward: true, count: optional_number(arg)? },
        "search_prev" => Command::SearchNext { forward: false, count: optional_number(arg)? },
        "q" | "quit" => Command::Quit,
        _ => return Err(ViewerError::Parse(format!("unknown command '{line}'"))),
    };
    Ok(command)
}
