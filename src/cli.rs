//! Command line parsing.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::config::Settings;

pub const USAGE: &str = "\
usage: pictor [OPTIONS] [PATH...]

options:
  -r, --recursive     walk directories recursively
  -s, --shuffle       shuffle the file list
      --overzoom      upscale images smaller than the window
      --no-autoplay   start animations paused
      --show-hidden   include dot files
      --config FILE   read settings from FILE
  -h, --help          print this help
";

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub help: bool,
    pub recursive: bool,
    pub shuffle: bool,
    pub overzoom: bool,
    pub no_autoplay: bool,
    pub show_hidden: bool,
    pub config: Option<PathBuf>,
    pub paths: Vec<PathBuf>,
}

impl CliArgs {
    pub fn from_env() -> Result<Self> {
        Self::parse(pico_args::Arguments::from_env())
    }

    pub fn parse(mut args: pico_args::Arguments) -> Result<Self> {
        let mut cli = Self {
            help: args.contains(["-h", "--help"]),
            recursive: args.contains(["-r", "--recursive"]),
            shuffle: args.contains(["-s", "--shuffle"]),
            overzoom: args.contains("--overzoom"),
            no_autoplay: args.contains("--no-autoplay"),
            show_hidden: args.contains("--show-hidden"),
            config: args.opt_value_from_os_str("--config", |value| {
                Ok::<_, std::convert::Infallible>(PathBuf::from(value))
            })?,
            paths: Vec::new(),
        };

        for arg in args.finish() {
            if arg.to_str().is_some_and(|arg| arg.starts_with('-') && arg.len() > 1) {
                bail!("unknown option {:?}", arg);
            }
            cli.paths.push(PathBuf::from(arg));
        }
        Ok(cli)
    }

    /// Flags given on the command line win over the config file.
    pub fn apply(&self, settings: &mut Settings) {
        let general = &mut settings.general;
        general.recursive |= self.recursive;
        general.shuffle |= self.shuffle;
        general.overzoom |= self.overzoom;
        general.show_hidden |= self.show_hidden;
        if self.no_autoplay {
            general.autoplay_animations = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse_from<const N: usize>(args: [&str; N]) -> Result<CliArgs> {
        CliArgs::parse(pico_args::Arguments::from_vec(
            args.into_iter().map(OsString::from).collect(),
        ))
    }

    #[test]
    fn test_flags_and_paths() {
        let cli = parse_from(["-r", "--no-autoplay", "a.png", "--config", "x.toml", "dir"]).unwrap();
        assert!(cli.recursive);
        assert!(cli.no_autoplay);
        assert!(!cli.shuffle);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(cli.paths, vec![PathBuf::from("a.png"), PathBuf::from("dir")]);
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(parse_from(["--frobnicate"]).is_err());
        assert!(parse_from(["-"]).unwrap().paths == vec![PathBuf::from("-")]);
    }

    #[test]
    fn test_apply_overrides_settings() {
        let mut settings = Settings::default();
        let cli = parse_from(["--shuffle", "--overzoom", "--no-autoplay"]).unwrap();
        cli.apply(&mut settings);
        assert!(settings.general.shuffle);
        assert!(settings.general.overzoom);
        assert!(!settings.general.autoplay_animations);
        assert!(!settings.general.recursive);
    }
}
