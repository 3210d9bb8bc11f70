#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via the `HMUI_*` prefix.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
hmui — hybrid-mount control surface (demo driver)

USAGE:
    hmui-app [OPTIONS]

OPTIONS:
    --lang=CODE      UI language (default: persisted preference or en-US)
    --prefs=PATH     Preference file (default: in-memory, forgets on exit)
    --help, -h       Show this help message
    --version, -V    Show version

ENVIRONMENT VARIABLES:
    HMUI_LANG        Override --lang
    HMUI_PREFS       Override --prefs
    RUST_LOG         Log filter (tracing-subscriber env-filter syntax)";

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct Opts {
    /// Language code to select at startup, if any.
    pub lang: Option<String>,
    /// Preference file path; in-memory storage when absent.
    pub prefs_path: Option<PathBuf>,
}

impl Opts {
    /// Parse process arguments, exiting on `--help`, `--version`, or an
    /// unknown flag.
    #[must_use]
    pub fn parse() -> Self {
        let mut opts = Self::default();

        for arg in env::args().skip(1) {
            if let Some(code) = arg.strip_prefix("--lang=") {
                opts.lang = Some(code.to_string());
            } else if let Some(path) = arg.strip_prefix("--prefs=") {
                opts.prefs_path = Some(PathBuf::from(path));
            } else if arg == "--help" || arg == "-h" {
                println!("{HELP_TEXT}");
                process::exit(0);
            } else if arg == "--version" || arg == "-V" {
                println!("hmui {VERSION}");
                process::exit(0);
            } else {
                eprintln!("unknown option: {arg}");
                eprintln!("{HELP_TEXT}");
                process::exit(2);
            }
        }

        if let Ok(code) = env::var("HMUI_LANG") {
            opts.lang = Some(code);
        }
        if let Ok(path) = env::var("HMUI_PREFS") {
            opts.prefs_path = Some(PathBuf::from(path));
        }

        opts
    }
}
