//! Command-line interface for ScrumBot
//!
//! Handles argument parsing and logging configuration.

use clap::Parser;
use log::LevelFilter;

/// ScrumBot - talk through your daily stand-up by voice or text
#[derive(Parser, Debug)]
#[command(name = "scrumbot")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the ScrumBot backend API
    #[arg(long, env = "SCRUMBOT_API_URL", default_value = "http://127.0.0.1:8000/api")]
    pub api_url: String,

    /// Project whose status report is fetched on refresh
    #[arg(long, env = "SCRUMBOT_PROJECT_KEY", default_value = "SCRUM")]
    pub project_key: String,

    /// Silence between spoken segments, in milliseconds
    #[arg(long, env = "SCRUMBOT_SEGMENT_PAUSE_MS", default_value_t = 500)]
    pub segment_pause_ms: u64,

    /// Give up on a backend request after this many seconds
    #[arg(long, env = "SCRUMBOT_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Do not play synthesized speech
    #[arg(long)]
    pub mute: bool,

    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace, -vvvv = also HTTP and GUI internals
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("scrumbot", args.log_level());

    if args.verbose >= 4 {
        builder.filter_module("reqwest", args.log_level());
        builder.filter_module("hyper", args.log_level());
        builder.filter_module("naga", args.log_level());
        builder.filter_module("blade_graphics", args.log_level());
        builder.filter_module("gpui", args.log_level());
    }

    builder.format_timestamp_millis().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["scrumbot"]);
        assert_eq!(args.project_key, "SCRUM");
        assert_eq!(args.segment_pause_ms, 500);
        assert!(!args.mute);
        assert_eq!(args.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_verbosity() {
        let args = Args::parse_from(["scrumbot", "-vv"]);
        assert_eq!(args.log_level(), LevelFilter::Debug);

        let args = Args::parse_from(["scrumbot", "-vvv", "--quiet"]);
        assert_eq!(args.log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "scrumbot",
            "--api-url",
            "http://bot.local/api",
            "--segment-pause-ms",
            "0",
            "--mute",
        ]);
        assert_eq!(args.api_url, "http://bot.local/api");
        assert_eq!(args.segment_pause_ms, 0);
        assert!(args.mute);
    }
}
