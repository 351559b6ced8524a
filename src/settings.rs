//! Client settings resolved from the command line and environment
//!
//! Nothing is persisted; every launch starts from `Args`.

use crate::cli::Args;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    pub project_key: String,
    pub segment_pause: Duration,
    pub request_timeout: Duration,
    pub mute: bool,
}

impl From<&Args> for ClientSettings {
    fn from(args: &Args) -> Self {
        Self {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            project_key: args.project_key.clone(),
            segment_pause: Duration::from_millis(args.segment_pause_ms),
            request_timeout: Duration::from_secs(args.request_timeout_secs.max(1)),
            mute: args.mute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_args() {
        let args = Args::parse_from([
            "scrumbot",
            "--api-url",
            "http://bot.local/api/",
            "--request-timeout-secs",
            "0",
        ]);
        let settings = ClientSettings::from(&args);

        assert_eq!(settings.api_url, "http://bot.local/api");
        assert_eq!(settings.segment_pause, Duration::from_millis(500));
        assert_eq!(settings.request_timeout, Duration::from_secs(1));
    }
}
