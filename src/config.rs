use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;

use crate::{cli::RunArgs, throttle::ThrottlePolicy};

pub const DEFAULT_INSTALL: &str = "python3 -m pip install --upgrade yt-dlp";

/// Settings of one pipeline run, validated from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Subcommand name, reported with the run's metrics.
    pub command: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    pub limit: Option<usize>,
    pub throttle: ThrottlePolicy,
    pub resume: bool,
    /// Command line to run when the external program is missing. `None` forbids installing.
    pub install: Option<Vec<String>>,
    pub timeout: Option<Duration>,
    pub metrics_port: Option<u16>,
}

/// Per-command fallbacks for settings left unset.
#[derive(Clone, Copy, Debug)]
pub struct Defaults {
    pub command: &'static str,
    pub output: &'static str,
    pub delay: f64,
    pub timeout: Option<f64>,
    pub install: Option<&'static str>,
}

impl RunConfig {
    pub fn from_args(args: &RunArgs, defaults: Defaults) -> anyhow::Result<Self> {
        let delay = seconds("delay", args.delay.unwrap_or(defaults.delay))?;
        let jitter = seconds("jitter", args.jitter)?;
        let timeout = args
            .timeout
            .or(defaults.timeout)
            .map(|timeout| seconds("timeout", timeout))
            .transpose()?;

        let install = if args.install {
            let command = args.install_with.as_deref().or(defaults.install);
            if command.is_none() {
                tracing::warn!("--install has no effect without --install-with");
            }
            command.map(|command| command.split_whitespace().map(str::to_string).collect())
        } else {
            None
        };

        Ok(Self {
            command: defaults.command,
            input: args.input.clone(),
            output: args.output.clone().unwrap_or_else(|| PathBuf::from(defaults.output)),
            limit: args.limit,
            throttle: ThrottlePolicy::new(delay).with_jitter(jitter),
            resume: args.resume,
            install,
            timeout,
            metrics_port: args.metrics_port,
        })
    }
}

fn seconds(name: &str, value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {name}: {value} seconds"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use crate::{
        cli::{Cli, Command, RunArgs},
        config::{Defaults, RunConfig, DEFAULT_INSTALL},
    };

    const DEFAULTS: Defaults = Defaults {
        command: "transcripts",
        output: "transcripts",
        delay: 2.0,
        timeout: Some(30.0),
        install: Some(DEFAULT_INSTALL),
    };

    fn args(extra: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(["ratebatch", "transcripts", "urls.txt"].iter().chain(extra)).unwrap();
        match cli.command {
            Command::Transcripts { run, .. } => run,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults() {
        let config = RunConfig::from_args(&args(&[]), DEFAULTS).unwrap();

        assert_eq!(config.throttle.min_delay(), Duration::from_secs(2));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.install, None);
        assert_eq!(config.output.to_str(), Some("transcripts"));
        assert!(!config.resume);
    }

    #[test]
    fn overrides() {
        let config = RunConfig::from_args(&args(&["--delay", "5", "--output", "out", "--install", "--timeout", "1.5", "--limit", "4"]), DEFAULTS).unwrap();

        assert_eq!(config.throttle.min_delay(), Duration::from_secs(5));
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.limit, Some(4));
        assert_eq!(config.output.to_str(), Some("out"));
        assert_eq!(
            config.install.as_deref(),
            Some(["python3", "-m", "pip", "install", "--upgrade", "yt-dlp"].map(String::from).as_slice())
        );
    }

    #[test]
    fn rejects_negative_delay() {
        assert!(RunConfig::from_args(&args(&["--delay=-1"]), DEFAULTS).is_err());
    }
}
