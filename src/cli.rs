use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::parser::ParserKind;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Log::Plain, env = "RATEBATCH_LOG", global = true)]
    pub log: Log,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a program once per input entry.
    ///
    /// `{id}` and `{line}` in the arguments are replaced by the item identifier and its
    /// source line; without either, the identifier is appended.
    Run {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long, value_enum, default_value_t = ParserKind::Plain)]
        parser: ParserKind,

        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Fetch English transcripts for a list of video URLs.
    Transcripts {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        yt_dlp: YtDlpArgs,
    },

    /// List the videos of a list of channel URLs.
    Channels {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        yt_dlp: YtDlpArgs,

        /// Videos to list per channel
        #[arg(long)]
        max_videos: Option<NonZeroUsize>,
    },

    /// Select persisted items whose content matches keywords.
    Filter(FilterArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Input list, one entry per line
    pub input: PathBuf,

    /// Process at most this many items
    #[arg(short, long, env = "RATEBATCH_LIMIT")]
    pub limit: Option<usize>,

    /// Seconds to wait between items
    #[arg(short, long, env = "RATEBATCH_DELAY")]
    pub delay: Option<f64>,

    /// Up to this many extra seconds added to each delay at random
    #[arg(long, env = "RATEBATCH_JITTER", default_value_t = 0.0)]
    pub jitter: f64,

    /// Output directory [default: output, transcripts or channel_videos]
    #[arg(short, long, env = "RATEBATCH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Skip items that already have a persisted result
    #[arg(long)]
    pub resume: bool,

    /// Install the external program when it is missing
    #[arg(long)]
    pub install: bool,

    /// Command used by --install
    #[arg(long, value_name = "COMMAND")]
    pub install_with: Option<String>,

    /// Seconds each invocation may take
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Serve progress metrics on this port during the run
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Args)]
pub struct YtDlpArgs {
    #[arg(long, default_value = "yt-dlp")]
    pub yt_dlp: String,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Output directory of a previous run
    pub dir: PathBuf,

    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// File with one keyword per line
    #[arg(long)]
    pub keywords_file: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    pub min_score: usize,

    /// Where to write the results, defaults to DIR
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Log {
    Plain,
    Json,
}
