use std::{num::NonZeroUsize, path::Path};

use anyhow::Context as _;

use crate::{
    cli::{Command, FilterArgs, RunArgs},
    config::{Defaults, RunConfig, DEFAULT_INSTALL},
    executor::{channel::{collect_urls, ChannelExecutor}, command::CommandExecutor, transcript::TranscriptExecutor},
    filter::{self, KeywordFilter},
    parser::{channel::ChannelUrlParser, video::VideoUrlParser, ParserKind},
    pipeline::{Pipeline, RunSummary},
    prerequisite::ProgramPrerequisite,
    sink::{artifact::Status, fs::{write_atomic, FsSink}},
};

pub const URL_LIST: &str = "all_video_urls.txt";

const COMMAND_DEFAULTS: Defaults = Defaults {
    command: "run",
    output: "output",
    delay: 2.0,
    timeout: None,
    install: None,
};

const TRANSCRIPT_DEFAULTS: Defaults = Defaults {
    command: "transcripts",
    output: "transcripts",
    delay: 2.0,
    timeout: Some(30.0),
    install: Some(DEFAULT_INSTALL),
};

const CHANNEL_DEFAULTS: Defaults = Defaults {
    command: "channels",
    output: "channel_videos",
    delay: 5.0,
    timeout: Some(120.0),
    install: Some(DEFAULT_INSTALL),
};

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run { run, parser, command } => run_cmd(&run, parser, command).await,
        Command::Transcripts { run, yt_dlp } => transcripts_cmd(&run, yt_dlp.yt_dlp).await,
        Command::Channels { run, yt_dlp, max_videos } => channels_cmd(&run, yt_dlp.yt_dlp, max_videos).await,
        Command::Filter(args) => filter_cmd(&args).await,
    }
}

async fn run_cmd(args: &RunArgs, parser: ParserKind, command: Vec<String>) -> anyhow::Result<()> {
    let config = RunConfig::from_args(args, COMMAND_DEFAULTS)?;
    let Some((program, program_args)) = command.split_first() else {
        anyhow::bail!("no command given");
    };

    let prerequisite = ProgramPrerequisite::new(program.as_str()).install_with(config.install.clone());
    let executor = CommandExecutor::new(program.as_str(), program_args.iter().cloned()).timeout(config.timeout);
    let summary = Pipeline::new(prerequisite, executor, parser.build(), config).run().await?;

    print_summary(&summary);

    Ok(())
}

async fn transcripts_cmd(args: &RunArgs, yt_dlp: String) -> anyhow::Result<()> {
    let config = RunConfig::from_args(args, TRANSCRIPT_DEFAULTS)?;
    let prerequisite = ProgramPrerequisite::new(yt_dlp.as_str()).install_with(config.install.clone());
    let executor = TranscriptExecutor::new(yt_dlp).timeout(config.timeout);
    let summary = Pipeline::new(prerequisite, executor, VideoUrlParser, config).run().await?;

    print_summary(&summary);

    Ok(())
}

async fn channels_cmd(args: &RunArgs, yt_dlp: String, max_videos: Option<NonZeroUsize>) -> anyhow::Result<()> {
    let config = RunConfig::from_args(args, CHANNEL_DEFAULTS)?;
    let prerequisite = ProgramPrerequisite::new(yt_dlp.as_str()).install_with(config.install.clone());
    let executor = ChannelExecutor::new(yt_dlp).max_videos(max_videos).timeout(config.timeout);
    let summary = Pipeline::new(prerequisite, executor, ChannelUrlParser, config).run().await?;

    let count = write_url_list(&summary.output).await?;
    tracing::info!("collected {count} video URLs into {URL_LIST}");

    print_summary(&summary);

    Ok(())
}

async fn filter_cmd(args: &FilterArgs) -> anyhow::Result<()> {
    let mut keywords = args.keywords.clone();
    if let Some(path) = &args.keywords_file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        keywords.extend(filter::load_keywords(&contents));
    }

    let sink = FsSink::existing(&args.dir)?;
    let keyword_filter = KeywordFilter::new(&keywords, args.min_score)?;
    let matches = keyword_filter.apply(&sink).await?;

    let output = args.output.as_deref().unwrap_or(&args.dir);
    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("failed to create {}", output.display()))?;
    filter::write(&matches, output).await?;

    println!("{} matching items written to {}", matches.len(), output.join(filter::JSON_RESULTS).display());

    Ok(())
}

/// Gathers the video URLs of every persisted channel listing into one input list.
async fn write_url_list(output: &Path) -> anyhow::Result<usize> {
    let sink = FsSink::existing(output)?;
    let mut listings = Vec::new();
    for artifact in sink.artifacts().await? {
        if artifact.status == Status::Success {
            let payload = sink.payload(&artifact).await?;
            listings.push((artifact.id, payload));
        }
    }

    let urls = collect_urls(listings.iter().map(|(id, payload)| (id.as_str(), payload.as_str())));
    let mut contents = urls.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    write_atomic(&output.join(URL_LIST), contents.as_bytes())
        .await
        .with_context(|| format!("failed to write {URL_LIST}"))?;

    Ok(urls.len())
}

fn print_summary(summary: &RunSummary) {
    println!("{}", summary.tally);
    println!("results in {}", summary.output.display());
}
