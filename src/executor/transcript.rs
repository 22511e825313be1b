use std::{ffi::OsString, io::ErrorKind, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;

use crate::{
    executor::{command, Executor},
    item::WorkItem,
    parser::video::video_url,
};

/// Subtitle tracks tried in order.
const SUBTITLE_LANGUAGES: [&str; 3] = ["en", "en-US", "en-GB"];

/// Fetches the English subtitles of a video with yt-dlp and flattens them to plain text.
#[derive(Clone, Debug)]
pub struct TranscriptExecutor {
    program: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct Json3 {
    events: Option<Vec<Event>>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    segs: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    utf8: Option<String>,
}

impl TranscriptExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Executor for TranscriptExecutor {
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    async fn execute(&self, item: WorkItem) -> anyhow::Result<String> {
        let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
        let template = scratch.path().join(&item.id);

        let args: Vec<OsString> = vec![
            "--write-auto-sub".into(),
            "--write-sub".into(),
            "--sub-lang".into(),
            "en".into(),
            "--skip-download".into(),
            "--sub-format".into(),
            "json3".into(),
            "--output".into(),
            template.into_os_string(),
            "--quiet".into(),
            "--no-warnings".into(),
            video_url(&item.id).into(),
        ];

        // yt-dlp may exit non-zero after writing subtitles, so the files decide
        let output = command::run(&self.program, args, self.timeout).await?;

        for language in SUBTITLE_LANGUAGES {
            let path = scratch.path().join(format!("{}.{language}.json3", item.id));
            let contents = match tokio::fs::read(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
            };

            if let Some(text) = parse_json3(&contents)? {
                tracing::debug!(language, chars = text.len(), "found subtitles");
                return Ok(text);
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        match stderr.trim() {
            "" => anyhow::bail!("no subtitles found"),
            stderr => anyhow::bail!("no subtitles found: {stderr}"),
        }
    }
}

/// Joins every text fragment of a json3 subtitle document. `None` when it has no events.
pub fn parse_json3(contents: &[u8]) -> anyhow::Result<Option<String>> {
    let document: Json3 = serde_json::from_slice(contents).context("invalid json3 subtitles")?;
    let Some(events) = document.events else {
        return Ok(None);
    };

    let text = events
        .iter()
        .flat_map(|event| &event.segs)
        .filter_map(|segment| segment.utf8.as_deref())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Some(text.trim().to_string()))
}
