use std::{collections::HashSet, num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    executor::{command, Executor},
    item::WorkItem,
    parser::{channel::channel_url, video::video_url},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub url: String,
}

/// Lists the uploads of a channel with yt-dlp. The payload is a JSON array of [`Video`].
#[derive(Clone, Debug)]
pub struct ChannelExecutor {
    program: String,
    max_videos: Option<NonZeroUsize>,
    timeout: Option<Duration>,
}

impl ChannelExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            max_videos: None,
            timeout: None,
        }
    }

    pub fn max_videos(mut self, max_videos: Option<NonZeroUsize>) -> Self {
        self.max_videos = max_videos;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(&self, handle: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--print".to_string(),
            "%(id)s|%(title)s".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            format!("{}/videos", channel_url(handle)),
        ];
        if let Some(max_videos) = self.max_videos {
            args.push("--playlist-end".to_string());
            args.push(max_videos.to_string());
        }

        args
    }
}

impl Executor for ChannelExecutor {
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    async fn execute(&self, item: WorkItem) -> anyhow::Result<String> {
        let output = command::run(&self.program, self.args(&item.id), self.timeout).await?;
        let stdout = command::into_stdout(&self.program, output)?;
        let videos = parse_listing(&String::from_utf8_lossy(&stdout));

        tracing::debug!(videos = videos.len(), "listed channel");

        Ok(serde_json::to_string_pretty(&videos)?)
    }
}

/// Parses `id|title` lines. Lines without a separator or an id are ignored.
pub fn parse_listing(listing: &str) -> Vec<Video> {
    listing
        .lines()
        .filter_map(|line| line.split_once('|'))
        .map(|(id, title)| (id.trim(), title.trim()))
        .filter(|(id, _)| !id.is_empty())
        .map(|(id, title)| Video {
            video_id: id.to_string(),
            title: title.to_string(),
            url: video_url(id),
        })
        .collect()
}

/// Video URLs across channel listings, first occurrence wins.
///
/// Takes `(item, payload)` pairs. Payloads that are not listings are logged and left out.
pub fn collect_urls<'a, I>(listings: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for (id, listing) in listings {
        let videos: Vec<Video> = match serde_json::from_str(listing) {
            Ok(videos) => videos,
            Err(err) => {
                tracing::warn!(item = %id, "not a channel listing: {err}");
                continue;
            },
        };
        urls.extend(videos.into_iter().map(|video| video.url).filter(|url| seen.insert(url.clone())));
    }

    urls
}
