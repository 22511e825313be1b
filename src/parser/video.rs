use std::sync::LazyLock;

use regex::Regex;

use crate::parser::{distinct, Parser};

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?(?:[^#\s]*&)?v=|youtube\.com/shorts/|youtu\.be/)([\w-]+)")
        .expect("video id pattern is valid")
});

pub fn video_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Extracts the ids of every watch, shorts or short-link URL on a line.
#[derive(Debug)]
pub struct VideoUrlParser;

impl Parser for VideoUrlParser {
    fn parse(&self, input: &str) -> anyhow::Result<Vec<String>> {
        let ids = distinct(VIDEO_ID.captures_iter(input).filter_map(|captures| captures.get(1)).map(|id| id.as_str().to_string()));
        if ids.is_empty() {
            anyhow::bail!("not a video URL: {input}");
        }

        Ok(ids)
    }
}
