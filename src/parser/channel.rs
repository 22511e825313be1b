use std::sync::LazyLock;

use regex::Regex;

use crate::parser::{distinct, Parser};

static CHANNEL_HANDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/@([\w\-.]+)").expect("channel handle pattern is valid")
});

pub fn channel_url(handle: &str) -> String {
    format!("https://www.youtube.com/@{handle}")
}

/// Extracts the `@handle` of every channel URL on a line.
#[derive(Debug)]
pub struct ChannelUrlParser;

impl Parser for ChannelUrlParser {
    fn parse(&self, input: &str) -> anyhow::Result<Vec<String>> {
        let handles = distinct(
            CHANNEL_HANDLE
                .captures_iter(input)
                .filter_map(|captures| captures.get(1))
                .map(|handle| handle.as_str().trim_end_matches('.').to_string())
                .filter(|handle| !handle.is_empty()),
        );
        if handles.is_empty() {
            anyhow::bail!("not a channel URL: {input}");
        }

        Ok(handles)
    }
}
