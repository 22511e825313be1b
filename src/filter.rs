use std::{collections::HashSet, fmt::Write as _, path::Path};

use anyhow::Context as _;
use regex::Regex;
use serde::Serialize;

use crate::sink::{
    artifact::{separator, Status},
    fs::{write_atomic, FsSink},
};

pub const JSON_RESULTS: &str = "filtered.json";
pub const TEXT_RESULTS: &str = "filtered.txt";

const JSON_KEYWORDS: usize = 10;
const TEXT_KEYWORDS: usize = 5;

/// Scores payloads by whole-word, case-insensitive keyword occurrences.
#[derive(Debug)]
pub struct KeywordFilter {
    keywords: Vec<(String, Regex)>,
    min_score: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub source: String,
    pub artifact: String,
    pub score: usize,
    pub top_keywords: Vec<(String, usize)>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I, min_score: usize) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty() && seen.insert(keyword.clone()))
            .map(|keyword| {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword)))
                    .with_context(|| format!("invalid keyword {keyword:?}"))?;
                Ok((keyword, pattern))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if keywords.is_empty() {
            anyhow::bail!("no keywords given");
        }

        Ok(Self { keywords, min_score })
    }

    /// Total occurrences and the per-keyword counts, most frequent first.
    pub fn score(&self, text: &str) -> (usize, Vec<(String, usize)>) {
        let mut matches = self
            .keywords
            .iter()
            .map(|(keyword, pattern)| (keyword.clone(), pattern.find_iter(text).count()))
            .filter(|(_, count)| *count > 0)
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        (matches.iter().map(|(_, count)| count).sum(), matches)
    }

    /// Successful artifacts scoring at least `min_score`, highest score first.
    pub async fn apply(&self, sink: &FsSink) -> anyhow::Result<Vec<Match>> {
        let mut results = Vec::new();
        for artifact in sink.artifacts().await? {
            if artifact.status != Status::Success {
                continue;
            }

            let payload = sink.payload(&artifact).await?;
            let (score, mut top_keywords) = self.score(&payload);
            tracing::debug!(item = %artifact.id, score, "scored");
            if score < self.min_score {
                continue;
            }

            top_keywords.truncate(JSON_KEYWORDS);
            results.push(Match {
                artifact: artifact.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default(),
                id: artifact.id,
                source: artifact.source,
                score,
                top_keywords,
            });
        }

        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        Ok(results)
    }
}

pub fn load_keywords(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn render_text(matches: &[Match]) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{}\nMATCHING ITEMS: {}\n{}\n", separator(), matches.len(), separator());

    for (n, found) in matches.iter().enumerate() {
        let keywords = found
            .top_keywords
            .iter()
            .take(TEXT_KEYWORDS)
            .map(|(keyword, count)| format!("{keyword}({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(text, "{}. ITEM: {}", n + 1, found.id);
        let _ = writeln!(text, "   Source: {}", found.source);
        let _ = writeln!(text, "   Score: {}", found.score);
        let _ = writeln!(text, "   Top Keywords: {keywords}\n");
    }

    text
}

pub async fn write(matches: &[Match], output: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(matches)?;
    write_atomic(&output.join(JSON_RESULTS), json.as_bytes())
        .await
        .with_context(|| format!("failed to write {JSON_RESULTS}"))?;
    write_atomic(&output.join(TEXT_RESULTS), render_text(matches).as_bytes())
        .await
        .with_context(|| format!("failed to write {TEXT_RESULTS}"))?;

    Ok(())
}
