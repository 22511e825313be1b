use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest as _, Sha256};
use strum::Display as StrumDisplay;

use crate::item::{ExecutionResult, WorkItem};

pub const SUCCESS_EXTENSION: &str = "txt";
pub const FAILURE_EXTENSION: &str = "failed";

const SEPARATOR_WIDTH: usize = 80;
const MAX_NAME_LEN: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, StrumDisplay)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Success => SUCCESS_EXTENSION,
            Self::Failed => FAILURE_EXTENSION,
        }
    }
}

/// A persisted per-item file, identified by the header it starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub source: String,
    pub status: Status,
    pub error: Option<String>,
    pub path: PathBuf,
}

pub fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// Filesystem-safe name derived from an identifier.
///
/// Identifiers that had to be altered get a digest suffix so that distinct
/// identifiers never share a file.
pub fn file_stem(id: &str) -> String {
    let sanitized = id
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .take(MAX_NAME_LEN)
        .collect::<String>();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized == id && !sanitized.is_empty() {
        return sanitized.to_string();
    }

    let digest = format!("{:x}", Sha256::digest(id.as_bytes()));
    format!("{sanitized}-{}", &digest[..8])
}

pub fn render(item: &WorkItem, result: &ExecutionResult) -> String {
    let mut contents = format!("Item: {}\nSource: {}\n", item.id, single_line(&item.line));
    match result {
        ExecutionResult::Success { payload } => {
            contents.push_str(&format!("Status: {}\n{}\n\n", Status::Success, separator()));
            contents.push_str(payload);
        },
        ExecutionResult::Failure { reason } => {
            contents.push_str(&format!("Status: {}\nError: {}\n{}\n", Status::Failed, single_line(reason), separator()));
        },
    }

    contents
}

/// Splits an artifact into its header and payload. `None` for files without a valid header.
pub fn parse(contents: &str, path: PathBuf) -> Option<(Artifact, &str)> {
    let (header, body) = contents.split_once(&format!("\n{}\n", separator()))?;

    let mut id = None;
    let mut source = String::new();
    let mut status = None;
    let mut error = None;
    for line in header.lines() {
        match line.split_once(": ") {
            Some(("Item", value)) => id = Some(value.to_string()),
            Some(("Source", value)) => source = value.to_string(),
            Some(("Status", "success")) => status = Some(Status::Success),
            Some(("Status", "failed")) => status = Some(Status::Failed),
            Some(("Error", value)) => error = Some(value.to_string()),
            _ => {},
        }
    }

    let artifact = Artifact {
        id: id?,
        source,
        status: status?,
        error,
        path,
    };
    let payload = body.strip_prefix('\n').unwrap_or(body);

    Some((artifact, payload))
}

fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join(" | ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::{
        item::{ExecutionResult, WorkItem},
        sink::artifact::{file_stem, parse, render, Status},
    };

    fn item(id: &str) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            index: 1,
            line: format!("https://youtu.be/{id}"),
        }
    }

    #[test]
    fn file_stem_keeps_safe_ids() {
        assert_eq!(file_stem("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(file_stem("Some.Channel-1"), "Some.Channel-1");
    }

    #[test]
    fn file_stem_disambiguates_sanitized_ids() {
        let slash = file_stem("a/b");
        let underscore = file_stem("a_b");

        assert!(slash.starts_with("a_b-"));
        assert_eq!(underscore, "a_b");
        assert_ne!(slash, underscore);
        assert!(file_stem("..").starts_with('-'));
        assert!(!file_stem(&"x".repeat(300)).contains('/'));
    }

    #[test]
    fn parse_success() {
        let contents = render(&item("abc"), &ExecutionResult::Success { payload: "line one\nline two".to_string() });
        let (artifact, payload) = parse(&contents, PathBuf::from("abc.txt")).unwrap();

        assert_eq!(artifact.id, "abc");
        assert_eq!(artifact.source, "https://youtu.be/abc");
        assert_eq!(artifact.status, Status::Success);
        assert_eq!(artifact.error, None);
        assert_eq!(payload, "line one\nline two");
    }

    #[test]
    fn parse_failure() {
        let contents = render(&item("abc"), &ExecutionResult::Failure { reason: "exited 1:\n  quota exceeded\n".to_string() });
        let (artifact, payload) = parse(&contents, PathBuf::from("abc.failed")).unwrap();

        assert_eq!(artifact.status, Status::Failed);
        assert_eq!(artifact.error.as_deref(), Some("exited 1: | quota exceeded"));
        assert_eq!(payload, "");
    }

    #[test]
    fn parse_rejects_foreign_files() {
        assert!(parse("just some notes\n", PathBuf::from("notes.txt")).is_none());
    }
}
