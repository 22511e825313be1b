use std::{
    collections::{HashSet, VecDeque},
    iter::Enumerate,
    path::{Path, PathBuf},
    slice::Iter,
};

use crate::{
    error::{ItemError, RunError},
    item::{Skipped, WorkItem},
    parser::Parser,
};

/// Input list read into memory. Reopening the same file yields the same sequence.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    lines: Vec<String>,
}

impl Source {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RunError> {
        let path = path.as_ref().to_path_buf();
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|source| RunError::SourceUnavailable { path: path.clone(), source })?;
        let lines = String::from_utf8_lossy(&contents).lines().map(str::to_string).collect();

        Ok(Self { path, lines })
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: PathBuf::new(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items<P>(&self, parser: P) -> Enumeration<'_, P>
    where
        P: Parser,
    {
        Enumeration {
            lines: self.lines.iter().enumerate(),
            parser,
            limit: None,
            completed: HashSet::new(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
            accepted: 0,
            skipped: Skipped::default(),
        }
    }
}

/// Lazy sequence of work items over a [`Source`].
///
/// Blank lines are ignored. A line may yield several items, or none when the parser
/// finds nothing to process on it. Lines the parser rejects and repeated identifiers
/// are skipped and counted, never fatal.
pub struct Enumeration<'a, P> {
    lines: Enumerate<Iter<'a, String>>,
    parser: P,
    limit: Option<usize>,
    completed: HashSet<String>,
    /// Identifiers parsed from the current line, with its number.
    pending: VecDeque<(usize, &'a str, String)>,
    seen: HashSet<String>,
    accepted: usize,
    skipped: Skipped,
}

impl<P> Enumeration<'_, P> {
    /// Stops after the first `limit` accepted items.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Passes over identifiers that already have a persisted result.
    pub fn exclude(mut self, completed: HashSet<String>) -> Self {
        self.completed = completed;
        self
    }

    pub fn skipped(&self) -> Skipped {
        self.skipped
    }
}

impl<'a, P> Enumeration<'a, P>
where
    P: Parser,
{
    /// Parses the next non-blank line into `pending`. `None` once the source is exhausted.
    fn read_line(&mut self) -> Option<()> {
        loop {
            let (number, raw) = self.lines.next()?;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match self.parser.parse(line) {
                Ok(ids) => self.pending.extend(ids.into_iter().map(|id| (number + 1, line, id))),
                Err(err) => {
                    let err = ItemError::MalformedEntry { line: number + 1, reason: format!("{err:#}") };
                    tracing::warn!("skipping {err}");
                    self.skipped.malformed += 1;
                },
            }

            return Some(());
        }
    }
}

impl<P> Iterator for Enumeration<'_, P>
where
    P: Parser,
{
    type Item = WorkItem;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.limit.is_some_and(|limit| self.accepted >= limit) {
            let Some((number, line, id)) = self.pending.pop_front() else {
                self.read_line()?;
                continue;
            };

            if !self.seen.insert(id.clone()) {
                tracing::debug!(item = %id, line = number, "skipping duplicate entry");
                self.skipped.duplicate += 1;
                continue;
            }

            if self.completed.contains(&id) {
                tracing::debug!(item = %id, "already completed");
                self.skipped.completed += 1;
                continue;
            }

            self.accepted += 1;

            return Some(WorkItem {
                id,
                index: self.accepted,
                line: line.to_string(),
            });
        }

        None
    }
}
