use std::{fmt::Display, path::PathBuf};

/// One unit of input, created by the enumerator and consumed once by the runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub id: String,
    /// 1-based position among the accepted entries of the source.
    pub index: usize,
    /// Trimmed source line the identifier was parsed from.
    pub line: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    Success { payload: String },
    Failure { reason: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Terminal state of an item after the runner is done with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Persisted { path: PathBuf },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub outcome: ItemOutcome,
}

/// Entries the enumerator passed over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Skipped {
    pub malformed: usize,
    pub duplicate: usize,
    pub completed: usize,
}

impl Skipped {
    /// Entries that were rejected, as opposed to passed over because they are already done.
    pub fn rejected(&self) -> usize {
        self.malformed + self.duplicate
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub completed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Persisted { .. } => self.succeeded += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn with_skipped(mut self, skipped: Skipped) -> Self {
        self.skipped = skipped.rejected();
        self.completed = skipped.completed;
        self
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn total(&self) -> usize {
        self.processed() + self.skipped
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} items: {} succeeded, {} failed, {} skipped",
            self.total(),
            self.succeeded,
            self.failed,
            self.skipped,
        )?;
        if self.completed > 0 {
            write!(f, " ({} already completed)", self.completed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::item::{ItemOutcome, Skipped, Tally};

    #[test]
    fn display() {
        let mut tally = Tally::default();
        tally.record(&ItemOutcome::Persisted { path: "a.txt".into() });
        tally.record(&ItemOutcome::Persisted { path: "c.txt".into() });
        tally.record(&ItemOutcome::Failed { reason: "boom".to_string() });

        assert_eq!(tally.to_string(), "3 items: 2 succeeded, 1 failed, 0 skipped");
    }

    #[test]
    fn display_with_skipped() {
        let tally = Tally { succeeded: 1, ..Default::default() }
            .with_skipped(Skipped { malformed: 1, duplicate: 1, completed: 4 });

        assert_eq!(tally.total(), 3);
        assert_eq!(tally.to_string(), "3 items: 1 succeeded, 0 failed, 2 skipped (4 already completed)");
    }
}
