use std::time::Duration;

use tokio::time::Instant;

use crate::{
    error::ItemError,
    executor::Executor,
    item::{ExecutionResult, ItemOutcome, ItemRecord, Tally, WorkItem},
    metrics::run::RunMetrics,
    sink::Sink,
    throttle::ThrottlePolicy,
};

#[derive(Debug)]
pub struct RunOutcome {
    pub tally: Tally,
    pub records: Vec<ItemRecord>,
    pub elapsed: Duration,
}

/// Feeds items one at a time through the executor into the sink, pausing between items.
///
/// A failing item never stops the run. Each result is persisted before the next item
/// starts.
#[derive(Debug)]
pub struct Runner<E, S> {
    executor: E,
    sink: S,
    throttle: ThrottlePolicy,
    metrics: Option<RunMetrics>,
}

impl<E, S> Runner<E, S> {
    pub fn new(executor: E, sink: S, throttle: ThrottlePolicy) -> Self {
        Self {
            executor,
            sink,
            throttle,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: RunMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<E, S> Runner<E, S>
where
    E: Executor + Sync,
    S: Sink + Sync,
{
    pub async fn run<I>(&self, items: I) -> RunOutcome
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let started = Instant::now();
        let mut tally = Tally::default();
        let mut records = Vec::new();

        for (position, item) in items.into_iter().enumerate() {
            // pausing before every item but the first leaves no trailing delay
            if position > 0 {
                self.throttle.wait().await;
            }

            let record = self.process(item).await;
            tally.record(&record.outcome);
            if let Some(metrics) = &self.metrics {
                metrics.observe(&record.outcome);
            }
            records.push(record);
        }

        RunOutcome {
            tally,
            records,
            elapsed: started.elapsed(),
        }
    }

    #[tracing::instrument(skip_all, fields(item = %item.id, index = item.index))]
    async fn process(&self, item: WorkItem) -> ItemRecord {
        tracing::info!("processing");

        let result = match self.executor.execute(item.clone()).await {
            Ok(payload) => ExecutionResult::Success { payload },
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::warn!("{}", ItemError::OperationFailed(reason.clone()));
                ExecutionResult::Failure { reason }
            },
        };

        let outcome = match (self.sink.persist(&item, &result).await, result) {
            (Ok(path), ExecutionResult::Success { .. }) => {
                tracing::info!(path = %path.display(), "persisted");
                ItemOutcome::Persisted { path }
            },
            (Ok(path), ExecutionResult::Failure { reason }) => {
                tracing::debug!(path = %path.display(), "recorded failure");
                ItemOutcome::Failed { reason }
            },
            (Err(err), _) => {
                tracing::error!("{err}");
                ItemOutcome::Failed { reason: err.to_string() }
            },
        };

        ItemRecord { id: item.id, outcome }
    }
}
