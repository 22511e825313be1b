use std::{
    collections::HashSet,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context as _;
use prometheus_client::registry::Registry;

use crate::{
    config::RunConfig,
    executor::Executor,
    item::Tally,
    metrics::{run::{RunLabels, RunMetrics}, MetricsHandler},
    parser::Parser,
    prerequisite::Prerequisite,
    report::Report,
    runner::Runner,
    server::RunServer,
    sink::fs::{write_atomic, FsSink},
    source::Source,
};

pub const METRICS_FILE: &str = "metrics.prom";

#[derive(Debug)]
pub struct RunSummary {
    pub tally: Tally,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// Prerequisite check, enumeration, throttled execution and reporting for one input list.
pub struct Pipeline<Q, E, P> {
    prerequisite: Q,
    executor: E,
    parser: P,
    config: RunConfig,
}

impl<Q, E, P> Pipeline<Q, E, P>
where
    Q: Prerequisite,
    E: Executor + Sync,
    P: Parser,
{
    pub fn new(prerequisite: Q, executor: E, parser: P, config: RunConfig) -> Self {
        Self {
            prerequisite,
            executor,
            parser,
            config,
        }
    }

    /// Fails only with [`RunError`](crate::error::RunError) before the first item, or
    /// when the reports cannot be written. Item failures are part of the summary.
    pub async fn run(self) -> anyhow::Result<RunSummary> {
        let Self { prerequisite, executor, parser, config } = self;

        let program = prerequisite.ensure().await?;
        tracing::debug!(program = %program.display(), "prerequisite satisfied");

        let source = Source::open(&config.input).await?;
        let sink = FsSink::open(&config.output).await?;
        let completed = if config.resume {
            sink.completed().await?
        } else {
            HashSet::new()
        };

        let registry = Arc::new(Mutex::new(Registry::default()));
        let metrics = {
            let mut registry = registry.lock().map_err(|_| anyhow::anyhow!("metrics registry mutex poisoned"))?;
            let run = RunLabels {
                command: config.command.to_string(),
                input: source.path().display().to_string(),
            };
            RunMetrics::register(&mut registry, run)
        };
        let server = match config.metrics_port {
            Some(port) => Some(RunServer::bind(port, MetricsHandler::new(registry.clone())).await?),
            None => None,
        };

        tracing::info!(
            input = %source.path().display(),
            output = %config.output.display(),
            delay_ms = config.throttle.min_delay().as_millis() as u64,
            limit = ?config.limit,
            "starting run"
        );

        let mut items = source.items(parser).exclude(completed).limit(config.limit);
        let runner = Runner::new(executor, sink.clone(), config.throttle).with_metrics(metrics.clone());
        let outcome = runner.run(&mut items).await;

        let skipped = items.skipped();
        metrics.skipped(&skipped);
        let tally = outcome.tally.with_skipped(skipped);

        Report::new(&sink.artifacts().await?).write(&config.output).await?;
        let encoded = MetricsHandler::new(registry).encode()?;
        write_atomic(&config.output.join(METRICS_FILE), encoded.as_bytes())
            .await
            .with_context(|| format!("failed to write {METRICS_FILE}"))?;

        if let Some(server) = server {
            server.stop().await;
        }

        tracing::info!(elapsed_ms = outcome.elapsed.as_millis() as u64, "{tally}");

        Ok(RunSummary {
            tally,
            output: config.output,
            elapsed: outcome.elapsed,
        })
    }
}
