use std::{
    sync::atomic::AtomicU64,
    time::{SystemTime, UNIX_EPOCH},
};

use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder},
    metrics::{counter::Counter, family::Family, gauge::Gauge, info::Info},
    registry::Registry,
};
use strum::Display as StrumDisplay;

use crate::item::{ItemOutcome, Skipped};

/// Names the run the metrics belong to.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RunLabels {
    pub command: String,
    pub input: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SkipLabels {
    pub reason: SkipReason,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    Malformed,
    Duplicate,
    Completed,
}

impl EncodeLabelValue for Outcome {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        self.to_string().encode(encoder)
    }
}

impl EncodeLabelValue for SkipReason {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        self.to_string().encode(encoder)
    }
}

#[derive(Clone, Debug)]
pub struct RunMetrics {
    items: Family<OutcomeLabels, Counter>,
    skipped: Family<SkipLabels, Counter>,
    last_item: Gauge<f64, AtomicU64>,
}

impl RunMetrics {
    pub fn register(registry: &mut Registry, run: RunLabels) -> Self {
        let metrics = Self {
            items: Family::default(),
            skipped: Family::default(),
            last_item: Gauge::default(),
        };

        registry.register("ratebatch_run", "Command and input of this run", Info::new(run));
        registry.register("ratebatch_items", "Items processed by outcome", metrics.items.clone());
        registry.register("ratebatch_entries_skipped", "Source entries passed over by reason", metrics.skipped.clone());
        registry.register(
            "ratebatch_last_item_timestamp_seconds",
            "Unix time the last item finished processing",
            metrics.last_item.clone(),
        );

        metrics
    }

    pub fn observe(&self, outcome: &ItemOutcome) {
        let outcome = match outcome {
            ItemOutcome::Persisted { .. } => Outcome::Succeeded,
            ItemOutcome::Failed { .. } => Outcome::Failed,
        };
        self.items.get_or_create(&OutcomeLabels { outcome }).inc();

        if let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) {
            self.last_item.set(now.as_secs_f64());
        }
    }

    pub fn skipped(&self, skipped: &Skipped) {
        for (reason, count) in [
            (SkipReason::Malformed, skipped.malformed),
            (SkipReason::Duplicate, skipped.duplicate),
            (SkipReason::Completed, skipped.completed),
        ] {
            if count > 0 {
                self.skipped.get_or_create(&SkipLabels { reason }).inc_by(count as u64);
            }
        }
    }
}
