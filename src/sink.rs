use std::path::PathBuf;

use crate::{
    error::ItemError,
    item::{ExecutionResult, WorkItem},
};

pub mod artifact;
pub mod fs;

/// Durable per-item storage. `persist` resolves only once the result is fully written.
pub trait Sink {
    fn persist(
        &self,
        item: &WorkItem,
        result: &ExecutionResult,
    ) -> impl Future<Output = Result<PathBuf, ItemError>> + Send;
}
