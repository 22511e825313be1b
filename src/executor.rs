use crate::item::WorkItem;

pub mod channel;
pub mod command;
pub mod transcript;

/// The external operation applied to each item. Resolves to the payload to persist.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    fn execute(&self, item: WorkItem) -> impl Future<Output = anyhow::Result<String>> + Send;
}
