use std::sync::{Arc, Mutex};

use prometheus_client::{encoding::text, registry::Registry};

pub mod run;

#[cfg_attr(test, mockall::automock)]
pub trait Handler {
    fn handle(&self) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Encodes the shared registry in OpenMetrics text format.
#[derive(Clone, Debug)]
pub struct MetricsHandler {
    registry: Arc<Mutex<Registry>>,
}

impl MetricsHandler {
    pub fn new(registry: Arc<Mutex<Registry>>) -> Self {
        Self { registry }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = String::new();
        {
            tracing::debug!("encoding metrics");
            let registry = self.registry.lock().map_err(|_| anyhow::anyhow!("metrics registry mutex poisoned"))?;
            text::encode(&mut buffer, &registry)?;
        }

        Ok(buffer)
    }
}

impl Handler for MetricsHandler {
    #[tracing::instrument(skip_all)]
    async fn handle(&self) -> anyhow::Result<String> {
        self.encode()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use prometheus_client::registry::Registry;

    use crate::metrics::{Handler, MetricsHandler};

    #[tokio::test]
    async fn handle() {
        let metrics_handler = MetricsHandler::new(Arc::new(Mutex::new(Registry::default())));
        let result = metrics_handler.handle().await.unwrap();

        assert_eq!(result, "# EOF\n")
    }
}
