use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};

use super::loader::{ContractLoader, LoadError};
use super::registry::ContractRegistry;
use crate::observability::MetricsRegistry;

/// Watch the registry file and broadcast recompiled registries.
///
/// A file that fails to load or compile never replaces the registry in
/// service; the previous snapshot keeps validating.
pub struct ContractWatcher {
    loader: ContractLoader,
    check_interval: Duration,
    last_version: Option<String>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ContractWatcher {
    pub fn new(loader: ContractLoader, check_interval: Duration) -> Self {
        ContractWatcher {
            loader,
            check_interval,
            last_version: None,
            metrics: None,
        }
    }

    /// Count reloads in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the initial registry and start polling for changes.
    pub fn start(
        mut self,
    ) -> (
        watch::Receiver<Arc<ContractRegistry>>,
        tokio::task::JoinHandle<()>,
    ) {
        let initial = match self.loader.load() {
            Ok(registry) => {
                self.last_version = Some(registry.version().to_string());
                info!(
                    version = registry.version(),
                    contracts = registry.len(),
                    "Loaded contract registry"
                );
                Arc::new(registry)
            }
            Err(e) => {
                error!(path = self.loader.path(), error = %e, "Failed to load contract registry");
                Arc::new(ContractRegistry::empty())
            }
        };

        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);

            loop {
                interval.tick().await;

                match self.check_for_updates(&tx) {
                    Ok(true) => info!("Contract registry reloaded"),
                    Ok(false) => {}
                    Err(e) => {
                        if let Some(metrics) = &self.metrics {
                            metrics.record_reload(false);
                        }
                        error!(error = %e, "Error checking for contract updates");
                    }
                }
            }
        });

        (rx, handle)
    }

    fn check_for_updates(
        &mut self,
        tx: &watch::Sender<Arc<ContractRegistry>>,
    ) -> Result<bool, LoadError> {
        let version = self.loader.peek_version()?;
        if self.last_version.as_deref() == Some(version.as_str()) {
            return Ok(false);
        }

        let registry = self.loader.load()?;

        info!(
            from = ?self.last_version,
            to = registry.version(),
            contracts = registry.len(),
            "Contract registry version changed"
        );

        self.last_version = Some(registry.version().to_string());
        if let Some(metrics) = &self.metrics {
            metrics.record_reload(true);
        }
        let _ = tx.send(Arc::new(registry));

        Ok(true)
    }
}
