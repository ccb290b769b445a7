use crate::client::core::ClassificationClient;
use crate::config::ClientConfig;
use crate::task::TaskCatalog;
use crate::transport::{HttpTransport, SandboxInvoker};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Config and catalog default to the environment and the built-in tasks.
pub struct ClassificationClientBuilder {
    config: Option<ClientConfig>,
    catalog: TaskCatalog,
    invoker: Option<Arc<dyn SandboxInvoker>>,
    timeout: Option<Duration>,
    model_override: Option<String>,
}

impl ClassificationClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            catalog: TaskCatalog::builtin(),
            invoker: None,
            timeout: None,
            model_override: None,
        }
    }

    /// Endpoint, credential and transport settings.
    /// Falls back to [`ClientConfig::from_env`] when not set.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn catalog(mut self, catalog: TaskCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the HTTP transport, primarily for testing with stubs.
    pub fn invoker(mut self, invoker: Arc<dyn SandboxInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Default per-request timeout; overrides the config value.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Point every task at the same model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn build(self) -> Result<ClassificationClient> {
        for def in self.catalog.iter() {
            def.validate()?;
        }

        let (invoker, config): (Arc<dyn SandboxInvoker>, Option<ClientConfig>) =
            match (self.invoker, self.config) {
                (Some(invoker), config) => (invoker, config),
                (None, config) => {
                    let config = match config {
                        Some(config) => config,
                        None => ClientConfig::from_env()?,
                    };
                    (Arc::new(HttpTransport::new(&config)?), Some(config))
                }
            };

        let default_timeout = self
            .timeout
            .or_else(|| config.as_ref().map(|c| c.timeout))
            .unwrap_or(crate::config::DEFAULT_TIMEOUT);

        let catalog = match self.model_override {
            Some(model) => self.catalog.with_model(&model),
            None => self.catalog,
        };

        Ok(ClassificationClient {
            invoker,
            catalog,
            default_timeout,
            instance_id: config.and_then(|c| c.instance_id),
        })
    }
}

impl Default for ClassificationClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
