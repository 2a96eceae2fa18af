use std::sync::Arc;

use super::Application;
use crate::config::ClientConfig;
use crate::core::coordinator::SubmissionCoordinator;
use crate::core::token::{TokenGenerator, UuidTokenGenerator};
use crate::transport::Transport;

/// Builder for configuring an [`Application`].
pub struct ApplicationBuilder {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenGenerator>,
    config: ClientConfig,
}

impl ApplicationBuilder {
    pub(super) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            tokens: Arc::new(UuidTokenGenerator),
            config: ClientConfig::default(),
        }
    }

    /// Replace the correlation token source (deterministic tokens in tests).
    pub fn token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Application {
        Application {
            coordinator: SubmissionCoordinator::new(self.transport.clone(), self.tokens),
            transport: self.transport,
            config: self.config,
        }
    }
}
