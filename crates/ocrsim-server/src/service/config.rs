//! Service configuration.

#[cfg(feature = "config")]
use clap::Args;
use ocrsim_core::ocr::{MockConfig, MockProvider, OcrConfig, OcrService};
use serde::{Deserialize, Serialize};

use crate::service::{Error, Result};

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Request orchestration settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Simulated recognition backend settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub mock: MockConfig,
}

impl ServiceConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        self.mock.validate().map_err(Error::config)
    }

    /// Creates the recognition service backed by the simulated provider.
    pub fn create_ocr_service(&self) -> Result<OcrService> {
        self.validate()?;

        let provider = MockProvider::new(self.mock.clone());
        Ok(OcrService::from_config(&self.ocr, provider))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_config_creates_service() -> anyhow::Result<()> {
        let service = ServiceConfig::default().create_ocr_service()?;
        assert_eq!(service.item_timeout(), Some(Duration::from_secs(10)));
        Ok(())
    }

    #[test]
    fn reject_empty_latency_range() {
        let mut config = ServiceConfig::default();
        config.mock.min_latency_ms = 500;
        config.mock.max_latency_ms = 500;

        let error = config
            .create_ocr_service()
            .expect_err("empty range is rejected");
        assert!(error.message().contains("500..500"));
    }
}
