//! Application state and dependency injection.

use ocrsim_core::ocr::OcrService;

use crate::service::{Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    ocr: OcrService,
}

impl ServiceState {
    /// Creates application state around an already configured service.
    pub fn new(ocr: OcrService) -> Self {
        Self { ocr }
    }

    /// Initializes application state from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let service_state = Self {
            ocr: config.create_ocr_service()?,
        };

        Ok(service_state)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(ocr: OcrService);
