use std::sync::Arc;

use iris::providers::base::Provider;
use iris::providers::configs::ProviderKind;

/// Shared application state
///
/// Providers are built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub doubao: Arc<dyn Provider>,
    pub qwen: Arc<dyn Provider>,
    pub mode: String,
}

impl AppState {
    pub fn new<S: Into<String>>(
        doubao: Arc<dyn Provider>,
        qwen: Arc<dyn Provider>,
        mode: S,
    ) -> Self {
        Self {
            doubao,
            qwen,
            mode: mode.into(),
        }
    }

    pub fn provider(&self, kind: ProviderKind) -> Arc<dyn Provider> {
        match kind {
            ProviderKind::Doubao => self.doubao.clone(),
            ProviderKind::Qwen => self.qwen.clone(),
        }
    }
}
