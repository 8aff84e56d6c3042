use std::sync::Arc;

use super::{base::Provider, configs::OpenAiProviderConfig, openai::OpenAiProvider};
use crate::errors::ProviderResult;

pub fn get_provider(config: OpenAiProviderConfig) -> ProviderResult<Arc<dyn Provider>> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}
