/// The hosted models the relay can forward to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Doubao,
    Qwen,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "doubao",
            ProviderKind::Qwen => "qwen",
        }
    }

    pub fn default_host(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "https://ark.cn-beijing.volces.com/api/v3",
            ProviderKind::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Doubao => "ep-20241223220835-p7wpl",
            ProviderKind::Qwen => "qwen-vl-max-latest",
        }
    }
}

/// Connection settings for an OpenAI-compatible chat completion endpoint.
///
/// `host` is the API base, `/chat/completions` is appended to it.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn for_kind<S: Into<String>>(kind: ProviderKind, api_key: S) -> Self {
        Self {
            host: kind.default_host().to_string(),
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults() {
        let config = OpenAiProviderConfig::for_kind(ProviderKind::Qwen, "key");
        assert_eq!(config.host, "https://dashscope.aliyuncs.com/compatible-mode/v1");
        assert_eq!(config.model, "qwen-vl-max-latest");
        assert_eq!(config.temperature, None);
        assert_eq!(ProviderKind::Doubao.name(), "doubao");
    }
}
