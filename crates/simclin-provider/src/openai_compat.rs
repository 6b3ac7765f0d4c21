//! Preset constructors for OpenAI-compatible chat endpoints.
//!
//! All of these speak the same `/chat/completions` wire format as OpenAI,
//! so each preset is just [`OpenAiProvider`] pointed at a different base URL.

use crate::OpenAiProvider;

/// DeepSeek (https://platform.deepseek.com/api-docs).
pub fn deepseek(api_key: impl Into<String>) -> OpenAiProvider {
    OpenAiProvider::new(api_key, "https://api.deepseek.com/v1")
}

/// Groq (https://console.groq.com/docs/api).
pub fn groq(api_key: impl Into<String>) -> OpenAiProvider {
    OpenAiProvider::new(api_key, "https://api.groq.com/openai/v1")
}

/// Local Ollama daemon on the default port.
pub fn ollama() -> OpenAiProvider {
    ollama_with_base("http://localhost:11434/v1")
}

/// Ollama on a non-default host/port.
pub fn ollama_with_base(base_url: impl Into<String>) -> OpenAiProvider {
    // Ollama ignores the key but the client always sends one
    OpenAiProvider::new("ollama", base_url)
}

/// OpenRouter multi-model gateway (https://openrouter.ai/docs).
pub fn openrouter(api_key: impl Into<String>) -> OpenAiProvider {
    OpenAiProvider::new(api_key, "https://openrouter.ai/api/v1")
}

/// Any other OpenAI-compatible endpoint.
pub fn custom(api_key: impl Into<String>, base_url: impl Into<String>) -> OpenAiProvider {
    OpenAiProvider::new(api_key, base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_point_at_the_right_hosts() {
        assert_eq!(deepseek("sk-test").api_base, "https://api.deepseek.com/v1");
        assert_eq!(groq("gsk-test").api_base, "https://api.groq.com/openai/v1");
        assert_eq!(openrouter("sk-or").api_base, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn ollama_needs_no_real_key() {
        assert_eq!(ollama().api_base, "http://localhost:11434/v1");
        assert_eq!(
            ollama_with_base("http://lab-gpu:11434/v1/").api_base,
            "http://lab-gpu:11434/v1"
        );
    }

    #[test]
    fn custom_trims_trailing_slash() {
        let provider = custom("key", "https://my-llm.example.com/v1/");
        assert_eq!(provider.api_base, "https://my-llm.example.com/v1");
    }
}
