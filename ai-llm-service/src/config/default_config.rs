//! Default model profiles loaded strictly from environment variables.
//!
//! Three roles are used by the pipeline:
//!
//! - **Chat**      → answers user questions from retrieved context
//! - **Fast**      → chunk contextualization and query rewriting
//! - **Embedding** → chunk and query embeddings
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = `ollama` (default) or `openai`
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout for chat/fast (u64)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = chat model (mandatory)
//! - `OLLAMA_MODEL_FAST`           = fast model (falls back to `OLLAMA_MODEL`)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//!
//! OpenAI:
//! - `OPENAI_API_KEY`          = API key (mandatory)
//! - `OPENAI_URL`              = base URL (default `https://api.openai.com`)
//! - `OPENAI_MODEL`            = chat model (default `gpt-4o`)
//! - `OPENAI_MODEL_FAST`       = fast model (default `gpt-4o-mini`)
//! - `OPENAI_EMBEDDING_MODEL`  = embedding model (default `text-embedding-3-small`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// The three resolved profiles, in `(chat, fast, embedding)` order.
#[derive(Debug, Clone)]
pub struct DefaultProfiles {
    pub chat: LlmModelConfig,
    pub fast: LlmModelConfig,
    pub embedding: LlmModelConfig,
}

/// Resolves all profiles for the provider named by `LLM_KIND`.
///
/// # Errors
/// Returns [`ConfigError`] for a missing/invalid variable or unknown provider.
pub fn profiles_from_env() -> Result<DefaultProfiles, AiLlmError> {
    let provider = match opt_env("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Ollama,
    };
    let profiles = match provider {
        LlmProvider::Ollama => DefaultProfiles {
            chat: config_ollama_chat()?,
            fast: config_ollama_fast()?,
            embedding: config_ollama_embedding()?,
        },
        LlmProvider::OpenAI => DefaultProfiles {
            chat: config_openai_chat()?,
            fast: config_openai_fast()?,
            embedding: config_openai_embedding()?,
        },
    };
    profiles.chat.validate()?;
    profiles.fast.validate()?;
    profiles.embedding.validate()?;
    Ok(profiles)
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Chat profile for Ollama.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(120)`
pub fn config_ollama_chat() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(120)),
    })
}

/// Fast profile for Ollama; `OLLAMA_MODEL_FAST` falls back to `OLLAMA_MODEL`.
pub fn config_ollama_fast() -> Result<LlmModelConfig, AiLlmError> {
    let model = match opt_env("OLLAMA_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OLLAMA_MODEL")?,
    };
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: Some(env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(160)),
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    })
}

/// Embedding profile for Ollama (`EMBEDDING_MODEL` is required).
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}

fn openai_base() -> Result<(String, String), AiLlmError> {
    let key = must_env("OPENAI_API_KEY")?;
    let url = opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok((url, key))
}

/// Chat profile for OpenAI (`OPENAI_MODEL`, default `gpt-4o`).
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    let (endpoint, key) = openai_base()?;
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".into()),
        endpoint,
        api_key: Some(key),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    })
}

/// Fast profile for OpenAI (`OPENAI_MODEL_FAST`, default `gpt-4o-mini`).
pub fn config_openai_fast() -> Result<LlmModelConfig, AiLlmError> {
    let (endpoint, key) = openai_base()?;
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_MODEL_FAST").unwrap_or_else(|| "gpt-4o-mini".into()),
        endpoint,
        api_key: Some(key),
        max_tokens: Some(env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(160)),
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(30)),
    })
}

/// Embedding profile for OpenAI (`OPENAI_EMBEDDING_MODEL`, default `text-embedding-3-small`).
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let (endpoint, key) = openai_base()?;
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|| "text-embedding-3-small".into()),
        endpoint,
        api_key: Some(key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}
