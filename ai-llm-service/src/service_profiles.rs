//! Shared LLM service with three active profiles: `chat`, `fast`, and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Backends are built eagerly so a bad profile fails at startup, not mid-ingest.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//! let ctx = svc.generate_fast("Situate this chunk", None).await?;
//! let emb = svc.embed("GET /candidates").await?;
//! println!("{ctx} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use tracing::info;

use crate::{
    config::{
        default_config::profiles_from_env, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Which generation profile a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Answer generation.
    Chat,
    /// Short, deterministic calls: contextualization and query rewriting.
    Fast,
}

/// Concrete provider client bound to one profile.
enum Backend {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
}

impl Backend {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        Ok(match cfg.provider {
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => Backend::OpenAi(OpenAiService::new(cfg.clone())?),
        })
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match self {
            Backend::Ollama(cli) => cli.generate(prompt, system).await,
            Backend::OpenAi(cli) => cli.generate(prompt, system).await,
        }
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        match self {
            Backend::Ollama(cli) => cli.embeddings_batch(inputs).await,
            Backend::OpenAi(cli) => cli.embeddings_batch(inputs).await,
        }
    }
}

/// Shared service that manages the **chat**, **fast**, and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat_cfg: LlmModelConfig,
    fast_cfg: LlmModelConfig,
    embedding_cfg: LlmModelConfig,

    chat: Backend,
    fast: Backend,
    embedding: Backend,
}

impl LlmServiceProfiles {
    /// Creates a new service from three explicit profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if any profile fails validation or its client cannot be built.
    pub fn new(
        chat: LlmModelConfig,
        fast: LlmModelConfig,
        embedding: LlmModelConfig,
    ) -> Result<Self, AiLlmError> {
        let svc = Self {
            chat: Backend::build(&chat)?,
            fast: Backend::build(&fast)?,
            embedding: Backend::build(&embedding)?,
            chat_cfg: chat,
            fast_cfg: fast,
            embedding_cfg: embedding,
        };
        info!(
            chat = %svc.chat_cfg.model,
            fast = %svc.fast_cfg.model,
            embedding = %svc.embedding_cfg.model,
            "LLM profiles ready"
        );
        Ok(svc)
    }

    /// Builds all profiles from environment variables (see `config::default_config`).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let p = profiles_from_env()?;
        Self::new(p.chat, p.fast, p.embedding)
    }

    /// Generates text using the **chat** profile.
    pub async fn generate_chat(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        self.chat.generate(prompt, system).await
    }

    /// Generates text using the **fast** profile.
    pub async fn generate_fast(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        self.fast.generate(prompt, system).await
    }

    /// Generates text with the given profile.
    pub async fn generate(
        &self,
        profile: Profile,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        match profile {
            Profile::Chat => self.generate_chat(prompt, system).await,
            Profile::Fast => self.generate_fast(prompt, system).await,
        }
    }

    /// Computes one embedding using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let mut out = self.embed_batch(&[input.to_string()]).await?;
        out.pop().ok_or_else(|| {
            ProviderError::new(
                provider_tag(self.embedding_cfg.provider),
                ProviderErrorKind::Decode("no embedding returned".into()),
            )
            .into()
        })
    }

    /// Computes embeddings for many inputs; output order follows input order.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        self.embedding.embed_batch(inputs).await
    }

    /// Returns references to the current profiles `(chat, fast, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, &LlmModelConfig) {
        (&self.chat_cfg, &self.fast_cfg, &self.embedding_cfg)
    }
}

fn provider_tag(p: LlmProvider) -> Provider {
    match p {
        LlmProvider::Ollama => Provider::Ollama,
        LlmProvider::OpenAI => Provider::OpenAI,
    }
}
