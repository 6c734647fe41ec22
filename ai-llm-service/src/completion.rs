//! Object-safe completion seam used by the chunker and the query processor.
//!
//! Callers hold an `Arc<dyn CompletionProvider>` so tests can swap in scripted
//! fakes and production code can bind to one profile of [`LlmServiceProfiles`].

use std::{future::Future, pin::Pin, sync::Arc};

use crate::{
    error_handler::AiLlmError,
    service_profiles::{LlmServiceProfiles, Profile},
};

/// Boxed future returned by [`CompletionProvider::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Produces a text completion for a prompt and optional system message.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> CompletionFuture<'a>;
}

/// Binds a shared [`LlmServiceProfiles`] to one generation profile.
#[derive(Clone)]
pub struct ProfileCompleter {
    svc: Arc<LlmServiceProfiles>,
    profile: Profile,
}

impl ProfileCompleter {
    pub fn new(svc: Arc<LlmServiceProfiles>, profile: Profile) -> Self {
        Self { svc, profile }
    }

    pub fn chat(svc: Arc<LlmServiceProfiles>) -> Self {
        Self::new(svc, Profile::Chat)
    }

    pub fn fast(svc: Arc<LlmServiceProfiles>) -> Self {
        Self::new(svc, Profile::Fast)
    }
}

impl CompletionProvider for ProfileCompleter {
    fn complete<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> CompletionFuture<'a> {
        Box::pin(async move { self.svc.generate(self.profile, prompt, system).await })
    }
}
