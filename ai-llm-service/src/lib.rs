pub mod completion;
pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use completion::{CompletionFuture, CompletionProvider, ProfileCompleter};
pub use error_handler::AiLlmError;
pub use service_profiles::{LlmServiceProfiles, Profile};
