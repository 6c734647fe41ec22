//! OpenAPI documents → retrievable chunks.
//!
//! - [`SpecDocument`] wraps one raw document and its `source_spec` identifier
//! - [`parser::parse_document`] yields endpoint, schema and security units
//! - [`Contextualizer`] asks an LLM for a situating preamble per unit
//! - [`ChunkBuilder::build_chunks`] assembles immutable [`Chunk`]s with
//!   deterministic ids

pub mod builder;
pub mod chunk;
pub mod config;
pub mod contextualizer;
pub mod document;
pub mod error;
pub mod parser;

pub use builder::{BuiltChunks, ChunkBuilder};
pub use chunk::{Chunk, ChunkKey, ChunkType};
pub use config::ChunkerConfig;
pub use contextualizer::{Contextualizer, Situated};
pub use document::{DocumentSummary, SpecDocument};
pub use error::{ChunkError, RejectedUnit};
