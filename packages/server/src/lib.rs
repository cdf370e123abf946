// Legal Clerk RAG Agent - API Core
//
// This crate answers natural-language zoning questions by steering a hosted
// language model over a harness-provided knowledge-base search endpoint,
// then post-processing the model transcript into a structured answer with
// citations. Exposed as a single POST /solve endpoint.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
