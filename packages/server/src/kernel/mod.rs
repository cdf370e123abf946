//! Kernel module - the solve pipeline and its collaborators.

pub mod extract;
pub mod prompt;
pub mod search;
pub mod solver;

pub use extract::{
    extract_citations, extract_citations_with, extract_final_answer, extract_identifiers,
    ExtractError, QuoteStrategy, DEFAULT_QUOTE_PRECEDENCE,
};
pub use search::{
    format_results, format_search, HttpKnowledgeBase, KnowledgeSearch, SearchResult,
    ZoningSearchArgs, ZoningSearchTool,
};
pub use solver::{solve, SolveError, SolveResult};
