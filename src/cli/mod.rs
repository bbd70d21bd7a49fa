//! CLI support for ognl
//!
//! Provides programmatic access to the `ognl` command's functionality so it
//! can be embedded in other tools.

mod convert;
mod docs;
mod eval;

pub use convert::{json_to_value, value_to_json};
pub use docs::{get_doc_category, get_docs_overview, DocCategory};
pub use eval::{execute_eval, execute_source, EvalOptions, EvalResult, SourceOptions};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::OgnlError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The result holds a value with no JSON form
    #[error("Cannot render {0} as JSON")]
    Unrepresentable(String),

    #[error("Unknown category: '{0}'\nRun 'ognl docs' to see available categories.")]
    UnknownCategory(String),
}
