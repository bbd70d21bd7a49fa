//! `ognl eval` and `ognl source`

use std::sync::Arc;

use log::debug;

use crate::{
    config::Config,
    context::Context,
    parser,
    runtime::Runtime,
    source::{self, Compiled},
    value::Value,
};

use super::{json_to_value, value_to_json, CliError};

/// Options for evaluating an expression
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON root object (null if not provided)
    pub input: Option<String>,
    /// JSON value to assign through the expression instead of reading it
    pub set: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Short-circuit chains that start from null
    pub short_circuit: bool,
    /// Record and return the evaluation trace
    pub trace: bool,
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    /// Expression syntax is valid (syntax_only mode)
    SyntaxValid,
    /// The expression's value, or the updated root after an assignment
    Success {
        output: serde_json::Value,
        trace: Option<String>,
    },
}

/// Options for rendering an expression as accessor source
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub expression: String,
    /// JSON sample root the source is generated against
    pub input: Option<String>,
}

fn parse_root(input: Option<&str>) -> Result<Value, CliError> {
    match input {
        Some(text) => Ok(json_to_value(serde_json::from_str(text)?)),
        None => Ok(Value::Null),
    }
}

/// Execute an expression against a JSON root
///
/// # Examples
///
/// ```
/// use ognl::cli::{execute_eval, EvalOptions, EvalResult};
///
/// let options = EvalOptions {
///     expression: "items.{? #this > 1 }".to_string(),
///     input: Some(r#"{"items": [1, 2, 3]}"#.to_string()),
///     set: None,
///     syntax_only: false,
///     short_circuit: true,
///     trace: false,
/// };
/// match execute_eval(&options).unwrap() {
///     EvalResult::Success { output, .. } => assert_eq!(output.to_string(), "[2,3]"),
///     EvalResult::SyntaxValid => unreachable!(),
/// }
/// ```
pub fn execute_eval(options: &EvalOptions) -> Result<EvalResult, CliError> {
    let expression = parser::parse(&options.expression)?;
    if options.syntax_only {
        return Ok(EvalResult::SyntaxValid);
    }

    let config = Config::from_env()
        .with_short_circuit(options.short_circuit)
        .with_tracing(options.trace);
    let runtime = Arc::new(Runtime::builder().config(config).build());
    let root = parse_root(options.input.as_deref())?;
    let mut ctx = Context::new(runtime, root.clone());

    let result = match &options.set {
        Some(text) => {
            let value = json_to_value(serde_json::from_str(text)?);
            expression
                .set_value(&mut ctx, &root, value)
                .map(|()| ctx.root().clone())
        }
        None => expression.get_value(&mut ctx, &root),
    };
    let trace = options.trace.then(|| ctx.trace().to_string());
    if let Some(trace) = &trace {
        debug!("evaluation trace:\n{}", trace);
    }
    let value = result?;
    Ok(EvalResult::Success {
        output: value_to_json(&value)?,
        trace,
    })
}

/// Render getter and setter source for an expression
pub fn execute_source(options: &SourceOptions) -> Result<Compiled, CliError> {
    let expression = parser::parse(&options.expression)?;
    let root = parse_root(options.input.as_deref())?;
    let mut ctx = Context::with_root(root);
    Ok(source::compile(&expression, &mut ctx)?)
}
