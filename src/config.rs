use std::env;

use log::debug;

/// Environment variable overriding [`Config::short_circuit`].
pub const SHORT_CIRCUIT_VAR: &str = "OGNL_CHAIN_SHORT_CIRCUIT";
/// Environment variable overriding [`Config::trace_evaluations`].
pub const TRACE_VAR: &str = "OGNL_TRACE_EVALUATIONS";

/// Evaluation switches.
///
/// A [`Runtime`](crate::runtime::Runtime) carries the process-wide
/// defaults; every [`Context`](crate::context::Context) starts from a copy
/// and may change it for its own evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// A chain whose starting source is null returns null when its first
    /// step is a property access.
    pub short_circuit: bool,
    /// Record an evaluation trace tree on the context.
    pub trace_evaluations: bool,
    /// Keep the finished root evaluation of the trace available as the
    /// context's last evaluation.
    pub keep_last_evaluation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            short_circuit: true,
            trace_evaluations: false,
            keep_last_evaluation: false,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    let flag = parse_flag(&raw);
    if flag.is_none() {
        debug!("ignoring {}={:?}: not a boolean", name, raw);
    }
    flag
}

impl Config {
    /// Defaults overridden by `OGNL_CHAIN_SHORT_CIRCUIT` and `OGNL_TRACE_EVALUATIONS`.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(flag) = env_flag(SHORT_CIRCUIT_VAR) {
            config.short_circuit = flag;
        }
        if let Some(flag) = env_flag(TRACE_VAR) {
            config.trace_evaluations = flag;
            config.keep_last_evaluation |= flag;
        }
        config
    }

    pub fn with_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    /// Enables tracing and keeps the finished trace for inspection.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.trace_evaluations = enabled;
        self.keep_last_evaluation = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn short_circuit_defaults_on() {
        let config = Config::default();
        assert!(config.short_circuit);
        assert!(!config.trace_evaluations);
        assert!(config.with_tracing(true).keep_last_evaluation);
    }
}
