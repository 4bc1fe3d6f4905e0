use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad thresholds, negative weight, etc.).
    ConfigValidation(String),
    /// A record kind referenced at runtime has no rule table.
    UnknownKind(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownKind(kind) => write!(f, "no matching rules for record kind: {kind}"),
        }
    }
}

impl std::error::Error for EngineError {}
