//! Error types.
//!
//! - `AdjustError` is what the library operations return. Each variant names the
//!   invariant that was violated so callers can react to it.
//! - `AppError` is what the binary surfaces: a message plus a process exit code.
//!
//! Exit codes:
//! - `2` usage or input problems (I/O, parse, configuration, malformed tables)
//! - `3` input tables that are not shape-aligned
//! - `4` computation failures

use crate::domain::Period;

/// Errors raised by the table model and the adjustment/marker engines.
#[derive(Debug, Clone, PartialEq)]
pub enum AdjustError {
    /// Two tables that must share row keys and periods do not.
    ShapeMismatch { context: String, detail: String },
    /// Mutually exclusive or out-of-range options.
    Configuration(String),
    /// A cell would leave the engine undefined or non-finite.
    UndefinedValue { row: String, period: Period },
    /// A table violates its construction invariants.
    InvalidTable(String),
    /// A literal (marker, period, boolean) could not be parsed.
    Parse(String),
    /// The marker propagation loop did not settle within its bound.
    Convergence { iterations: usize },
}

impl AdjustError {
    pub fn shape_mismatch(context: impl Into<String>, detail: impl Into<String>) -> Self {
        AdjustError::ShapeMismatch {
            context: context.into(),
            detail: detail.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AdjustError::Configuration(_) | AdjustError::InvalidTable(_) | AdjustError::Parse(_) => 2,
            AdjustError::ShapeMismatch { .. } => 3,
            AdjustError::UndefinedValue { .. } | AdjustError::Convergence { .. } => 4,
        }
    }
}

impl std::fmt::Display for AdjustError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustError::ShapeMismatch { context, detail } => {
                write!(f, "Shape mismatch ({context}): {detail}")
            }
            AdjustError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            AdjustError::UndefinedValue { row, period } => {
                write!(f, "Undefined value for row '{row}' at period {period}")
            }
            AdjustError::InvalidTable(msg) => write!(f, "Invalid table: {msg}"),
            AdjustError::Parse(msg) => write!(f, "Parse error: {msg}"),
            AdjustError::Convergence { iterations } => write!(
                f,
                "Marker propagation did not converge after {iterations} iterations"
            ),
        }
    }
}

impl std::error::Error for AdjustError {}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AdjustError> for AppError {
    fn from(err: AdjustError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
