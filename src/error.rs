//! Error types for chronorm operations.
//!
//! Strategies never surface raw parser failures: every failure is wrapped in a
//! [`TemporalError`] carrying a typed [`ErrorCode`], the original input (as
//! text), and an optional context note. The coordinator is the only layer that
//! hands errors to callers, and only after its attempt budget is exhausted.

use thiserror::Error;

use crate::StrategyKind;

/// Typed code identifying which strategy family produced a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorCode {
    StringParse,
    NumberParse,
    DateParse,
    TimestampParse,
    ArrayParse,
    FieldsParse,
    FallbackParse,
}

impl ErrorCode {
    /// Stable wire name, e.g. `STRING_PARSE_ERROR`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StringParse => "STRING_PARSE_ERROR",
            ErrorCode::NumberParse => "NUMBER_PARSE_ERROR",
            ErrorCode::DateParse => "DATE_PARSE_ERROR",
            ErrorCode::TimestampParse => "TIMESTAMP_PARSE_ERROR",
            ErrorCode::ArrayParse => "ARRAY_PARSE_ERROR",
            ErrorCode::FieldsParse => "FIELDS_PARSE_ERROR",
            ErrorCode::FallbackParse => "FALLBACK_PARSE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemporalError {
    /// A single strategy failed to convert its input.
    #[error("{code}: {message} (input: `{input}`)")]
    Strategy { code: ErrorCode, message: String, input: String, context: Option<String> },

    /// Every candidate strategy failed within the coordinator's attempt budget.
    #[error("no strategy could parse `{input}`; attempted: {tried:?}")]
    Exhausted { input: String, tried: Vec<StrategyKind> },

    /// The comparison registry held no strategy for the requested kind.
    #[error("no comparison strategy registered for `{0}`")]
    UnsupportedComparison(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("invalid cache capacity: {0}")]
    InvalidCapacity(usize),
}

impl TemporalError {
    /// Uniform constructor used by all strategies.
    pub fn strategy(code: ErrorCode, message: impl Into<String>, input: impl Into<String>) -> Self {
        TemporalError::Strategy { code, message: message.into(), input: input.into(), context: None }
    }

    /// Like [`TemporalError::strategy`] with an extra context note
    /// (e.g. which conversion step rejected the value).
    pub fn strategy_in(
        code: ErrorCode,
        message: impl Into<String>,
        input: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        TemporalError::Strategy {
            code,
            message: message.into(),
            input: input.into(),
            context: Some(context.into()),
        }
    }

    /// The strategy error code, if this is a per-strategy failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TemporalError::Strategy { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TemporalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_render_wire_names() {
        assert_eq!(ErrorCode::StringParse.to_string(), "STRING_PARSE_ERROR");
        assert_eq!(ErrorCode::TimestampParse.to_string(), "TIMESTAMP_PARSE_ERROR");
    }

    #[test]
    fn strategy_error_carries_input_and_code() {
        let err = TemporalError::strategy(ErrorCode::NumberParse, "not finite", "NaN");
        assert_eq!(err.code(), Some(ErrorCode::NumberParse));
        let text = err.to_string();
        assert!(text.contains("NUMBER_PARSE_ERROR"));
        assert!(text.contains("NaN"));
    }
}
