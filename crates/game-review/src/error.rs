//! Review error types

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a position evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),

    #[error("evaluation timed out after {0:?}")]
    Timeout(Duration),
}

/// Fatal condition for the analysis of one game. No partial result is
/// produced when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Illegal move {san} at ply {ply}: {reason}")]
    IllegalMove { ply: u32, san: String, reason: String },

    #[error("Evaluator unavailable{}: {reason}", at_ply(.ply))]
    EvaluatorUnavailable { ply: Option<u32>, reason: String },

    #[error("Evaluator timed out after {timeout:?}{}", at_ply(.ply))]
    EvaluatorTimeout { ply: Option<u32>, timeout: Duration },
}

impl AnalysisError {
    /// Attach the ply being scored (`None` for the starting position).
    pub fn from_evaluator(err: EvaluatorError, ply: Option<u32>) -> Self {
        match err {
            EvaluatorError::Unavailable(reason) => AnalysisError::EvaluatorUnavailable { ply, reason },
            EvaluatorError::Timeout(timeout) => AnalysisError::EvaluatorTimeout { ply, timeout },
        }
    }

    /// The ply that triggered the failure, if any.
    pub fn ply(&self) -> Option<u32> {
        match self {
            AnalysisError::IllegalMove { ply, .. } => Some(*ply),
            AnalysisError::EvaluatorUnavailable { ply, .. }
            | AnalysisError::EvaluatorTimeout { ply, .. } => *ply,
        }
    }
}

fn at_ply(ply: &Option<u32>) -> String {
    match ply {
        Some(ply) => format!(" at ply {ply}"),
        None => " at starting position".to_string(),
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_error_keeps_ply() {
        let err = AnalysisError::from_evaluator(EvaluatorError::Unavailable("eof".into()), Some(3));
        assert_eq!(err.ply(), Some(3));
        assert_eq!(err.to_string(), "Evaluator unavailable at ply 3: eof");

        let err = AnalysisError::from_evaluator(EvaluatorError::Timeout(Duration::from_secs(2)), None);
        assert!(matches!(err, AnalysisError::EvaluatorTimeout { ply: None, .. }));
        assert_eq!(err.to_string(), "Evaluator timed out after 2s at starting position");
    }
}
