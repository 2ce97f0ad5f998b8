//! Rule operators

use crate::errors::RulesEngineError;

/// Compares a rule's expected value with the value found in the input
pub trait OperatorStrategy: Send + Sync {
    fn evaluate(&self, operator: &str, expected: &str, actual: &str) -> Result<bool, RulesEngineError>;
}

/// `Equals`, `NotEquals`, `In` and `NotIn`, all case-insensitive.
///
/// `In` and `NotIn` take a comma-separated expected list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOperatorStrategy;

impl DefaultOperatorStrategy {
    pub fn new() -> Self {
        Self
    }
}

fn contains(list: &str, actual: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate.eq_ignore_ascii_case(actual.trim()))
}

impl OperatorStrategy for DefaultOperatorStrategy {
    fn evaluate(&self, operator: &str, expected: &str, actual: &str) -> Result<bool, RulesEngineError> {
        let operator = operator.trim();
        if operator.eq_ignore_ascii_case("Equals") {
            Ok(expected.trim().eq_ignore_ascii_case(actual.trim()))
        } else if operator.eq_ignore_ascii_case("NotEquals") {
            Ok(!expected.trim().eq_ignore_ascii_case(actual.trim()))
        } else if operator.eq_ignore_ascii_case("In") {
            Ok(contains(expected, actual))
        } else if operator.eq_ignore_ascii_case("NotIn") {
            Ok(!contains(expected, actual))
        } else {
            Err(RulesEngineError::UnknownOperator(operator.to_string()))
        }
    }
}
