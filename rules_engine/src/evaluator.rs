//! Executable rule evaluator

use crate::errors::RulesEngineError;
use crate::operator::OperatorStrategy;
use crate::workflow::Workflow;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled workflow bound to the operators that execute it
#[derive(Clone)]
pub struct RulesEngineEvaluator {
    workflow: Workflow,
    operators: Arc<dyn OperatorStrategy>,
}

impl std::fmt::Debug for RulesEngineEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesEngineEvaluator")
            .field("workflow", &self.workflow.workflow_name)
            .field("rules", &self.workflow.rules.len())
            .finish()
    }
}

impl RulesEngineEvaluator {
    pub fn new(workflow: Workflow, operators: Arc<dyn OperatorStrategy>) -> Self {
        Self {
            workflow,
            operators,
        }
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow.workflow_name
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// True when every rule passes against `input`. A missing field fails its rule.
    pub fn evaluate(&self, input: &HashMap<String, String>) -> Result<bool, RulesEngineError> {
        for rule in &self.workflow.rules {
            let Some(actual) = input.get(&rule.field) else {
                tracing::trace!(rule = %rule.rule_name, field = %rule.field, "rule input missing");
                return Ok(false);
            };
            if !self.operators.evaluate(&rule.operator, &rule.value, actual)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
