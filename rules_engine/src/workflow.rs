//! Workflow definitions and their compilation

use crate::errors::RulesEngineError;
use serde::{Deserialize, Serialize};

/// A single condition of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub rule_name: String,
    pub operator: String,
    /// Input property the rule reads
    pub field: String,
    pub value: String,
}

/// Named set of rules that must all pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workflow {
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Turns a stored definition into an executable workflow
pub trait RuleCompiler: Send + Sync {
    fn compile(&self, workflow_name: &str, definition: &str) -> Result<Workflow, RulesEngineError>;
}

/// Compiler for JSON definitions of the form
/// `{ "WorkflowName": ..., "Rules": [{ "RuleName", "Operator", "Field", "Value" }] }`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRuleCompiler;

impl JsonRuleCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl RuleCompiler for JsonRuleCompiler {
    fn compile(&self, workflow_name: &str, definition: &str) -> Result<Workflow, RulesEngineError> {
        let invalid = |reason: String| RulesEngineError::InvalidWorkflow {
            workflow: workflow_name.to_string(),
            reason,
        };

        let mut workflow: Workflow =
            serde_json::from_str(definition).map_err(|e| invalid(e.to_string()))?;

        if workflow.workflow_name.is_empty() {
            workflow.workflow_name = workflow_name.to_string();
        } else if workflow.workflow_name != workflow_name {
            return Err(invalid(format!(
                "definition declares workflow '{}'",
                workflow.workflow_name
            )));
        }

        if let Some(rule) = workflow
            .rules
            .iter()
            .find(|rule| rule.field.trim().is_empty() || rule.operator.trim().is_empty())
        {
            return Err(invalid(format!(
                "rule '{}' needs both an operator and a field",
                rule.rule_name
            )));
        }

        Ok(workflow)
    }
}
