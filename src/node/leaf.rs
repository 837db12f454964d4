use super::{Operation, Outcome};
use crate::context::Context;
use crate::error::OperationError;
use serde_json::Value;

/// Passes the context along untouched. Useful for testing graph structure
/// or as a junction point.
#[derive(Debug, Clone, Default)]
pub struct IdentityOperation;

impl Operation for IdentityOperation {
    fn execute(&mut self, _context: &mut Context) -> Result<Outcome, OperationError> {
        Ok(Outcome::Continue)
    }
}

/// Assigns a constant value to the context.
#[derive(Debug, Clone)]
pub struct VariableOperation {
    output_key: String,
    value: Value,
}

impl VariableOperation {
    pub fn new(output_key: impl Into<String>, value: Value) -> Self {
        Self {
            output_key: output_key.into(),
            value,
        }
    }
}

impl Operation for VariableOperation {
    fn execute(&mut self, context: &mut Context) -> Result<Outcome, OperationError> {
        context.insert(self.output_key.clone(), self.value.clone());
        Ok(Outcome::Continue)
    }
}
