//! Basic arithmetic capability

use crate::capability::{Capability, MethodCall, MethodDoc};
use crate::error::{CapabilityError, Result};
use async_trait::async_trait;
use serde_json::{json, Number, Value};

/// Performs basic arithmetic on integers and floats
pub struct ArithmeticOperations;

#[derive(Debug, Clone, Copy)]
enum Operand {
    Int(i64),
    Float(f64),
}

impl Operand {
    fn as_f64(self) -> f64 {
        match self {
            Operand::Int(i) => i as f64,
            Operand::Float(f) => f,
        }
    }
}

fn operand(call: &MethodCall, key: &str) -> Result<Operand> {
    let value: Value = call.get_parameter(key)?;
    if let Some(i) = value.as_i64() {
        return Ok(Operand::Int(i));
    }
    value.as_f64().map(Operand::Float).ok_or_else(|| {
        CapabilityError::InvalidParameters {
            message: format!("Parameter '{}' must be a number, got {}", key, value),
        }
        .into()
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    fn from_method(method: &str) -> Option<Self> {
        match method {
            "add" => Some(Operation::Add),
            "subtract" => Some(Operation::Subtract),
            "multiply" => Some(Operation::Multiply),
            "divide" => Some(Operation::Divide),
            _ => None,
        }
    }

    /// Integer result when both sides are integers and it fits, float otherwise.
    /// `None` when the float result is NaN or infinite.
    fn apply(self, a: Operand, b: Operand) -> Option<Value> {
        if let (Operand::Int(x), Operand::Int(y)) = (a, b) {
            let exact = match self {
                Operation::Add => x.checked_add(y),
                Operation::Subtract => x.checked_sub(y),
                Operation::Multiply => x.checked_mul(y),
                Operation::Divide => None,
            };
            if let Some(result) = exact {
                return Some(json!(result));
            }
        }

        let (x, y) = (a.as_f64(), b.as_f64());
        let result = match self {
            Operation::Add => x + y,
            Operation::Subtract => x - y,
            Operation::Multiply => x * y,
            Operation::Divide => x / y,
        };
        Number::from_f64(result).map(Value::Number)
    }
}

fn binary_doc(name: &str, verb: &str, result: &str) -> MethodDoc {
    MethodDoc::new(
        name,
        format!(
            "- Description: This method {} two numbers.\n\
             - List of parameters:\n\
             \x20   - param a: First number :type: int or float\n\
             \x20   - param b: Second number :type: int or float\n\
             :return: {} of a and b\n\
             :rtype: int or float",
            verb, result
        ),
    )
}

#[async_trait]
impl Capability for ArithmeticOperations {
    fn type_name(&self) -> &str {
        "ArithmeticOperations"
    }

    fn description(&self) -> &str {
        "A set of methods designed to perform basic arithmetic or math operations."
    }

    fn methods(&self) -> Vec<MethodDoc> {
        vec![
            binary_doc("add", "adds", "Sum"),
            binary_doc("subtract", "subtracts", "Difference"),
            binary_doc("multiply", "multiplies", "Product"),
            binary_doc("divide", "divides", "Quotient"),
        ]
    }

    async fn invoke(&self, call: &MethodCall) -> Result<Value> {
        let operation = Operation::from_method(&call.method).ok_or_else(|| call.not_found())?;
        let a = operand(call, "a")?;
        let b = operand(call, "b")?;

        let failed = |message: &str| -> crate::error::Error {
            CapabilityError::ExecutionFailed {
                method: call.qualified_name(),
                message: message.to_string(),
            }
            .into()
        };

        if operation == Operation::Divide && b.as_f64() == 0.0 {
            return Err(failed("Cannot divide by zero"));
        }
        operation
            .apply(a, b)
            .ok_or_else(|| failed("Result is not a finite number"))
    }
}
