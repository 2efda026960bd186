//! Built-in demo capabilities

pub mod arithmetic;
pub mod strings;

pub use arithmetic::ArithmeticOperations;
pub use strings::StringUtils;

use super::Capability;
use std::sync::Arc;

/// The capabilities registered by the CLI out of the box
pub fn default_capabilities() -> Vec<Arc<dyn Capability>> {
    vec![Arc::new(ArithmeticOperations), Arc::new(StringUtils)]
}
