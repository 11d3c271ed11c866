// SPDX-License-Identifier: MIT

//! Condition expressions for `if` nodes
//!
//! Conditions are small boolean expressions over context paths:
//! - `score >= 60`
//! - `user.role == 'admin' and not banned`
//! - `(tags contains 'bug' or priority > 3) and owner != null`

mod ast;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::evaluate;
pub use parser::{parse, ConditionError};
