//! Expression types and creation utilities.
//!
//! This module provides the term/expression data model:
//! - `MonomialTerm` - signed coefficient times a product of powers
//! - `Expr` - closed sum over monomial, posynomial, signomial and non-GP kinds
//! - `Variable` handles and the `VariableBuilder` used to declare them

pub mod expression;
pub mod term;
pub mod variable;

// Re-export main types
pub use expression::{Expr, Monomial, NonGpExpr, Posynomial, Signomial};
pub use term::MonomialTerm;
pub use variable::{ModelId, Variable, VariableBuilder, VariableData, DEFAULT_LOWER_BOUND};
