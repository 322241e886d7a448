//! Operator engine for the GP/SP expression algebra.
//!
//! - `+`, `-`, `*`, `/` over variables, expressions and scalars
//! - `power` (and `powf` methods) for real exponents

pub mod ops;

pub use ops::{add_exprs, div_exprs, mul_exprs, neg_expr, power, sub_exprs};
