//! DGP (Disciplined Geometric Programming) analysis.
//!
//! This module classifies expressions into the monomial / posynomial /
//! signomial hierarchy used to validate constraints and objectives.

pub mod kind;

pub use kind::{kind_of_terms, ExprKind};
