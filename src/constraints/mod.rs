//! Constraint relations and the normalizer.

pub mod constraint;

pub use constraint::{
    normalize, split_by_sign, CanonicalForm, ConstraintExt, ConstraintRecord, ConstraintRef,
    NormalizedConstraint, Relation, RelationSense,
};
