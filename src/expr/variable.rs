//! Variable declaration with builder pattern.
//!
//! Variables are owned by a [`Model`](crate::model::Model) and referenced by a
//! lightweight [`Variable`] handle carrying the owning model's id and a stable
//! index into its variable arena.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{GpError, Result};

/// Lower bound applied when a variable declares none.
pub const DEFAULT_LOWER_BOUND: f64 = 1e-8;

/// Unique identifier for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(u64);

impl ModelId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ModelId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a variable declared in a model.
///
/// Handles are `Copy`; the variable's data lives in the owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    model: ModelId,
    index: usize,
}

impl Variable {
    pub(crate) fn new(model: ModelId, index: usize) -> Self {
        Variable { model, index }
    }

    /// Stable index of this variable within its model.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the owning model.
    pub fn model_id(&self) -> ModelId {
        self.model
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

/// Stored attributes of a declared variable.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Display name.
    pub name: String,
    /// Declared lower bound, if any.
    pub lower: Option<f64>,
    /// Declared upper bound, if any.
    pub upper: Option<f64>,
    /// Fixed value; mutually exclusive with bounds.
    pub fixed: Option<f64>,
    /// Declared start value for the signomial loop.
    pub start: Option<f64>,
    /// Append-only linearization points; the last entry is current.
    pub linearization_points: Vec<f64>,
}

impl VariableData {
    /// Lower bound used by the lowering (declared or [`DEFAULT_LOWER_BOUND`]).
    pub fn effective_lower(&self) -> f64 {
        self.lower.unwrap_or(DEFAULT_LOWER_BOUND)
    }

    /// Upper bound used by the lowering (`+inf` when undeclared).
    pub fn effective_upper(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    /// Current linearization point, if one has been recorded.
    pub fn current_point(&self) -> Option<f64> {
        self.linearization_points.last().copied()
    }

    /// Point used to seed the first signomial iteration.
    ///
    /// Fixed value, then start value, then the midpoint of both declared
    /// bounds, then the single declared bound, then `1.0`.
    pub fn seed_point(&self) -> f64 {
        if let Some(v) = self.fixed {
            return v;
        }
        if let Some(v) = self.start {
            return v;
        }
        match (self.lower, self.upper) {
            (Some(lb), Some(ub)) => 0.5 * (lb + ub),
            (Some(lb), None) => lb,
            (None, Some(ub)) => ub,
            (None, None) => 1.0,
        }
    }
}

/// Builder for declaring variables with various attributes.
#[derive(Debug, Clone, Default)]
pub struct VariableBuilder {
    name: String,
    lower: Option<f64>,
    upper: Option<f64>,
    fixed: Option<f64>,
    start: Option<f64>,
}

impl VariableBuilder {
    /// Create a new variable builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a strictly positive lower bound.
    pub fn lower_bound(mut self, value: f64) -> Self {
        self.lower = Some(value);
        self
    }

    /// Set a strictly positive upper bound.
    pub fn upper_bound(mut self, value: f64) -> Self {
        self.upper = Some(value);
        self
    }

    /// Set both bounds.
    pub fn bounds(self, lower: f64, upper: f64) -> Self {
        self.lower_bound(lower).upper_bound(upper)
    }

    /// Fix the variable to a strictly positive value.
    pub fn fixed(mut self, value: f64) -> Self {
        self.fixed = Some(value);
        self
    }

    /// Set the start value used to seed the signomial loop.
    pub fn start(mut self, value: f64) -> Self {
        self.start = Some(value);
        self
    }

    /// Validate the attributes and produce the stored variable data.
    pub(crate) fn build(self) -> Result<VariableData> {
        let invalid = |reason: String| GpError::InvalidBounds {
            name: self.name.clone(),
            reason,
        };

        if self.fixed.is_some() && (self.lower.is_some() || self.upper.is_some()) {
            return Err(invalid("a fixed value cannot be combined with bounds".into()));
        }
        for (label, value) in [
            ("lower bound", self.lower),
            ("upper bound", self.upper),
            ("fixed value", self.fixed),
            ("start value", self.start),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(invalid(format!(
                        "{} must be finite and strictly positive, got {}",
                        label, v
                    )));
                }
            }
        }
        let lower = self.lower.unwrap_or(DEFAULT_LOWER_BOUND);
        if let Some(upper) = self.upper {
            if lower > upper {
                return Err(invalid(format!(
                    "lower bound ({}) exceeds upper bound ({})",
                    lower, upper
                )));
            }
        }

        Ok(VariableData {
            name: self.name,
            lower: self.lower,
            upper: self.upper,
            fixed: self.fixed,
            start: self.start,
            linearization_points: Vec::new(),
        })
    }
}
