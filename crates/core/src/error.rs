//! # Error Types
//!
//! Every failure the engine can report is a value of [`EngineError`].
//! Structural errors (`Cycle`, `NotFound`, `AlreadyAttached`) are rejected
//! links: the composition graph is left exactly as it was and the caller
//! decides what to do next. Construction errors are never cached, so the
//! next caller asking for the same instance triggers a fresh attempt.

use std::fmt;

use thiserror::Error;

use crate::component::NodeId;

/// Errors raised by composition primitives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Linking the child would make a composite contain itself.
    #[error("Cycle: linking {child} under {parent} would make {parent} reachable from itself")]
    Cycle { parent: NodeId, child: String },

    /// The requested child is not a direct child of the composite.
    #[error("Child {target} not found in {parent}")]
    NotFound { parent: String, target: String },

    /// The variant does not implement the requested capability.
    #[error("Unsupported operation `{operation}` on {component}")]
    Unsupported {
        operation: &'static str,
        component: String,
    },

    /// A shared node is already linked under a parent.
    #[error("{child} is already attached under {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    /// A registry factory or lazy descriptor failed to build its component.
    #[error("Construction of {target} failed: {reason}")]
    Construction { target: String, reason: String },

    /// A component failed while computing its result.
    #[error("Evaluation of {component} failed: {reason}")]
    Evaluation { component: String, reason: String },

    /// A parallel evaluation task panicked or was cancelled.
    #[error("Evaluation task failed: {reason}")]
    TaskFailed { reason: String },

    /// Engine configuration could not be parsed.
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl EngineError {
    /// Build a [`EngineError::Construction`] from any displayable cause.
    pub fn construction(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Construction {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`EngineError::Evaluation`] from any displayable cause.
    pub fn evaluation(component: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Evaluation {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(operation: &'static str, component: impl Into<String>) -> Self {
        Self::Unsupported {
            operation,
            component: component.into(),
        }
    }

    /// Whether the error rejected a structural change to a composite.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Cycle { .. } | Self::NotFound { .. } | Self::AlreadyAttached { .. }
        )
    }
}
