//! Error types for the orchestration engine.

use thiserror::Error;

use crate::component::ComponentError;
use crate::config::ConfigError;

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvironmentError>;

/// The lifecycle step an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Attach,
    Prepare,
    Start,
    Stop,
    Cleanup,
    Status,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Prepare => "prepare",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Cleanup => "cleanup",
            Self::Status => "query status of",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`Environment`](crate::Environment).
#[derive(Debug, Error)]
pub enum EnvironmentError {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================
    /// The environment id was empty.
    #[error("environment id must not be empty")]
    EmptyId,

    /// No component graph was supplied.
    #[error("environment {0} requires a component graph")]
    MissingGraph(String),

    /// A component was registered under an empty name.
    #[error("component in layer {layer} has an empty name")]
    EmptyName { layer: usize },

    /// A component name contains a space or a pipe.
    #[error("invalid component name {name:?} in layer {layer}: names must not contain spaces or '|'")]
    InvalidName { name: String, layer: usize },

    /// A component name is used more than once in the graph.
    #[error("duplicate component name {name:?}: registered in layer {first_layer} and again in layer {layer}")]
    DuplicateName {
        name: String,
        first_layer: usize,
        layer: usize,
    },

    /// Engine configuration is unusable.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] ConfigError),

    // =========================================================================
    // LOOKUP
    // =========================================================================
    /// No component is registered under this name.
    #[error("component {0:?} not found")]
    ComponentNotFound(String),

    // =========================================================================
    // COMPONENT OPERATIONS
    // =========================================================================
    /// A component lifecycle call failed.
    #[error("failed to {verb} component {name}: {source}")]
    Operation {
        name: String,
        verb: Verb,
        #[source]
        source: ComponentError,
    },

    /// The task running a component call panicked or was aborted.
    #[error("failed to {verb} component {name}: task did not complete: {reason}")]
    TaskFailed {
        name: String,
        verb: Verb,
        reason: String,
    },
}

impl EnvironmentError {
    pub(crate) fn operation(name: &str, verb: Verb, source: ComponentError) -> Self {
        Self::Operation {
            name: name.to_string(),
            verb,
            source,
        }
    }

    /// Name of the component the error concerns, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::InvalidName { name, .. }
            | Self::DuplicateName { name, .. }
            | Self::ComponentNotFound(name)
            | Self::Operation { name, .. }
            | Self::TaskFailed { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The lifecycle step that failed, for operation errors.
    #[must_use]
    pub fn verb(&self) -> Option<Verb> {
        match self {
            Self::Operation { verb, .. } | Self::TaskFailed { verb, .. } => Some(*verb),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_message_names_component_and_verb() {
        let err = EnvironmentError::operation("seed", Verb::Start, ComponentError::msg("exit 1"));
        assert_eq!(err.to_string(), "failed to start component seed: exit 1");
        assert_eq!(err.component(), Some("seed"));
        assert_eq!(err.verb(), Some(Verb::Start));
    }

    #[test]
    fn test_duplicate_message() {
        let err = EnvironmentError::DuplicateName {
            name: "db".to_string(),
            first_layer: 0,
            layer: 2,
        };
        assert!(err.to_string().contains("\"db\""));
        assert!(err.to_string().contains("layer 2"));
    }

    #[test]
    fn test_construction_errors_have_no_verb() {
        assert_eq!(EnvironmentError::EmptyId.verb(), None);
        assert_eq!(EnvironmentError::EmptyId.component(), None);
    }
}
