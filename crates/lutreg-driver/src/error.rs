// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for LUT register operations

use lutreg_fabric::FabricError;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for LUT register operations
pub type Result<T> = std::result::Result<T, LutRegError>;

/// Errors that can occur while reading or writing a LUT register
///
/// Every error is fatal for the run that raised it; nothing is retried.
#[derive(Debug, Error)]
pub enum LutRegError {
    /// Register index outside `[0, 31]`
    #[error("{0}")]
    InvalidRegisterIndex(FabricError),

    /// Value argument could not be used
    #[error("Invalid register value {input:?}: {reason}")]
    InvalidValue {
        /// Value as given
        input: String,
        /// Reason for rejection
        reason: String,
    },

    /// A location returned by the locator is not `<slice>/<lut>`
    #[error("Invalid register location: {0}")]
    InvalidLocation(FabricError),

    /// Locator returned no locations
    #[error("Couldn't find slice locations for register: {register}")]
    RegisterNotFound {
        /// Register name that was looked up
        register: String,
    },

    /// Resolver returned no frame addresses
    #[error("Couldn't find frame addresses for register: {register}")]
    FramesNotFound {
        /// Register name that was looked up
        register: String,
    },

    /// External tool exited unsuccessfully
    #[error("Error @ {tool} ({status})")]
    ExternalTool {
        /// Tool that failed
        tool: String,
        /// Exit status description
        status: String,
    },

    /// External tool produced output that could not be used
    #[error("Error @ {tool}: {reason}")]
    ToolOutput {
        /// Tool that produced the output
        tool: String,
        /// What was wrong with it
        reason: String,
    },

    /// External tool could not be started
    #[error("Error @ {tool}: failed to start: {source}")]
    Spawn {
        /// Tool that could not be started
        tool: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Expected artifact missing after a tool reported success
    #[error("Error @ {tool}: expected artifact {path} was not produced")]
    MissingArtifact {
        /// Tool that should have produced it
        tool: String,
        /// Artifact path
        path: PathBuf,
    },

    /// LUT symbol not one of A6LUT..D6LUT
    #[error("Unknown LUT symbol: {symbol}")]
    UnknownLut {
        /// Offending symbol
        symbol: String,
    },

    /// Internal consistency check failed
    #[error("Invariant violation: {reason}")]
    InvariantViolation {
        /// What was violated
        reason: String,
    },

    /// A pipeline stage failed; wraps the stage's own error
    #[error("{error} [stage: {stage}]")]
    StageFailed {
        /// Stage that was running
        stage: Stage,
        /// Error raised by the stage
        error: Box<LutRegError>,
    },
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input (index, value, flags)
    Validation,
    /// Register name or frames could not be found
    Lookup,
    /// A collaborator process failed or emitted unusable output
    ExternalTool,
    /// Internal algorithmic invariant broken
    InvariantViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Lookup => write!(f, "lookup"),
            Self::ExternalTool => write!(f, "external tool"),
            Self::InvariantViolation => write!(f, "invariant violation"),
        }
    }
}

impl LutRegError {
    /// Create an external tool failure from an exit status
    pub fn external_tool(tool: impl Into<String>, status: &ExitStatus) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            status: status.to_string(),
        }
    }

    /// Create an external tool failure with a free-form status
    pub fn tool_failed(tool: impl Into<String>, status: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            status: status.into(),
        }
    }

    /// Create an unusable tool output error
    pub fn tool_output(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolOutput {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Wrap an error with the pipeline stage that raised it
    pub fn stage_failed(stage: Stage, error: Self) -> Self {
        Self::StageFailed {
            stage,
            error: Box::new(error),
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRegisterIndex(_) | Self::InvalidValue { .. } => ErrorKind::Validation,
            Self::RegisterNotFound { .. } | Self::FramesNotFound { .. } => ErrorKind::Lookup,
            Self::ExternalTool { .. }
            | Self::ToolOutput { .. }
            | Self::Spawn { .. }
            | Self::MissingArtifact { .. }
            | Self::InvalidLocation(_) => ErrorKind::ExternalTool,
            Self::UnknownLut { .. } | Self::InvariantViolation { .. } => {
                ErrorKind::InvariantViolation
            }
            Self::StageFailed { error, .. } => error.kind(),
        }
    }

    /// Stage that raised this error, if it came out of the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with any stage wrapper removed
    pub fn root(&self) -> &Self {
        match self {
            Self::StageFailed { error, .. } => error.root(),
            other => other,
        }
    }
}

impl From<FabricError> for LutRegError {
    fn from(err: FabricError) -> Self {
        match err {
            FabricError::InvalidIndex { .. } => Self::InvalidRegisterIndex(err),
            FabricError::UnknownLut { symbol } => Self::UnknownLut { symbol },
            FabricError::MalformedLocation { .. } => Self::InvalidLocation(err),
            FabricError::InvalidHex { token } => {
                Self::invalid_value(token, "not a hex value")
            }
            FabricError::EmptyDescriptor
            | FabricError::DescriptorTooWide { .. }
            | FabricError::DuplicateLocation { .. } => Self::invariant(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapper_keeps_kind_and_message() {
        let inner = LutRegError::tool_failed("bitmod_init.py", "exit status: 1");
        let err = LutRegError::stage_failed(Stage::ModifyRegister, inner);

        assert_eq!(err.kind(), ErrorKind::ExternalTool);
        assert_eq!(err.stage(), Some(Stage::ModifyRegister));
        assert_eq!(
            err.to_string(),
            "Error @ bitmod_init.py (exit status: 1) [stage: modify-register]"
        );
        assert!(matches!(err.root(), LutRegError::ExternalTool { .. }));
    }

    #[test]
    fn fabric_errors_map_to_taxonomy() {
        let err: LutRegError = FabricError::InvalidIndex { input: "32".into() }.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: LutRegError = FabricError::UnknownLut { symbol: "E6LUT".into() }.into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let err: LutRegError = FabricError::EmptyDescriptor.into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let err: LutRegError = FabricError::DuplicateLocation {
            location: "SLICE_X0Y0/A6LUT".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let err: LutRegError = FabricError::InvalidHex { token: "0x+1".into() }.into();
        assert!(matches!(err, LutRegError::InvalidValue { ref input, .. } if input == "0x+1"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn lookup_messages() {
        let err = LutRegError::RegisterNotFound {
            register: "CTRL".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(
            err.to_string(),
            "Couldn't find slice locations for register: CTRL"
        );
    }
}
