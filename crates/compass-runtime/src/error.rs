//! Error types for the simulation runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Broad classification of a [`RuntimeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad topology or parameters, detected at build or reset time
    Configuration,
    /// A cluster or synapse name that is not registered
    Lookup,
}

/// Errors that can occur in the simulation runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid network configuration
    #[error("Invalid network configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A cluster with this name is already registered
    #[error("Cluster {name} already exists")]
    DuplicateCluster {
        /// Cluster name
        name: String,
    },

    /// The (pre, post) pair already has a synapse
    #[error("Synapse from {pre} to {post} already exists")]
    DuplicateSynapse {
        /// Presynaptic cluster name
        pre: String,
        /// Postsynaptic cluster name
        post: String,
    },

    /// An input cluster was reset before its simulation timing was set
    #[error("Input cluster {name} has no simulation timing; call set_sim_params before reset")]
    MissingSimParams {
        /// Input cluster name
        name: String,
    },

    /// A synapse was reset before being wired to a presynaptic cluster
    #[error("Synapse has no presynaptic size; it must be added to a network before reset")]
    UnwiredSynapse,

    /// Activation intervals of an input cluster overlap
    #[error("Activation intervals ({first_start}, {first_end}) and ({second_start}, {second_end}) of {name} overlap")]
    OverlappingIntervals {
        /// Input cluster name
        name: String,
        /// Start of the earlier interval
        first_start: f64,
        /// End of the earlier interval
        first_end: f64,
        /// Start of the later interval
        second_start: f64,
        /// End of the later interval
        second_end: f64,
    },

    /// `update` was called on a network that was never reset
    #[error("Network must be reset before it can be updated")]
    NotReset,

    /// Cluster not found
    #[error("Cluster {name} not found")]
    ClusterNotFound {
        /// Name that was not found
        name: String,
    },

    /// Synapse not found
    #[error("No synapse from {pre} to {post}")]
    SynapseNotFound {
        /// Presynaptic cluster name
        pre: String,
        /// Postsynaptic cluster name
        post: String,
    },

    /// The named cluster exists but is not of the requested kind
    #[error("Cluster {name} is not {expected}")]
    WrongClusterKind {
        /// Cluster name
        name: String,
        /// Expected kind description
        expected: &'static str,
    },
}

impl RuntimeError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a cluster-not-found error
    pub fn cluster_not_found(name: impl Into<String>) -> Self {
        Self::ClusterNotFound { name: name.into() }
    }

    /// Create a synapse-not-found error
    pub fn synapse_not_found(pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self::SynapseNotFound {
            pre: pre.into(),
            post: post.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClusterNotFound { .. }
            | Self::SynapseNotFound { .. }
            | Self::WrongClusterKind { .. } => ErrorKind::Lookup,
            _ => ErrorKind::Configuration,
        }
    }
}
