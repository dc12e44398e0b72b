//! Error types for the connectivity builder

use compass_runtime::RuntimeError;
use thiserror::Error;

/// Result type for connectome operations
pub type Result<T> = std::result::Result<T, ConnectomeError>;

/// Errors that can occur while loading tables or building a circuit
#[derive(Error, Debug)]
pub enum ConnectomeError {
    /// Network construction failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// No table with this name in the atlas
    #[error("Overlap table {name} not found")]
    TableNotFound {
        /// Table name
        name: String,
    },

    /// A unit label is not a row of the table
    #[error("Unit {unit} not found in table {table}")]
    UnitNotFound {
        /// Table name
        table: String,
        /// Unit label
        unit: String,
    },

    /// Table data does not match its labels
    #[error("Table {table} has {rows}x{cols} data for {expected_rows} row and {expected_cols} column labels")]
    ShapeMismatch {
        /// Table name
        table: String,
        /// Number of row labels
        expected_rows: usize,
        /// Number of column labels
        expected_cols: usize,
        /// Data rows
        rows: usize,
        /// Data columns
        cols: usize,
    },

    /// Two tables compared column by column do not share column labels
    #[error("Tables {src} and {trg} do not share the same column labels")]
    ColumnMismatch {
        /// Source table name
        src: String,
        /// Target table name
        trg: String,
    },

    /// No conductance factor for a population pair
    #[error("No conductance factor for {pre}->{post}")]
    MissingFactor {
        /// Presynaptic population kind
        pre: String,
        /// Postsynaptic population kind
        post: String,
    },

    /// Invalid experiment configuration
    #[error("Invalid experiment configuration: {reason}")]
    InvalidConfig {
        /// Reason for invalid configuration
        reason: String,
    },

    /// I/O error while reading or writing a configuration file
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },
}

impl ConnectomeError {
    /// Create a table-not-found error
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Create a unit-not-found error
    pub fn unit_not_found(table: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::UnitNotFound {
            table: table.into(),
            unit: unit.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
