use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}. Please ensure it exists.")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Table has no header row")]
    Empty,

    #[error("Row {row} has {found} cells but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Which column a resolution failure was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Segment,
    Score,
    Group,
    Quantity,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnRole::Segment => "segment",
            ColumnRole::Score => "score",
            ColumnRole::Group => "group",
            ColumnRole::Quantity => "quantity",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Could not resolve the {role} column (requested: {requested:?})")]
    MissingColumn {
        role: ColumnRole,
        requested: Option<String>,
    },

    #[error("Training sample has no rows")]
    EmptySample,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Model not trained: {reason}")]
    NotTrained { reason: String },

    #[error("Could not resolve the {role} column of the universe table (requested: {requested:?})")]
    MissingColumn {
        role: ColumnRole,
        requested: Option<String>,
    },

    #[error("Distribution has no positive weights")]
    EmptyDistribution,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create snapshot file at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize population snapshot to {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
