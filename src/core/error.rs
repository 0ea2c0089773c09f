use thiserror::Error;

/// Reasons an input row is rejected before it reaches the strategy models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("row has no BasinID2")]
    MissingBasinId,

    #[error("basin {basin_id}: missing field `{field}`")]
    MissingField {
        basin_id: String,
        field: &'static str,
    },

    #[error("basin {basin_id}: field `{field}` is not numeric ({value:?})")]
    NonNumeric {
        basin_id: String,
        field: &'static str,
        value: String,
    },

    #[error("basin {basin_id}: field `{field}` is not finite ({value})")]
    NonFinite {
        basin_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("basin {basin_id}: field `{field}` must be >= 0, got {value}")]
    Negative {
        basin_id: String,
        field: &'static str,
        value: f64,
    },
}

/// Failures while reading a scenario table from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: table is empty, expected a header row")]
    MissingHeader { path: String },

    #[error("{path}: column `{column}` appears more than once in the header")]
    DuplicateColumn { path: String, column: String },

    #[error("{path}, line {line}: expected {expected} cells, found {found}")]
    RaggedRow {
        path: String,
        line: u64,
        expected: u64,
        found: u64,
    },

    #[error("{path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
