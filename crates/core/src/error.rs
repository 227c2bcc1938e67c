use thiserror::Error;

pub type InsightsResult<T> = Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unknown grouping dimension: {0}")]
    InvalidDimension(String),

    #[error("Metric {metric} is not available for the {view} view")]
    InvalidMetric { metric: String, view: String },

    #[error("Unknown view: {0}")]
    InvalidView(String),

    #[error("At least one grouping dimension is required")]
    EmptyGrouping,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl InsightsError {
    /// True for errors caused by a bad request value rather than by the
    /// data source or the process.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimension(_)
                | Self::InvalidMetric { .. }
                | Self::InvalidView(_)
                | Self::EmptyGrouping
        )
    }
}
