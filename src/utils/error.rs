use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Governance config not found: {path}")]
    MissingConfigSource { path: String },

    #[error("Governance config could not be parsed: {message}")]
    ConfigParseError { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input batch not found: {path}")]
    MissingInput { path: String },

    #[error("Input batch is malformed: {message}")]
    MalformedInput { message: String },

    #[error("No valid records to process after validation ({discarded} discarded)")]
    EmptyBatch { discarded: usize },

    #[error("Cannot aggregate KPIs over an empty batch")]
    EmptyAggregation,

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RecoveryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecoveryError::MissingConfigSource { .. }
            | RecoveryError::ConfigParseError { .. }
            | RecoveryError::MissingConfigError { .. }
            | RecoveryError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RecoveryError::CsvError(_)
            | RecoveryError::MissingInput { .. }
            | RecoveryError::MalformedInput { .. }
            | RecoveryError::EmptyBatch { .. } => ErrorCategory::Input,
            RecoveryError::EmptyAggregation | RecoveryError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            RecoveryError::IoError(_) | RecoveryError::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RecoveryError::EmptyAggregation | RecoveryError::IoError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RecoveryError::MissingConfigSource { path } => format!(
                "Create the governance thresholds file at '{}' or pass --config",
                path
            ),
            RecoveryError::ConfigParseError { .. } => {
                "Check the governance file is valid TOML".to_string()
            }
            RecoveryError::MissingConfigError { field } => {
                format!("Add '{}' to the governance file", field)
            }
            RecoveryError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            RecoveryError::MissingInput { path } => {
                format!("Provide the account batch at '{}' or pass --input", path)
            }
            RecoveryError::EmptyBatch { .. } => {
                "Check amounts are positive, days overdue non-negative and segments are Retail, SME or Enterprise".to_string()
            }
            RecoveryError::CsvError(_) | RecoveryError::MalformedInput { .. } => {
                "Check the input header: account_id,amount,days_overdue,customer_segment,dispute_history".to_string()
            }
            RecoveryError::IoError(_) => {
                "Check file permissions and free disk space".to_string()
            }
            RecoveryError::SerializationError(_)
            | RecoveryError::EmptyAggregation
            | RecoveryError::ProcessingError { .. } => {
                "Re-run with --verbose and report the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
