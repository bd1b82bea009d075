use thiserror::Error;

#[derive(Error, Debug)]
pub enum VotingError {
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Ballot submission rejected with status {status}: {body}")]
    SubmissionError { status: u16, body: String },

    #[error("Ranking retrieval failed with status {status}: {message}")]
    RetrievalError { status: u16, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Submission,
    Retrieval,
    Data,
    Configuration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VotingError {
    pub fn validation(message: impl Into<String>) -> Self {
        VotingError::ValidationError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VotingError::TransportError(_) => ErrorKind::Transport,
            VotingError::SubmissionError { .. } => ErrorKind::Submission,
            VotingError::RetrievalError { .. } => ErrorKind::Retrieval,
            VotingError::SerializationError(_)
            | VotingError::CsvError(_)
            | VotingError::IoError(_)
            | VotingError::ProcessingError { .. } => ErrorKind::Data,
            VotingError::ConfigError { .. }
            | VotingError::ConfigValidationError { .. }
            | VotingError::InvalidConfigValueError { .. } => ErrorKind::Configuration,
            VotingError::ValidationError { .. } => ErrorKind::Validation,
        }
    }

    /// 所有錯誤都可由使用者重試，沒有一個會讓行程進入不可恢復狀態
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Validation => ErrorSeverity::Low,
            ErrorKind::Transport | ErrorKind::Retrieval => ErrorSeverity::Medium,
            ErrorKind::Submission | ErrorKind::Data => ErrorSeverity::High,
            ErrorKind::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            VotingError::TransportError(_) | VotingError::RetrievalError { .. } => true,
            VotingError::SubmissionError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            VotingError::TransportError(_) => {
                "Could not reach the voting API. Your selections were kept.".to_string()
            }
            VotingError::SubmissionError { status, body } => {
                format!("The ballot was not registered (HTTP {}): {}", status, body)
            }
            VotingError::RetrievalError { status, .. } => {
                format!("Could not load the ranking (HTTP {})", status)
            }
            VotingError::ValidationError { message } => message.clone(),
            VotingError::ConfigValidationError { field, message } => {
                format!("Invalid configuration value for {}: {}", field, message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Transport => "Check the network connection and the API base URL, then retry",
            ErrorKind::Submission => "Review the ballot and retry; the selections are unchanged",
            ErrorKind::Retrieval => "Retry later or verify that the ranking endpoint is available",
            ErrorKind::Data => "Check the API response format or the output destination",
            ErrorKind::Configuration => "Fix the configuration file or environment variables",
            ErrorKind::Validation => "Adjust the selections so every category is valid",
        }
    }
}

pub type Result<T> = std::result::Result<T, VotingError>;
