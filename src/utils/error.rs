use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelationsError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot find a {container_type} with dc:title of {title}")]
    ContainerNotFound {
        container_type: String,
        title: String,
    },

    #[error("Failed to execute the command <{command}>. Final command [ {command_line} ] returned with error {return_code}{}", error_suffix(.error))]
    CommandFailed {
        command: String,
        command_line: String,
        return_code: i32,
        error: Option<String>,
    },

    #[error("Repository error: {message}")]
    RepositoryError { message: String },

    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Repository,
    ExternalTool,
    FileSystem,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelationsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_)
            | Self::ContainerNotFound { .. } => ErrorCategory::Configuration,
            Self::RepositoryError { .. } | Self::DocumentNotFound { .. } => {
                ErrorCategory::Repository
            }
            Self::CommandFailed { .. } => ErrorCategory::ExternalTool,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::FileSystem,
            Self::SerializationError(_) | Self::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. } | Self::DocumentNotFound { .. } => ErrorSeverity::Medium,
            Self::CommandFailed { .. } | Self::RepositoryError { .. } => ErrorSeverity::High,
            Self::SerializationError(_) => ErrorSeverity::High,
            // 結構或設定缺失，重試也沒用
            Self::ContainerNotFound { .. }
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_)
            | Self::IoError(_)
            | Self::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ContainerNotFound {
                container_type,
                title,
            } => format!(
                "Create a {} document titled '{}' in the repository structure",
                container_type, title
            ),
            Self::CommandFailed { command, .. } => format!(
                "Check that the command '{}' is installed and its template is correct",
                command
            ),
            Self::MissingConfigError { field } => {
                format!("Add the '{}' setting to the configuration file", field)
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in the configuration file", field)
            }
            Self::ConfigError { .. } | Self::TomlError(_) => {
                "Check the configuration file syntax and values".to_string()
            }
            Self::DocumentNotFound { .. } => {
                "Verify the document identifiers passed on the command line".to_string()
            }
            Self::IoError(_) | Self::ZipError(_) => {
                "Check file permissions and available disk space".to_string()
            }
            Self::RepositoryError { .. } | Self::SerializationError(_) => {
                "Check that the repository snapshot is a valid JSON document".to_string()
            }
            Self::ValidationError { .. } => "Fix the input data and retry".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Repository => format!("Repository problem: {}", self),
            ErrorCategory::ExternalTool => format!("External tool failed: {}", self),
            ErrorCategory::FileSystem => format!("File system problem: {}", self),
            ErrorCategory::Data => format!("Invalid data: {}", self),
        }
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::RepositoryError {
            message: message.into(),
        }
    }
}

fn error_suffix(error: &Option<String>) -> String {
    error.as_ref().map(|e| format!(": {}", e)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, RelationsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_not_found_message() {
        let err = RelationsError::ContainerNotFound {
            container_type: "IPcontractRoot".to_string(),
            title: "02. Licenses".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot find a IPcontractRoot with dc:title of 02. Licenses"
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_command_failed_carries_diagnostics() {
        let err = RelationsError::CommandFailed {
            command: "wkhtmltopdf-default".to_string(),
            command_line: "wkhtmltopdf a.html b.pdf".to_string(),
            return_code: 2,
            error: None,
        };
        let message = err.to_string();
        assert!(message.contains("wkhtmltopdf a.html b.pdf"));
        assert!(message.contains("returned with error 2"));
        assert_eq!(err.category(), ErrorCategory::ExternalTool);
    }
}
