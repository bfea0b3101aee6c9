pub const SELECTION_REQUIRED_NOTICE: &str = "Please select both an advisory and a farmer";

/// Local rejection of a submit attempt. Never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no advisory selected")]
    MissingAdvisory,

    #[error("no farmer selected")]
    MissingFarmer,

    #[error("neither an advisory nor a farmer is selected")]
    MissingSelection,
}

impl ValidationError {
    pub fn notice(self) -> &'static str {
        SELECTION_REQUIRED_NOTICE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at '{path}'")]
    NotFound { path: String },

    #[error("Failed to parse config file: {message}")]
    Parse { message: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("IO error reading config: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "CONFIG_NOT_FOUND",
            Self::Parse { .. } => "CONFIG_PARSE_ERROR",
            Self::Invalid { .. } => "INVALID_CONFIGURATION",
            Self::Io { .. } => "CONFIG_IO_ERROR",
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Invalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_errors_share_one_operator_notice() {
        for error in [
            ValidationError::MissingAdvisory,
            ValidationError::MissingFarmer,
            ValidationError::MissingSelection,
        ] {
            assert_eq!(error.notice(), "Please select both an advisory and a farmer");
        }
    }

    #[test]
    fn config_error_display_and_code() {
        let error = ConfigError::Invalid {
            message: "request_timeout_secs must be greater than zero".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration: request_timeout_secs must be greater than zero"
        );
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(error.is_user_error());
    }
}
