#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response was not valid JSON: {message}")]
    MalformedBody { message: String },

    #[error("client misconfigured: {message}")]
    Configuration { message: String },
}

impl ClientError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Status { .. } => "HTTP_STATUS_ERROR",
            Self::MalformedBody { .. } => "MALFORMED_BODY",
            Self::Configuration { .. } => "CLIENT_CONFIGURATION_ERROR",
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}
