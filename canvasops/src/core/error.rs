use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasOpsError {
    /// Caller input is insufficient; raised before any network activity
    #[error("Validation error: {0}")]
    Validation(String),

    /// Canvas answered with a non-2xx status, or the request never completed
    #[error("Canvas API error{}: {message} ({context})", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        context: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl CanvasOpsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(status: Option<u16>, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            context: context.into(),
            message: message.into(),
        }
    }

    /// HTTP status attached to an upstream failure, if Canvas sent one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

pub type Result<T> = std::result::Result<T, CanvasOpsError>;
