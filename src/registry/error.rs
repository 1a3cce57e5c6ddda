use thiserror::Error;

/// Explanation attached to denied writes on the machine-wide touch prediction key.
pub const ADMIN_RIGHTS_REQUIRED: &str =
    "Administrator rights are required to modify touch prediction settings. \
     Please run the application as administrator to change these settings.";

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The process lacks the rights to open or modify the key.
    #[error("{message} ({path})")]
    AccessDenied { path: String, message: String },

    /// A stored value cannot be coerced to a 32-bit integer.
    #[error("value '{name}' in {path} has unsupported type {kind}")]
    UnexpectedType {
        path: String,
        name: String,
        kind: String,
    },

    #[error("registry {op} failed for {path} (code {code:#X})")]
    Os {
        op: &'static str,
        path: String,
        code: u32,
    },
}

impl RegistryError {
    pub fn access_denied(path: impl Into<String>) -> Self {
        Self::AccessDenied {
            path: path.into(),
            message: "Access is denied.".into(),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Replace the message of an access denied error, leaving other errors untouched.
    pub fn with_denied_message(self, text: &str) -> Self {
        match self {
            Self::AccessDenied { path, .. } => Self::AccessDenied {
                path,
                message: text.to_string(),
            },
            other => other,
        }
    }
}
