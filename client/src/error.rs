#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("Url error {0}")]
    Url(#[from] url::ParseError),

    #[error("Config error {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{detail} (status {status})")]
    Api { status: u16, detail: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("File is {size} bytes, over the {limit} bytes limit")]
    AttachmentTooLarge { size: u64, limit: u64 },

    #[error("Invalid credential: {0}")]
    Credential(String),

    #[error("Message is empty")]
    EmptyInput,

    #[error("A reply is still streaming")]
    Busy,
}

impl Error {
    /// Human readable message for inline display, without status codes.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { detail, .. } => detail.clone(),
            Error::Unauthorized(detail) => detail.clone(),
            Error::Credential(detail) => detail.clone(),
            Error::AttachmentTooLarge { limit, .. } => {
                format!("Ita-nia tamañu fixeiru liu tiha ona {}KB", limit / 1024)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_message_is_in_kilobytes() {
        let err = Error::AttachmentTooLarge {
            size: 600 * 1024,
            limit: 500 * 1024,
        };
        assert_eq!(
            err.user_message(),
            "Ita-nia tamañu fixeiru liu tiha ona 500KB"
        );
    }

    #[test]
    fn api_detail_is_shown_without_status() {
        let err = Error::Api {
            status: 400,
            detail: "Email already registered".to_string(),
        };
        assert_eq!(err.to_string(), "Email already registered (status 400)");
        assert_eq!(err.user_message(), "Email already registered");
    }
}
