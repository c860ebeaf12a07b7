use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Category '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No budget plan available")]
    NoActivePlan,

    #[error("Load superseded by a newer request")]
    Superseded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Build the error for a non-success HTTP status, pulling the backend's
    /// `message` (or `error`) field out of a JSON body when there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return SyncError::Unauthenticated;
        }

        let message = extract_message(body).unwrap_or_else(|| "Unknown error".to_string());
        if status >= 500 {
            SyncError::Server { status, message }
        } else {
            SyncError::Validation { status, message }
        }
    }

    /// The single message shown to the user at the UI boundary.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Unauthenticated => "Session expired. Please login again.".to_string(),
            SyncError::Validation { message, .. } => message.clone(),
            SyncError::Server { .. } => "The server could not complete the request.".to_string(),
            SyncError::Network(_) => "Could not reach the server.".to_string(),
            SyncError::Decode(_) => "The server sent an unexpected response.".to_string(),
            SyncError::AlreadyExists(name) => format!("Category '{}' already exists", name),
            SyncError::InvalidInput(msg) => msg.clone(),
            SyncError::NoActivePlan => {
                "Please create a budget plan first before adding expenses.".to_string()
            }
            SyncError::Superseded => "Refresh superseded by a newer one.".to_string(),
            SyncError::Io(_) => "Could not access local session storage.".to_string(),
        }
    }

    /// Whether this error ended the session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, SyncError::Unauthenticated)
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_maps_to_unauthenticated() {
        assert!(SyncError::from_status(401, "").is_unauthenticated());
    }

    #[test]
    fn test_4xx_prefers_message_field() {
        let err = SyncError::from_status(
            404,
            r#"{"error": "not_found", "message": "Plan not found"}"#,
        );
        match err {
            SyncError::Validation { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Plan not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_4xx_falls_back_to_error_field() {
        let err = SyncError::from_status(409, r#"{"error": "Category already exists"}"#);
        assert_eq!(err.user_message(), "Category already exists");
    }

    #[test]
    fn test_5xx_is_server_error() {
        let err = SyncError::from_status(500, "<html>boom</html>");
        assert!(matches!(err, SyncError::Server { status: 500, .. }));
    }
}
