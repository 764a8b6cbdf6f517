use hoster_schema::ValidationError;

/// Errors raised by the store. Each variant wraps enough context (resource
/// name, identifier) for diagnostic tracing at the boundary that converts
/// these into HTTP responses.
#[derive(Debug)]
pub enum DataError {
    NotFound { resource: &'static str, id: String },
    InvalidTransition { resource: &'static str, from: String, to: String },
    GuardFailed { resource: &'static str, message: String },
    Validation(Vec<ValidationError>),
    Storage(String),
}

impl DataError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        DataError::Storage(err.to_string())
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            DataError::InvalidTransition { resource, from, to } => {
                write!(f, "{resource}: invalid transition {from} \u{2192} {to}")
            }
            DataError::GuardFailed { resource, message } => {
                write!(f, "{resource}: guard failed: {message}")
            }
            DataError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.message.clone())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "validation failed: {joined}")
            }
            DataError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {}
