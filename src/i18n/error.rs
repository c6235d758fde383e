use thiserror::Error;

/// Errors from validating language codes against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum I18nError {
    #[error("Unknown language code: '{0}'")]
    UnknownLanguage(String),

    #[error("Language '{0}' is not enabled")]
    LanguageDisabled(String),
}

/// Errors from fetching or decoding a translation resource.
///
/// `Clone` because one in-flight load is shared by every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{resource} does not exist")]
    NotFound { resource: String },

    #[error("Failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("Fetching {resource} returned HTTP {status}")]
    Status { resource: String, status: u16 },

    #[error("Failed to parse {resource}: {message}")]
    Parse { resource: String, message: String },

    #[error("{resource} is not a JSON object")]
    NotAnObject { resource: String },
}

impl LoadError {
    /// Name of the resource that failed.
    pub fn resource(&self) -> &str {
        match self {
            LoadError::NotFound { resource }
            | LoadError::Fetch { resource, .. }
            | LoadError::Status { resource, .. }
            | LoadError::Parse { resource, .. }
            | LoadError::NotAnObject { resource } => resource,
        }
    }
}
