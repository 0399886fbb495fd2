/// Error returned by a [`crate::ResourceSource`].
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(inner) => write!(f, "{}: {inner}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug)]
pub enum LoadError {
    /// The resource could not be fetched.
    Fetch { source: String, error: SourceError },
    /// The bytes were fetched but could not be parsed.
    Decode { source: String, reason: String },
    /// The loader was shut down; nothing can be queued anymore.
    ResourceUnavailable,
    /// The worker handling the request went away without reporting.
    WorkerLost { source: String },
    /// A worker thread could not be started.
    Spawn(std::io::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch { source, error } => write!(f, "failed to fetch {source}: {error}"),
            LoadError::Decode { source, reason } => {
                write!(f, "failed to parse {source}: {reason}")
            }
            LoadError::ResourceUnavailable => write!(f, "loader has been shut down"),
            LoadError::WorkerLost { source } => write!(f, "worker lost while loading {source}"),
            LoadError::Spawn(e) => write!(f, "failed to start load worker: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Fetch { error, .. } => Some(error),
            LoadError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}
