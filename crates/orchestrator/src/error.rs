use streaming::LoadError;

#[derive(Debug)]
pub enum SessionError {
    Load(LoadError),
    /// The loader has nothing in flight but these datasets are still pending.
    Stalled { pending: Vec<String> },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Load(e) => write!(f, "load error: {e}"),
            SessionError::Stalled { pending } => {
                write!(f, "loading stalled with datasets pending: {}", pending.join(", "))
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Load(e) => Some(e),
            SessionError::Stalled { .. } => None,
        }
    }
}

impl From<LoadError> for SessionError {
    fn from(e: LoadError) -> Self {
        SessionError::Load(e)
    }
}
