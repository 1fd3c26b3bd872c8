use std::fmt;

/// Error categories the engine can surface to a caller.
///
/// `Budget` is not fatal: a regex walk that trips its depth/time/result
/// budget returns this as a warning event alongside the partial result set,
/// never as a hard failure (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    Index,
    NotFound,
    NotReady,
    Budget,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn validation(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Validation, context)
    }

    pub fn storage(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Storage, context)
    }

    pub fn index(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Index, context)
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context)
    }

    pub fn not_ready(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotReady, context)
    }

    pub fn budget(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Budget, context)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Index, format!("snapshot shape invalid: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
