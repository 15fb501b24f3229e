use std::{error, fmt, io};

type Source = Box<dyn error::Error + Send + Sync>;

/// Coarse classification of what went wrong.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The shared lock could not be acquired (poisoned by a panicking holder).
    Lock,
    /// The internal buffer could not grow.
    Buffer,
    /// The destination rejected a write.
    Write,
    /// The destination failed to close.
    Close,
    /// An input could not be opened or read.
    Input,
    Other,
}

pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<Source>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<M, E>(kind: ErrorKind, message: M, source: E) -> Self
    where
        M: Into<String>,
        E: Into<Source>,
    {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unexpected error ({:?}): {}", self.kind, self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(err) => write!(f, "{}. Source error: {}", self.message, err),
            None => write!(f, "{}", self.message),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.source {
            Some(ref err) => Some(&**err),
            None => None,
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            source: None,
        }
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(ErrorKind::Other, message)
    }
}

impl<E: error::Error + Send + Sync + 'static> From<(String, E)> for Error {
    fn from((message, err): (String, E)) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            source: Some(Box::new(err)),
        }
    }
}

impl<E: error::Error + Send + Sync + 'static> From<(&str, E)> for Error {
    fn from((message, err): (&str, E)) -> Self {
        Self::with_source(ErrorKind::Other, message, err)
    }
}

impl From<Error> for io::Error {
    /// Keeps the original `io::ErrorKind` when the failure came from the
    /// destination, so callers driving the writer through `io::Write` can
    /// still match on it.
    fn from(err: Error) -> Self {
        let kind = err
            .source
            .as_ref()
            .and_then(|source| source.downcast_ref::<io::Error>())
            .map(io::Error::kind)
            .unwrap_or(io::ErrorKind::Other);
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
