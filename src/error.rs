use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::path::PathBuf;

use derive_more::Display;

/// A set of errors that can occur while building or streaming an upload body.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The file to upload couldn't be opened, or it isn't a regular file.
    #[display(fmt = "upload source {:?} is unavailable: {}", path, cause)]
    SourceUnavailable { path: PathBuf, cause: io::Error },

    /// The multipart head or tail segment couldn't be encoded.
    #[display(fmt = "failed to encode multipart segments: {}", _0)]
    EncodingFailure(String),

    /// Reading the file failed while streaming its content.
    #[display(fmt = "upload source read failed: {}", _0)]
    SourceReadFailure(io::Error),

    /// The diagnostic mirror file couldn't be opened or written.
    ///
    /// This is only ever reported to an [`Observer`](crate::Observer), reading the body never fails with it.
    #[display(fmt = "failed to mirror upload stream to {:?}: {}", path, cause)]
    MirrorFailure { path: PathBuf, cause: io::Error },

    /// The body was read after it was closed or after a source read failure.
    #[display(fmt = "upload body misused: {}", _0)]
    Misuse(&'static str),

    /// The outgoing HTTP request couldn't be assembled.
    #[display(fmt = "failed to build upload request: {}", _0)]
    RequestBuildFailed(http::Error),
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SourceUnavailable { cause, .. } | Error::MirrorFailure { cause, .. } => Some(cause),
            Error::SourceReadFailure(cause) => Some(cause),
            Error::RequestBuildFailed(cause) => Some(cause),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Error::RequestBuildFailed(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::SourceUnavailable { cause, .. } | Error::MirrorFailure { cause, .. } => cause.kind(),
            Error::SourceReadFailure(cause) => cause.kind(),
            Error::EncodingFailure(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };

        io::Error::new(kind, err)
    }
}
